/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 权重迁移：按位置复制原层权重，或保留新层的初始化权重
 */

use crate::nn::{GraphError, LayerNode};

/// 无需重置时逐个按位置复制（真复制，新层独立持有数据）；
/// 需要重置时保留新权重，且除非`preserved_trainable`为 true，否则把新层设为不可训练。
/// 无权重的层不受影响。
pub(super) fn transfer_weights(
    original: &LayerNode,
    rebuilt: &mut LayerNode,
    requires_reset: bool,
    preserved_trainable: bool,
) -> Result<(), GraphError> {
    if original.weights().is_empty() && rebuilt.weights().is_empty() {
        return Ok(());
    }
    if requires_reset {
        if !preserved_trainable {
            rebuilt.set_trainable(false);
        }
        return Ok(());
    }
    rebuilt
        .set_weights(&original.get_weights())
        .map_err(|err| match err {
            GraphError::WeightMismatch(detail) => GraphError::WeightMismatch(format!(
                "无法复制原层{}的权重：{}",
                original.name(),
                detail
            )),
            other => other,
        })
}
