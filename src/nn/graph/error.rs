/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 层图（建图、执行、复刻）的错误类型
 */

use thiserror::Error;

use super::LayerId;
use crate::errors::TensorError;
use crate::nn::DynamicShape;

/// 层图操作错误类型
///
/// 复刻过程中的任何错误都是致命的：立即返回，不产出部分结果，也不修改原模型。
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    /// 不支持的拓扑：顺序（Sequential）模型、同一层被多次调用、多输出引用越界等
    #[error("不支持的图拓扑：{0}")]
    UnsupportedTopology(String),
    /// 改写列表长度不符、改写目标缺少宽度字段、配置值无效等
    #[error("无效的配置：{0}")]
    InvalidConfiguration(String),
    #[error("注册表中不存在层类型`{0}`")]
    UnknownLayerType(String),
    #[error("层{0}不存在")]
    LayerNotFound(LayerId),
    #[error("{message}：期望形状{expected}，实际形状{got}")]
    ShapeMismatch {
        expected: DynamicShape,
        got: DynamicShape,
        message: String,
    },
    /// 权重数量或形状与目标层不一致（正常建图下不应出现）
    #[error("权重不匹配：{0}")]
    WeightMismatch(String),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("层名称`{0}`在图中重复")]
    DuplicateLayerName(String),
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
