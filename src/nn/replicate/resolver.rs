/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 把指向原图的符号引用映射为指向新图的符号引用
 */

use super::record::ReconstructionTable;
use crate::nn::{Graph, GraphError, SymbolicInput, SymbolicTensor};

/// 递归映射（可嵌套的）符号输入
pub(super) fn resolve(
    table: &ReconstructionTable,
    rebuilt: &Graph,
    input: &SymbolicInput,
) -> Result<SymbolicInput, GraphError> {
    match input {
        SymbolicInput::Single(t) => resolve_tensor(table, rebuilt, t).map(SymbolicInput::Single),
        SymbolicInput::List(items) => items
            .iter()
            .map(|item| resolve(table, rebuilt, item))
            .collect::<Result<Vec<_>, _>>()
            .map(SymbolicInput::List),
    }
}

/// 映射单个符号张量
///
/// 新层只有一个输出时直接返回它（不看原引用的输出序号）；否则按原输出序号取。
pub(super) fn resolve_tensor(
    table: &ReconstructionTable,
    rebuilt: &Graph,
    t: &SymbolicTensor,
) -> Result<SymbolicTensor, GraphError> {
    let record = table.get(t.layer)?;
    let node = rebuilt.get_layer(record.rebuilt)?;
    let shapes = node.output_shapes().ok_or_else(|| {
        GraphError::UnsupportedTopology(format!("新图中的层{}尚未被调用", node.name()))
    })?;
    let output_index = match shapes.len() {
        1 => 0,
        n if t.output_index < n => t.output_index,
        n => {
            return Err(GraphError::UnsupportedTopology(format!(
                "层{}只有{}个输出，无法引用第{}个输出",
                node.name(),
                n,
                t.output_index
            )));
        }
    };
    Ok(SymbolicTensor {
        graph_uid: rebuilt.uid(),
        layer: record.rebuilt,
        node_index: 0,
        output_index,
        shape: shapes[output_index].clone(),
    })
}
