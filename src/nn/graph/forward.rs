/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : Graph 前向执行：只计算目标输出所依赖的那些调用
 */

use std::collections::{HashMap, HashSet};

use super::{Graph, GraphError, LayerId, SymbolicTensor, Weight};
use crate::nn::layer::TraitLayer;
use crate::tensor::Tensor;

type CallKey = (LayerId, usize);

impl Graph {
    /// 以输入层数据`feeds`执行图，按顺序返回`outputs`的值
    pub fn execute(
        &self,
        feeds: &[(LayerId, &Tensor)],
        outputs: &[SymbolicTensor],
    ) -> Result<Vec<Tensor>, GraphError> {
        let needed = self.collect_needed_calls(outputs)?;

        let mut values: HashMap<CallKey, Vec<Tensor>> = HashMap::new();
        for &(id, node_index) in &self.node_order {
            if !needed.contains(&(id, node_index)) {
                continue;
            }
            let node = &self.layers[id.0];
            let inbound = &node.inbound_nodes[node_index];
            let result = if node.is_input_layer() {
                let (_, feed) = feeds.iter().find(|(layer, _)| *layer == id).ok_or_else(|| {
                    GraphError::InvalidOperation(format!("缺少输入层{}的数据", node.name))
                })?;
                node.layer.call(&[*feed], &[], &inbound.call_args)?
            } else {
                let inputs = inbound
                    .inputs
                    .flatten()
                    .into_iter()
                    .map(|t| lookup(&values, t))
                    .collect::<Result<Vec<_>, _>>()?;
                let weights: Vec<&Tensor> = node.weights.iter().map(Weight::value).collect();
                node.layer.call(&inputs, &weights, &inbound.call_args)?
            };
            values.insert((id, node_index), result);
        }

        outputs
            .iter()
            .map(|t| lookup(&values, t).cloned())
            .collect()
    }

    /// 从目标输出反向收集需要执行的调用
    fn collect_needed_calls(&self, outputs: &[SymbolicTensor]) -> Result<HashSet<CallKey>, GraphError> {
        let mut needed = HashSet::new();
        let mut stack = Vec::with_capacity(outputs.len());
        for t in outputs {
            if t.graph_uid != self.uid {
                return Err(GraphError::InvalidOperation(format!(
                    "符号张量来自其他图（uid={}），不能在图{}中执行",
                    t.graph_uid, self.name
                )));
            }
            stack.push((t.layer, t.node_index));
        }
        while let Some(key) = stack.pop() {
            if !needed.insert(key) {
                continue;
            }
            let node = self.get_layer(key.0)?;
            let inbound = node.inbound_nodes.get(key.1).ok_or_else(|| {
                GraphError::InvalidOperation(format!("层{}不存在第{}次调用", node.name, key.1))
            })?;
            stack.extend(inbound.inputs.flatten().iter().map(|t| (t.layer, t.node_index)));
        }
        Ok(needed)
    }
}

fn lookup<'a>(
    values: &'a HashMap<CallKey, Vec<Tensor>>,
    t: &SymbolicTensor,
) -> Result<&'a Tensor, GraphError> {
    values
        .get(&(t.layer, t.node_index))
        .and_then(|outputs| outputs.get(t.output_index))
        .ok_or_else(|| {
            GraphError::InvalidOperation(format!(
                "层{}第{}次调用的第{}个输出尚未计算",
                t.layer, t.node_index, t.output_index
            ))
        })
}
