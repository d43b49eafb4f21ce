/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 模型（Model）：一张层图 + 声明的输入/输出
 */

mod describe;

pub use describe::{LayerSummary, ModelDescriptor};

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::layer::LayerKind;
use super::replicate::{ReplicateConfig, reconstruct};
use super::{DynamicShape, Graph, GraphError, LayerId, LayerNode, MemoryInfo, SymbolicTensor};
use crate::tensor::Tensor;

/// 模型的构建方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// 任意有向无环的层图
    Functional,
    /// 单输入单输出的线性堆叠
    Sequential,
}

pub struct Model {
    name: String,
    kind: ModelKind,
    graph: Graph,
    /// 属于本模型的层（输出可达的层 + 声明的输入层），升序即拓扑顺序
    layer_ids: Vec<LayerId>,
    input_layers: Vec<LayerId>,
    output_layers: Vec<LayerId>,
    inputs: Vec<SymbolicTensor>,
    outputs: Vec<SymbolicTensor>,
}

impl Model {
    /// 以图中的符号张量声明输入与输出，构建函数式模型
    ///
    /// 输入必须是输入层的输出；输出所依赖的每个输入层都必须在`inputs`中声明。
    pub fn functional(
        graph: Graph,
        inputs: &[SymbolicTensor],
        outputs: &[SymbolicTensor],
    ) -> Result<Self, GraphError> {
        if inputs.is_empty() || outputs.is_empty() {
            return Err(GraphError::InvalidOperation(
                "模型至少需要1个输入和1个输出".to_string(),
            ));
        }
        for t in inputs.iter().chain(outputs) {
            if t.graph_uid != graph.uid() {
                return Err(GraphError::InvalidOperation(format!(
                    "符号张量来自其他图（uid={}）",
                    t.graph_uid
                )));
            }
        }

        let mut input_layers = Vec::with_capacity(inputs.len());
        for t in inputs {
            let node = graph.get_layer(t.layer)?;
            if !node.is_input_layer() {
                return Err(GraphError::UnsupportedTopology(format!(
                    "模型输入必须是输入层的输出，但{}是{}层",
                    node.name(),
                    node.class_name()
                )));
            }
            input_layers.push(t.layer);
        }
        let output_layers = outputs
            .iter()
            .map(|t| graph.get_layer(t.layer).map(LayerNode::id))
            .collect::<Result<Vec<_>, _>>()?;

        let declared: HashSet<LayerId> = input_layers.iter().copied().collect();
        let mut layer_ids = Self::reachable_layers(&graph, outputs)?;
        for &id in &layer_ids {
            let node = graph.get_layer(id)?;
            if node.is_input_layer() && !declared.contains(&id) {
                return Err(GraphError::UnsupportedTopology(format!(
                    "输出依赖的输入层{}未被声明为模型输入",
                    node.name()
                )));
            }
        }
        layer_ids.extend(declared);
        let mut layer_ids: Vec<LayerId> = layer_ids.into_iter().collect();
        layer_ids.sort_unstable();

        Ok(Self {
            name: graph.name().to_string(),
            kind: ModelKind::Functional,
            graph,
            layer_ids,
            input_layers,
            output_layers,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
        })
    }

    /// 线性堆叠模型：一个输入层后依次接`layers`
    pub fn sequential(
        mut graph: Graph,
        batch_input_shape: DynamicShape,
        layers: impl IntoIterator<Item = LayerKind>,
    ) -> Result<Self, GraphError> {
        let input = graph.input(batch_input_shape, "")?;
        let mut x = input.clone();
        for layer in layers {
            x = graph.apply(layer, &x, "")?;
        }
        let mut model = Self::functional(graph, &[input], &[x])?;
        model.kind = ModelKind::Sequential;
        Ok(model)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// 从输出反向可达的全部层
    ///
    /// 按(层, 调用序号)去重，共享分支只展开一次。
    fn reachable_layers(graph: &Graph, outputs: &[SymbolicTensor]) -> Result<HashSet<LayerId>, GraphError> {
        let mut visited: HashSet<(LayerId, usize)> = HashSet::new();
        let mut stack: Vec<(LayerId, usize)> = outputs.iter().map(|t| (t.layer, t.node_index)).collect();
        while let Some((id, node_index)) = stack.pop() {
            if !visited.insert((id, node_index)) {
                continue;
            }
            let node = graph.get_layer(id)?;
            if let Some(inbound) = node.inbound_nodes().get(node_index) {
                stack.extend(inbound.inputs().flatten().iter().map(|t| (t.layer, t.node_index)));
            }
        }
        Ok(visited.into_iter().map(|(id, _)| id).collect())
    }

    // ========== 访问器 ==========

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> ModelKind {
        self.kind
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// 按拓扑顺序排列的本模型全部层
    pub fn layers(&self) -> Vec<&LayerNode> {
        self.layer_ids
            .iter()
            .filter_map(|&id| self.graph.get_layer(id).ok())
            .collect()
    }

    pub fn layer_ids(&self) -> &[LayerId] {
        &self.layer_ids
    }

    pub fn get_layer(&self, name: &str) -> Result<&LayerNode, GraphError> {
        self.layers()
            .into_iter()
            .find(|l| l.name() == name)
            .ok_or_else(|| GraphError::InvalidOperation(format!("模型{}中没有名为{}的层", self.name, name)))
    }

    pub fn get_layer_mut(&mut self, name: &str) -> Result<&mut LayerNode, GraphError> {
        let id = self.get_layer(name)?.id();
        self.graph.get_layer_mut(id)
    }

    /// 入口层（与`inputs`一一对应）
    pub fn input_layers(&self) -> &[LayerId] {
        &self.input_layers
    }

    /// 出口层（与`outputs`一一对应）
    pub fn output_layers(&self) -> &[LayerId] {
        &self.output_layers
    }

    pub fn inputs(&self) -> &[SymbolicTensor] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[SymbolicTensor] {
        &self.outputs
    }

    /// 当前运行时中存活的参数张量计数
    pub fn memory(&self) -> MemoryInfo {
        self.graph.memory()
    }

    // ========== 执行与权重 ==========

    /// 按声明的输入顺序喂入数据，按声明的输出顺序返回结果
    pub fn predict(&self, inputs: &[Tensor]) -> Result<Vec<Tensor>, GraphError> {
        if inputs.len() != self.input_layers.len() {
            return Err(GraphError::InvalidOperation(format!(
                "模型{}需要{}个输入，但得到了{}个",
                self.name,
                self.input_layers.len(),
                inputs.len()
            )));
        }
        let feeds: Vec<(LayerId, &Tensor)> = self.input_layers.iter().copied().zip(inputs).collect();
        self.graph.execute(&feeds, &self.outputs)
    }

    /// 按层的拓扑顺序、层内按位置复制出全部权重
    pub fn get_weights(&self) -> Vec<Tensor> {
        self.layers().into_iter().flat_map(LayerNode::get_weights).collect()
    }

    /// 按`get_weights`的顺序覆盖全部权重；总数或任一形状不符时报错且不做修改
    pub fn set_weights(&mut self, values: &[Tensor]) -> Result<(), GraphError> {
        let expected: Vec<&[usize]> = self
            .layers()
            .into_iter()
            .flat_map(|l| l.weights().iter().map(|w| w.value().shape()))
            .collect();
        if expected.len() != values.len() {
            return Err(GraphError::WeightMismatch(format!(
                "模型{}有{}个权重，但提供了{}个",
                self.name,
                expected.len(),
                values.len()
            )));
        }
        if let Some((i, _)) = expected
            .iter()
            .zip(values)
            .enumerate()
            .find(|(_, (shape, v))| **shape != v.shape())
        {
            return Err(GraphError::WeightMismatch(format!(
                "第{}个权重形状应为{:?}，但提供的形状为{:?}",
                i,
                expected[i],
                values[i].shape()
            )));
        }

        let mut offset = 0;
        for id in self.layer_ids.clone() {
            let layer = self.graph.get_layer_mut(id)?;
            let n = layer.weights().len();
            layer.set_weights(&values[offset..offset + n])?;
            offset += n;
        }
        Ok(())
    }

    pub fn count_params(&self) -> usize {
        self.layers().into_iter().map(LayerNode::count_params).sum()
    }

    pub fn trainable_params(&self) -> usize {
        self.layers()
            .into_iter()
            .filter(|l| l.trainable())
            .map(LayerNode::count_params)
            .sum()
    }

    pub fn non_trainable_params(&self) -> usize {
        self.count_params() - self.trainable_params()
    }

    // ========== 复刻与释放 ==========

    /// 复刻本模型，见[`reconstruct`]
    pub fn replicate(&self, config: &ReplicateConfig) -> Result<Self, GraphError> {
        reconstruct(self, config)
    }

    /// 释放模型及其全部权重
    pub fn dispose(self) {
        tracing::debug!(
            model = %self.name,
            layers = self.layer_ids.len(),
            params = self.count_params(),
            "释放模型"
        );
        drop(self);
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("layers", &self.layer_ids.len())
            .field("input_layers", &self.input_layers)
            .field("output_layers", &self.output_layers)
            .finish()
    }
}
