/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 图中的层节点：层本体 + 名称 + 有序权重 + 可训练标志 + 调用记录
 */

use super::{GraphError, LayerId, SymbolicInput};
use crate::nn::config::{NAME_KEY, TRAINABLE_KEY};
use crate::nn::layer::{LayerKind, TraitLayer};
use crate::nn::{CallArgs, DynamicShape, LayerConfig, TrackedTensor};
use crate::tensor::Tensor;

/// 一个命名的参数张量
#[derive(Debug, Clone)]
pub struct Weight {
    pub(in crate::nn) name: String,
    pub(in crate::nn) value: TrackedTensor,
}

impl Weight {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Tensor {
        self.value.value()
    }
}

/// 一次调用记录：本次调用的输入、附加参数与输出形状
#[derive(Debug, Clone, PartialEq)]
pub struct InboundNode {
    pub(in crate::nn) inputs: SymbolicInput,
    pub(in crate::nn) call_args: CallArgs,
    pub(in crate::nn) output_shapes: Vec<DynamicShape>,
}

impl InboundNode {
    pub const fn inputs(&self) -> &SymbolicInput {
        &self.inputs
    }

    pub const fn call_args(&self) -> &CallArgs {
        &self.call_args
    }

    pub fn output_shapes(&self) -> &[DynamicShape] {
        &self.output_shapes
    }
}

#[derive(Debug)]
pub struct LayerNode {
    pub(in crate::nn) id: LayerId,
    pub(in crate::nn) name: String,
    pub(in crate::nn) layer: LayerKind,
    pub(in crate::nn) weights: Vec<Weight>,
    pub(in crate::nn) trainable: bool,
    pub(in crate::nn) inbound_nodes: Vec<InboundNode>,
}

impl LayerNode {
    pub const fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &'static str {
        self.layer.class_name()
    }

    pub const fn layer(&self) -> &LayerKind {
        &self.layer
    }

    pub fn is_input_layer(&self) -> bool {
        matches!(self.layer, LayerKind::InputLayer(_))
    }

    /// 完整配置：层自身的配置 + `name` + `trainable`
    pub fn config(&self) -> LayerConfig {
        let mut config = self.layer.get_config();
        config.set(NAME_KEY, self.name.as_str());
        config.set(TRAINABLE_KEY, self.trainable);
        config
    }

    pub fn inbound_nodes(&self) -> &[InboundNode] {
        &self.inbound_nodes
    }

    /// 首次调用的输出形状
    pub fn output_shapes(&self) -> Option<&[DynamicShape]> {
        self.inbound_nodes.first().map(InboundNode::output_shapes)
    }

    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    /// 按位置复制出全部权重值
    pub fn get_weights(&self) -> Vec<Tensor> {
        self.weights.iter().map(|w| w.value().clone()).collect()
    }

    /// 按位置覆盖全部权重值；数量或任一形状不一致时报错且不做任何修改
    pub fn set_weights(&mut self, values: &[Tensor]) -> Result<(), GraphError> {
        if values.len() != self.weights.len() {
            return Err(GraphError::WeightMismatch(format!(
                "层{}有{}个权重，但提供了{}个",
                self.name,
                self.weights.len(),
                values.len()
            )));
        }
        for (w, v) in self.weights.iter().zip(values) {
            if w.value().shape() != v.shape() {
                return Err(GraphError::WeightMismatch(format!(
                    "层{}的权重{}形状为{:?}，但提供的形状为{:?}",
                    self.name,
                    w.name,
                    w.value().shape(),
                    v.shape()
                )));
            }
        }
        for (w, v) in self.weights.iter_mut().zip(values) {
            w.value
                .assign(v.clone())
                .map_err(|_| GraphError::WeightMismatch(format!("层{}的权重{}", self.name, w.name)))?;
        }
        Ok(())
    }

    pub fn count_params(&self) -> usize {
        self.weights.iter().map(|w| w.value().size()).sum()
    }

    pub const fn trainable(&self) -> bool {
        self.trainable
    }

    pub fn set_trainable(&mut self, trainable: bool) {
        self.trainable = trainable;
    }
}
