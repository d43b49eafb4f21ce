/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 激活函数及独立的 Activation 层
 */

use serde::{Deserialize, Serialize};

use super::{TraitLayer, expect_input_count};
use crate::nn::{CallArgs, DynamicShape, GraphError, LayerConfig};
use crate::tensor::Tensor;

/// 逐元素激活函数，配置中以小写字符串表示，如`"relu"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationFn {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl ActivationFn {
    pub fn apply(&self, x: &Tensor) -> Tensor {
        match self {
            Self::Linear => x.clone(),
            Self::Relu => x.map(|v| v.max(0.0)),
            Self::Sigmoid => x.map(|v| 1.0 / (1.0 + (-v).exp())),
            Self::Tanh => x.map(f32::tanh),
        }
    }

    /// 配置中使用的名称，与序列化结果一致
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Relu => "relu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
        }
    }

    /// 从配置中读取`activation`，缺省为`Linear`
    pub(super) fn from_config(config: &LayerConfig) -> Result<Self, GraphError> {
        Ok(config.get_as_opt("activation")?.unwrap_or_default())
    }
}

/// 仅做逐元素激活，无权重
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    activation: ActivationFn,
}

impl Activation {
    pub const fn new(activation: ActivationFn) -> Self {
        Self { activation }
    }

    pub fn from_config(config: &LayerConfig) -> Result<Self, GraphError> {
        Ok(Self::new(ActivationFn::from_config(config)?))
    }

    pub const fn activation(&self) -> ActivationFn {
        self.activation
    }
}

impl TraitLayer for Activation {
    fn class_name(&self) -> &'static str {
        "Activation"
    }

    fn get_config(&self) -> LayerConfig {
        LayerConfig::new().with("activation", self.activation.name())
    }

    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError> {
        expect_input_count(self.class_name(), input_shapes, 1)?;
        Ok(input_shapes.to_vec())
    }

    fn call(
        &self,
        inputs: &[&Tensor],
        _weights: &[&Tensor],
        _args: &CallArgs,
    ) -> Result<Vec<Tensor>, GraphError> {
        Ok(inputs.iter().map(|x| self.activation.apply(x)).collect())
    }
}
