/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 输入层：图的入口，只声明形状，不做计算
 */

use super::TraitLayer;
use crate::nn::config::{BATCH_INPUT_SHAPE_KEY, INPUT_SHAPE_KEY};
use crate::nn::{CallArgs, DynamicShape, GraphError, LayerConfig};
use crate::tensor::Tensor;

#[derive(Debug, Clone, PartialEq)]
pub struct InputLayer {
    batch_input_shape: DynamicShape,
}

impl InputLayer {
    /// `batch_input_shape`含 batch 维，如`[None, 3]`
    pub fn new(batch_input_shape: DynamicShape) -> Self {
        Self { batch_input_shape }
    }

    /// 优先读取`batch_input_shape`；否则读取不含 batch 维的`input_shape`并在前面补一个动态维
    pub fn from_config(config: &LayerConfig) -> Result<Self, GraphError> {
        if let Some(shape) = config.get_as_opt::<DynamicShape>(BATCH_INPUT_SHAPE_KEY)? {
            return Ok(Self::new(shape));
        }
        if let Some(shape) = config.get_as_opt::<DynamicShape>(INPUT_SHAPE_KEY)? {
            let mut dims = vec![None];
            dims.extend_from_slice(shape.dims());
            return Ok(Self::new(DynamicShape::new(&dims)));
        }
        Err(GraphError::InvalidConfiguration(format!(
            "InputLayer的配置中缺少`{BATCH_INPUT_SHAPE_KEY}`或`{INPUT_SHAPE_KEY}`"
        )))
    }

    pub const fn batch_input_shape(&self) -> &DynamicShape {
        &self.batch_input_shape
    }
}

impl TraitLayer for InputLayer {
    fn class_name(&self) -> &'static str {
        "InputLayer"
    }

    fn get_config(&self) -> LayerConfig {
        let mut config = LayerConfig::new();
        config.set(
            BATCH_INPUT_SHAPE_KEY,
            self.batch_input_shape
                .dims()
                .iter()
                .map(|d| d.map_or(serde_json::Value::Null, serde_json::Value::from))
                .collect::<Vec<_>>(),
        );
        config
    }

    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError> {
        if !input_shapes.is_empty() {
            return Err(GraphError::InvalidOperation(
                "InputLayer不能被其他张量调用".to_string(),
            ));
        }
        Ok(vec![self.batch_input_shape.clone()])
    }

    fn call(
        &self,
        inputs: &[&Tensor],
        _weights: &[&Tensor],
        _args: &CallArgs,
    ) -> Result<Vec<Tensor>, GraphError> {
        let x = inputs.first().ok_or_else(|| {
            GraphError::InvalidOperation("InputLayer执行时缺少输入数据".to_string())
        })?;
        if !self.batch_input_shape.is_compatible_with_tensor(x.shape()) {
            return Err(GraphError::ShapeMismatch {
                expected: self.batch_input_shape.clone(),
                got: DynamicShape::fixed(x.shape()),
                message: "输入数据与InputLayer的形状不兼容".to_string(),
            });
        }
        Ok(vec![(*x).clone()])
    }
}
