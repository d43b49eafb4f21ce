/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : Split 层：沿末维切分为多个输出（多输出层）
 */

use super::{TraitLayer, expect_input_count};
use crate::nn::{CallArgs, DynamicShape, GraphError, LayerConfig};
use crate::tensor::Tensor;

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    sizes: Vec<usize>,
}

impl Split {
    pub fn new(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.to_vec(),
        }
    }

    pub fn from_config(config: &LayerConfig) -> Result<Self, GraphError> {
        let sizes: Vec<usize> = config.get_as("sizes")?;
        if sizes.is_empty() || sizes.contains(&0) {
            return Err(GraphError::InvalidConfiguration(
                "Split层的sizes须非空且每项大于0".to_string(),
            ));
        }
        Ok(Self { sizes })
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }
}

impl TraitLayer for Split {
    fn class_name(&self) -> &'static str {
        "Split"
    }

    fn get_config(&self) -> LayerConfig {
        LayerConfig::new().with("sizes", self.sizes.clone())
    }

    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError> {
        expect_input_count(self.class_name(), input_shapes, 1)?;
        let input = &input_shapes[0];
        let total = self.sizes.iter().sum::<usize>();
        if input.ndim() == 0 || input.last_dim().is_some_and(|d| d != total) {
            return Err(GraphError::ShapeMismatch {
                expected: input.with_last_dim(Some(total)),
                got: input.clone(),
                message: "Split层各段长度之和须等于输入的末维".to_string(),
            });
        }
        Ok(self
            .sizes
            .iter()
            .map(|&size| input.with_last_dim(Some(size)))
            .collect())
    }

    fn call(
        &self,
        inputs: &[&Tensor],
        _weights: &[&Tensor],
        _args: &CallArgs,
    ) -> Result<Vec<Tensor>, GraphError> {
        let x = inputs.first().ok_or_else(|| {
            GraphError::InvalidOperation("Split层执行时没有输入".to_string())
        })?;
        Ok(x.split_last_axis(&self.sizes)?)
    }
}
