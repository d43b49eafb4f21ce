/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : Conv1d (一维卷积) 层，valid 填充、步长为1
 */

use super::{ActivationFn, TraitLayer, WeightSpec, expect_input_count, fixed_last_dim};
use crate::nn::config::FILTERS_KEY;
use crate::nn::{CallArgs, DynamicShape, GraphError, Init, LayerConfig};
use crate::tensor::Tensor;

/// Conv1d 层
///
/// # 输入/输出形状
/// - 输入：[batch, steps, channels]
/// - 输出：[batch, steps - kernel_size + 1, filters]
///
/// # 权重（按位置）
/// - `kernel`: [kernel_size, channels, filters]
/// - `bias`: [filters]
#[derive(Debug, Clone, PartialEq)]
pub struct Conv1d {
    filters: usize,
    kernel_size: usize,
    activation: ActivationFn,
    use_bias: bool,
}

impl Conv1d {
    pub const fn new(filters: usize, kernel_size: usize) -> Self {
        Self {
            filters,
            kernel_size,
            activation: ActivationFn::Linear,
            use_bias: true,
        }
    }

    pub const fn with_activation(mut self, activation: ActivationFn) -> Self {
        self.activation = activation;
        self
    }

    pub fn from_config(config: &LayerConfig) -> Result<Self, GraphError> {
        let filters: usize = config.get_as(FILTERS_KEY)?;
        let kernel_size: usize = config.get_as("kernel_size")?;
        if filters == 0 || kernel_size == 0 {
            return Err(GraphError::InvalidConfiguration(
                "Conv1d层的filters和kernel_size都必须大于0".to_string(),
            ));
        }
        Ok(Self {
            filters,
            kernel_size,
            activation: ActivationFn::from_config(config)?,
            use_bias: config.get_as_opt("use_bias")?.unwrap_or(true),
        })
    }

    pub const fn filters(&self) -> usize {
        self.filters
    }
}

impl TraitLayer for Conv1d {
    fn class_name(&self) -> &'static str {
        "Conv1d"
    }

    fn get_config(&self) -> LayerConfig {
        LayerConfig::new()
            .with(FILTERS_KEY, self.filters)
            .with("kernel_size", self.kernel_size)
            .with("activation", self.activation.name())
            .with("use_bias", self.use_bias)
    }

    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError> {
        expect_input_count(self.class_name(), input_shapes, 1)?;
        let input = &input_shapes[0];
        if input.ndim() != 3 {
            return Err(GraphError::InvalidOperation(format!(
                "Conv1d层的输入须为3阶[batch, steps, channels]，但输入形状为{input}"
            )));
        }
        fixed_last_dim(self.class_name(), input)?;
        let steps = match input.dim(1) {
            Some(steps) if steps < self.kernel_size => {
                return Err(GraphError::InvalidOperation(format!(
                    "Conv1d层的输入步数{}小于卷积核大小{}",
                    steps, self.kernel_size
                )));
            }
            Some(steps) => Some(steps - self.kernel_size + 1),
            None => None,
        };
        Ok(vec![DynamicShape::new(&[
            input.dim(0),
            steps,
            Some(self.filters),
        ])])
    }

    fn weight_specs(&self, input_shapes: &[DynamicShape]) -> Result<Vec<WeightSpec>, GraphError> {
        expect_input_count(self.class_name(), input_shapes, 1)?;
        let channels = fixed_last_dim(self.class_name(), &input_shapes[0])?;
        let mut specs = vec![WeightSpec::new(
            "kernel",
            &[self.kernel_size, channels, self.filters],
            Init::Xavier,
        )];
        if self.use_bias {
            specs.push(WeightSpec::new("bias", &[self.filters], Init::Zeros));
        }
        Ok(specs)
    }

    fn call(
        &self,
        inputs: &[&Tensor],
        weights: &[&Tensor],
        _args: &CallArgs,
    ) -> Result<Vec<Tensor>, GraphError> {
        let (x, kernel) = match (inputs, weights) {
            ([x], [kernel, ..]) => (*x, *kernel),
            _ => {
                return Err(GraphError::InvalidOperation(
                    "Conv1d层执行时输入或权重个数不对".to_string(),
                ));
            }
        };
        let mut y = x.conv1d_valid(kernel)?;
        if let Some(bias) = weights.get(1) {
            y = y.add_bias(bias)?;
        }
        Ok(vec![self.activation.apply(&y)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;

    #[test]
    fn test_conv1d_output_shape() {
        let conv = Conv1d::new(4, 3);
        let out = conv
            .compute_output_shape(&[DynamicShape::with_dynamic_batch(&[10, 2])])
            .unwrap();
        assert_eq!(out[0].to_string(), "[?, 8, 4]");

        let out = conv
            .compute_output_shape(&[DynamicShape::new(&[None, None, Some(2)])])
            .unwrap();
        assert_eq!(out[0].to_string(), "[?, ?, 4]");

        assert_err!(
            conv.compute_output_shape(&[DynamicShape::with_dynamic_batch(&[2, 2])]),
            GraphError::InvalidOperation(_)
        );
        assert_err!(
            conv.compute_output_shape(&[DynamicShape::with_dynamic_batch(&[2])]),
            GraphError::InvalidOperation(_)
        );
    }

    #[test]
    fn test_conv1d_weight_specs() {
        let specs = Conv1d::new(4, 3)
            .weight_specs(&[DynamicShape::with_dynamic_batch(&[10, 2])])
            .unwrap();
        assert_eq!(specs[0].shape, vec![3, 2, 4]);
        assert_eq!(specs[1].shape, vec![4]);
    }
}
