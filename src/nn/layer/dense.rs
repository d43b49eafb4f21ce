/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : Dense (全连接) 层
 */

use super::{ActivationFn, TraitLayer, WeightSpec, expect_input_count, fixed_last_dim};
use crate::nn::config::UNITS_KEY;
use crate::nn::{CallArgs, DynamicShape, GraphError, Init, LayerConfig};
use crate::tensor::Tensor;

/// Dense (全连接) 层：`output = activation(x @ kernel + bias)`
///
/// # 输入/输出形状
/// - 输入：[..., in_features]
/// - 输出：[..., units]
///
/// # 权重（按位置）
/// - `kernel`: [in_features, units]，Xavier 初始化
/// - `bias`: [units]，零初始化（`use_bias`为 false 时没有）
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    units: usize,
    activation: ActivationFn,
    use_bias: bool,
}

impl Dense {
    pub const fn new(units: usize) -> Self {
        Self {
            units,
            activation: ActivationFn::Linear,
            use_bias: true,
        }
    }

    pub const fn with_activation(mut self, activation: ActivationFn) -> Self {
        self.activation = activation;
        self
    }

    pub const fn with_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    pub fn from_config(config: &LayerConfig) -> Result<Self, GraphError> {
        let units: usize = config.get_as(UNITS_KEY)?;
        if units == 0 {
            return Err(GraphError::InvalidConfiguration(
                "Dense层的units必须大于0".to_string(),
            ));
        }
        Ok(Self {
            units,
            activation: ActivationFn::from_config(config)?,
            use_bias: config.get_as_opt("use_bias")?.unwrap_or(true),
        })
    }

    pub const fn units(&self) -> usize {
        self.units
    }
}

impl TraitLayer for Dense {
    fn class_name(&self) -> &'static str {
        "Dense"
    }

    fn get_config(&self) -> LayerConfig {
        LayerConfig::new()
            .with(UNITS_KEY, self.units)
            .with("activation", self.activation.name())
            .with("use_bias", self.use_bias)
    }

    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError> {
        expect_input_count(self.class_name(), input_shapes, 1)?;
        let input = &input_shapes[0];
        fixed_last_dim(self.class_name(), input)?;
        Ok(vec![input.with_last_dim(Some(self.units))])
    }

    fn weight_specs(&self, input_shapes: &[DynamicShape]) -> Result<Vec<WeightSpec>, GraphError> {
        expect_input_count(self.class_name(), input_shapes, 1)?;
        let in_features = fixed_last_dim(self.class_name(), &input_shapes[0])?;
        let mut specs = vec![WeightSpec::new(
            "kernel",
            &[in_features, self.units],
            Init::Xavier,
        )];
        if self.use_bias {
            specs.push(WeightSpec::new("bias", &[self.units], Init::Zeros));
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
                    "Dense层执行时输入或权重个数不对".to_string(),
                ));
            }
        };
        let mut y = x.mat_mul_last_axis(kernel)?;
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
    fn test_dense_shapes_and_weight_specs() {
        let dense = Dense::new(2);
        let input = DynamicShape::with_dynamic_batch(&[3]);
        let out = dense.compute_output_shape(&[input.clone()]).unwrap();
        assert_eq!(out, vec![DynamicShape::with_dynamic_batch(&[2])]);

        let specs = dense.weight_specs(&[input]).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].shape, vec![3, 2]);
        assert_eq!(specs[1].shape, vec![2]);

        let no_bias = Dense::new(2).with_bias(false);
        let specs = no_bias
            .weight_specs(&[DynamicShape::with_dynamic_batch(&[3])])
            .unwrap();
        assert_eq!(specs.len(), 1);
    }

    #[test]
    fn test_dense_rejects_dynamic_feature_dim() {
        let dense = Dense::new(2);
        assert_err!(
            dense.compute_output_shape(&[DynamicShape::new(&[None, None])]),
            GraphError::InvalidOperation(msg) if msg.contains("末维")
        );
    }

    #[test]
    fn test_dense_config_round_trip() {
        let dense = Dense::new(4).with_activation(ActivationFn::Relu);
        let config = dense.get_config();
        assert_eq!(config.get_as::<usize>(UNITS_KEY).unwrap(), 4);
        assert_eq!(Dense::from_config(&config).unwrap(), dense);

        assert_err!(
            Dense::from_config(&LayerConfig::new().with(UNITS_KEY, 0)),
            GraphError::InvalidConfiguration(_)
        );
    }
}
