/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 多输入合并层：Add（逐元素相加）与 Concatenate（沿末维拼接）
 */

use super::{TraitLayer, expect_min_input_count};
use crate::nn::{CallArgs, Dim, DynamicShape, GraphError, LayerConfig};
use crate::tensor::Tensor;

/// 合并两个兼容的维度，优先取确定值
fn merge_dim(a: Dim, b: Dim) -> Dim {
    a.or(b)
}

fn shape_error(class_name: &str, expected: &DynamicShape, got: &DynamicShape) -> GraphError {
    GraphError::ShapeMismatch {
        expected: expected.clone(),
        got: got.clone(),
        message: format!("{class_name}层的输入形状不兼容"),
    }
}

/// 逐元素相加，所有输入形状须兼容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Add;

impl Add {
    pub fn from_config(_config: &LayerConfig) -> Result<Self, GraphError> {
        Ok(Self)
    }
}

impl TraitLayer for Add {
    fn class_name(&self) -> &'static str {
        "Add"
    }

    fn get_config(&self) -> LayerConfig {
        LayerConfig::new()
    }

    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError> {
        expect_min_input_count(self.class_name(), input_shapes, 2)?;
        let first = &input_shapes[0];
        let mut dims = first.dims().to_vec();
        for shape in &input_shapes[1..] {
            if !first.is_compatible(shape) {
                return Err(shape_error(self.class_name(), first, shape));
            }
            for (d, &other) in dims.iter_mut().zip(shape.dims()) {
                *d = merge_dim(*d, other);
            }
        }
        Ok(vec![DynamicShape::new(&dims)])
    }

    fn call(
        &self,
        inputs: &[&Tensor],
        _weights: &[&Tensor],
        _args: &CallArgs,
    ) -> Result<Vec<Tensor>, GraphError> {
        let (first, rest) = inputs.split_first().ok_or_else(|| {
            GraphError::InvalidOperation("Add层执行时没有输入".to_string())
        })?;
        let mut sum = (*first).clone();
        for x in rest {
            sum = sum.add_same_shape(x)?;
        }
        Ok(vec![sum])
    }
}

/// 沿末维拼接，除末维外各输入形状须兼容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Concatenate;

impl Concatenate {
    pub fn from_config(_config: &LayerConfig) -> Result<Self, GraphError> {
        Ok(Self)
    }
}

impl TraitLayer for Concatenate {
    fn class_name(&self) -> &'static str {
        "Concatenate"
    }

    fn get_config(&self) -> LayerConfig {
        LayerConfig::new()
    }

    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError> {
        expect_min_input_count(self.class_name(), input_shapes, 2)?;
        let first = &input_shapes[0];
        let leading = |s: &DynamicShape| s.with_last_dim(None);
        let mut dims = first.dims().to_vec();
        let mut last: Dim = Some(0);
        for shape in input_shapes {
            if shape.ndim() == 0 || !leading(first).is_compatible(&leading(shape)) {
                return Err(shape_error(self.class_name(), first, shape));
            }
            for (d, &other) in dims.iter_mut().zip(shape.dims()) {
                *d = merge_dim(*d, other);
            }
            last = last.zip(shape.last_dim()).map(|(a, b)| a + b);
        }
        Ok(vec![DynamicShape::new(&dims).with_last_dim(last)])
    }

    fn call(
        &self,
        inputs: &[&Tensor],
        _weights: &[&Tensor],
        _args: &CallArgs,
    ) -> Result<Vec<Tensor>, GraphError> {
        Ok(vec![Tensor::concat_last_axis(inputs)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;

    #[test]
    fn test_add_output_shape() {
        let out = Add
            .compute_output_shape(&[
                DynamicShape::new(&[None, Some(3)]),
                DynamicShape::fixed(&[2, 3]),
            ])
            .unwrap();
        assert_eq!(out[0], DynamicShape::fixed(&[2, 3]));

        assert_err!(
            Add.compute_output_shape(&[
                DynamicShape::with_dynamic_batch(&[3]),
                DynamicShape::with_dynamic_batch(&[4]),
            ]),
            GraphError::ShapeMismatch { .. }
        );
        assert_err!(
            Add.compute_output_shape(&[DynamicShape::with_dynamic_batch(&[3])]),
            GraphError::InvalidOperation(_)
        );
    }

    #[test]
    fn test_concatenate_output_shape() {
        let out = Concatenate
            .compute_output_shape(&[
                DynamicShape::with_dynamic_batch(&[2]),
                DynamicShape::with_dynamic_batch(&[3]),
            ])
            .unwrap();
        assert_eq!(out[0].to_string(), "[?, 5]");

        let out = Concatenate
            .compute_output_shape(&[
                DynamicShape::with_dynamic_batch(&[2]),
                DynamicShape::new(&[None, None]),
            ])
            .unwrap();
        assert_eq!(out[0].to_string(), "[?, ?]");
    }
}
