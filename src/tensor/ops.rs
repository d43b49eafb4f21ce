/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 层前向计算所需的张量运算：矩阵乘、偏置广播、逐元素相加、沿末维拼接/切分、一维卷积
 */

use ndarray::{Array3, Axis, Ix2, Ix3, IxDyn, Slice, s};

use super::Tensor;
use crate::errors::{Operator, TensorError};

impl Tensor {
    /// 矩阵乘法。只接受2阶张量，且前一个张量的列数（col）须等于后一个张量的行数（row）。
    pub fn mat_mul(&self, other: &Self) -> Result<Self, TensorError> {
        for t in [self, other] {
            if t.dimension() != 2 {
                return Err(TensorError::RankMismatch {
                    operator: Operator::MatMul,
                    expected: 2,
                    got: t.dimension(),
                });
            }
        }
        if self.shape()[1] != other.shape()[0] {
            return Err(self.operator_error(Operator::MatMul, other));
        }
        let lhs = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| TensorError::IncompatibleShape)?;
        let rhs = other
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| TensorError::IncompatibleShape)?;
        Ok(Self::from_array(lhs.dot(&rhs).into_dyn()))
    }

    /// 沿末维与2阶`kernel`相乘：[..., in] @ [in, out] = [..., out]。
    /// 前导维度先被展平为一维，计算后再还原。
    pub fn mat_mul_last_axis(&self, kernel: &Self) -> Result<Self, TensorError> {
        let shape = self.shape();
        let Some((&last, leading)) = shape.split_last() else {
            return Err(TensorError::RankMismatch {
                operator: Operator::MatMul,
                expected: 2,
                got: 0,
            });
        };
        let rows = leading.iter().product::<usize>();
        let flat = self
            .data
            .clone()
            .into_shape(IxDyn(&[rows, last]))
            .map_err(|_| TensorError::IncompatibleShape)?;
        let product = Self::from_array(flat).mat_mul(kernel)?;

        let mut out_shape = leading.to_vec();
        out_shape.push(kernel.shape()[1]);
        let data = product
            .data
            .into_shape(IxDyn(&out_shape))
            .map_err(|_| TensorError::IncompatibleShape)?;
        Ok(Self::from_array(data))
    }

    /// 沿末维广播加上1阶的`bias`
    pub fn add_bias(&self, bias: &Self) -> Result<Self, TensorError> {
        if bias.dimension() != 1 || self.shape().last() != bias.shape().first() {
            return Err(self.operator_error(Operator::BiasAdd, bias));
        }
        let broadcast = bias
            .data
            .broadcast(self.data.raw_dim())
            .ok_or_else(|| self.operator_error(Operator::BiasAdd, bias))?;
        Ok(Self::from_array(&self.data + &broadcast))
    }

    /// 形状严格一致的两个张量逐元素相加
    pub fn add_same_shape(&self, other: &Self) -> Result<Self, TensorError> {
        if self.shape() != other.shape() {
            return Err(self.operator_error(Operator::Add, other));
        }
        Ok(Self::from_array(&self.data + &other.data))
    }

    /// 沿末维拼接多个张量（其余维度须一致）
    pub fn concat_last_axis(tensors: &[&Self]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        let axis = first
            .dimension()
            .checked_sub(1)
            .ok_or(TensorError::IncompatibleShape)?;
        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        let data = ndarray::concatenate(Axis(axis), &views)
            .map_err(|_| TensorError::InconsistentShape)?;
        Ok(Self::from_array(data))
    }

    /// 沿末维按`sizes`依次切分，`sizes`之和须等于末维长度
    pub fn split_last_axis(&self, sizes: &[usize]) -> Result<Vec<Self>, TensorError> {
        let axis = self
            .dimension()
            .checked_sub(1)
            .ok_or(TensorError::IncompatibleShape)?;
        if sizes.iter().sum::<usize>() != self.shape()[axis] {
            return Err(TensorError::OperatorError {
                operator: Operator::Split,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: sizes.to_vec(),
            });
        }
        let mut start = 0;
        let mut parts = Vec::with_capacity(sizes.len());
        for &size in sizes {
            let part = self
                .data
                .slice_axis(Axis(axis), Slice::from(start..start + size))
                .to_owned();
            parts.push(Self::from_array(part));
            start += size;
        }
        Ok(parts)
    }

    /// 一维卷积（valid 填充、步长1）：[batch, steps, channels] * [kernel_size, channels, filters]
    /// = [batch, steps - kernel_size + 1, filters]
    pub fn conv1d_valid(&self, kernel: &Self) -> Result<Self, TensorError> {
        for (t, expected) in [(self, 3), (kernel, 3)] {
            if t.dimension() != expected {
                return Err(TensorError::RankMismatch {
                    operator: Operator::Conv1d,
                    expected,
                    got: t.dimension(),
                });
            }
        }
        let input = self
            .data
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| TensorError::IncompatibleShape)?;
        let weight = kernel
            .data
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| TensorError::IncompatibleShape)?;
        let (batch, steps, channels) = input.dim();
        let (kernel_size, kernel_channels, filters) = weight.dim();
        if channels != kernel_channels || kernel_size == 0 || kernel_size > steps {
            return Err(self.operator_error(Operator::Conv1d, kernel));
        }

        let out_steps = steps - kernel_size + 1;
        let mut out = Array3::<f32>::zeros((batch, out_steps, filters));
        for b in 0..batch {
            let mut acc = out.slice_mut(s![b, .., ..]);
            for i in 0..kernel_size {
                // [out_steps, channels] @ [channels, filters]
                let window = input.slice(s![b, i..i + out_steps, ..]);
                let w_i = weight.slice(s![i, .., ..]);
                acc += &window.dot(&w_i);
            }
        }
        Ok(Self::from_array(out.into_dyn()))
    }

    fn operator_error(&self, operator: Operator, other: &Self) -> TensorError {
        TensorError::OperatorError {
            operator,
            tensor1_shape: self.shape().to_vec(),
            tensor2_shape: other.shape().to_vec(),
        }
    }
}
