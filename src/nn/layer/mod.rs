/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 层（Layer）模块：可被符号张量调用、持有有序权重的计算单元
 *
 * 每种层都能由`LayerConfig`构造（`from_config`），也能导出自己的配置（`get_config`），
 * 复刻时正是靠这一对操作重建出同类型的新层。
 */

mod activation;
mod conv1d;
mod dense;
mod input;
mod merge;
mod split;

pub use activation::{Activation, ActivationFn};
pub use conv1d::Conv1d;
pub use dense::Dense;
pub use input::InputLayer;
pub use merge::{Add, Concatenate};
pub use split::Split;

use enum_dispatch::enum_dispatch;

use crate::nn::{CallArgs, DynamicShape, GraphError, Init, LayerConfig};
use crate::tensor::Tensor;

/// 一个权重的声明：名称、形状与初始化方式
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSpec {
    pub name: &'static str,
    pub shape: Vec<usize>,
    pub init: Init,
}

impl WeightSpec {
    pub fn new(name: &'static str, shape: &[usize], init: Init) -> Self {
        Self {
            name,
            shape: shape.to_vec(),
            init,
        }
    }
}

#[enum_dispatch]
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    InputLayer(InputLayer),
    Dense(Dense),
    Conv1d(Conv1d),
    Activation(Activation),
    Add(Add),
    Concatenate(Concatenate),
    Split(Split),
}

#[enum_dispatch(LayerKind)]
pub trait TraitLayer {
    /// 类型标签，注册表按它找到构造函数
    fn class_name(&self) -> &'static str;

    /// 导出配置（不含`name`与`trainable`，这两项由图中的层节点补上）
    fn get_config(&self) -> LayerConfig;

    /// 根据输入形状推导各输出的形状；同时负责校验输入个数与形状
    fn compute_output_shape(
        &self,
        input_shapes: &[DynamicShape],
    ) -> Result<Vec<DynamicShape>, GraphError>;

    /// 首次调用时需要创建的权重（顺序即权重的位置顺序）
    fn weight_specs(&self, _input_shapes: &[DynamicShape]) -> Result<Vec<WeightSpec>, GraphError> {
        Ok(Vec::new())
    }

    /// 前向计算
    fn call(
        &self,
        inputs: &[&Tensor],
        weights: &[&Tensor],
        args: &CallArgs,
    ) -> Result<Vec<Tensor>, GraphError>;
}

/// 类型标签转为蛇形命名，用作自动生成层名的前缀，如`InputLayer` -> `input_layer`
pub(in crate::nn) fn snake_case(class_name: &str) -> String {
    let mut out = String::with_capacity(class_name.len() + 4);
    for (i, c) in class_name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// 校验输入个数恰为`expected`
fn expect_input_count(
    class_name: &str,
    input_shapes: &[DynamicShape],
    expected: usize,
) -> Result<(), GraphError> {
    if input_shapes.len() != expected {
        return Err(GraphError::InvalidOperation(format!(
            "{}层需要{}个输入，但得到了{}个",
            class_name,
            expected,
            input_shapes.len()
        )));
    }
    Ok(())
}

/// 校验输入个数至少为`min`
fn expect_min_input_count(
    class_name: &str,
    input_shapes: &[DynamicShape],
    min: usize,
) -> Result<(), GraphError> {
    if input_shapes.len() < min {
        return Err(GraphError::InvalidOperation(format!(
            "{}层至少需要{}个输入，但得到了{}个",
            class_name,
            min,
            input_shapes.len()
        )));
    }
    Ok(())
}

/// 取末维的确定值（权重形状依赖它）
fn fixed_last_dim(class_name: &str, shape: &DynamicShape) -> Result<usize, GraphError> {
    shape.last_dim().ok_or_else(|| {
        GraphError::InvalidOperation(format!(
            "{}层输入的末维必须是确定值，但输入形状为{}",
            class_name, shape
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("InputLayer"), "input_layer");
        assert_eq!(snake_case("Dense"), "dense");
        assert_eq!(snake_case("Conv1d"), "conv1d");
    }
}
