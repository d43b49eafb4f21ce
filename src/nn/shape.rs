/*
 * DynamicShape: 支持动态维度的形状系统
 *
 * 类似 Keras/TensorFlow 的 (None, 128) 设计，允许某些维度在建图时未知。
 * 例如 batch 维度通常是动态的，因为训练和推理时可能使用不同的 batch_size。
 * 层的输入/输出形状、输入层的 `batch_input_shape` 配置以及输入形状改写都使用它。
 *
 * # 示例
 * ```
 * use only_replica::nn::DynamicShape;
 *
 * // 固定形状
 * let fixed = DynamicShape::fixed(&[32, 128]);
 * assert_eq!(fixed.to_string(), "[32, 128]");
 *
 * // 动态 batch
 * let dynamic_batch = DynamicShape::with_dynamic_batch(&[128]);
 * assert_eq!(dynamic_batch.to_string(), "[?, 128]");
 * ```
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// 维度值：Some(n) 表示固定值 n，None 表示动态（任意值）
pub type Dim = Option<usize>;

/// 动态形状：支持动态维度的形状表示
///
/// 序列化为 JSON 数组，动态维度为 `null`，如 `[null, 3]`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicShape {
    dims: Vec<Dim>,
}

impl DynamicShape {
    /// 创建一个动态形状
    ///
    /// # 示例
    /// ```
    /// use only_replica::nn::DynamicShape;
    ///
    /// let shape = DynamicShape::new(&[None, Some(128)]);
    /// assert_eq!(shape.ndim(), 2);
    /// assert!(shape.is_dynamic(0));
    /// assert!(!shape.is_dynamic(1));
    /// ```
    pub fn new(dims: &[Dim]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    /// 从固定形状创建（所有维度都是确定的）
    pub fn fixed(dims: &[usize]) -> Self {
        Self {
            dims: dims.iter().map(|&d| Some(d)).collect(),
        }
    }

    /// 创建一个动态 batch 的形状：第一维是 None（动态），其余维度固定。
    ///
    /// # 示例
    /// ```
    /// use only_replica::nn::DynamicShape;
    ///
    /// let shape = DynamicShape::with_dynamic_batch(&[128, 64]);
    /// assert_eq!(shape.to_string(), "[?, 128, 64]");
    /// ```
    pub fn with_dynamic_batch(feature_dims: &[usize]) -> Self {
        let mut dims = vec![None];
        dims.extend(feature_dims.iter().map(|&d| Some(d)));
        Self { dims }
    }

    /// 获取维度数量
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// 获取指定维度的值：Some(n) 如果维度固定，None 如果维度动态或越界
    pub fn dim(&self, index: usize) -> Dim {
        self.dims.get(index).copied().flatten()
    }

    /// 末维的值
    pub fn last_dim(&self) -> Dim {
        self.dims.last().copied().flatten()
    }

    /// 返回把末维替换为`last`后的新形状
    pub fn with_last_dim(&self, last: Dim) -> Self {
        let mut dims = self.dims.clone();
        if let Some(d) = dims.last_mut() {
            *d = last;
        }
        Self { dims }
    }

    /// 检查指定维度是否是动态的
    pub fn is_dynamic(&self, index: usize) -> bool {
        self.dims.get(index).map(|d| d.is_none()).unwrap_or(false)
    }

    /// 检查是否有任何动态维度
    pub fn has_dynamic_dims(&self) -> bool {
        self.dims.iter().any(|d| d.is_none())
    }

    /// 检查此形状是否与另一个形状兼容：维度数相同，且每一维至少有一方动态或两者相等
    pub fn is_compatible(&self, other: &DynamicShape) -> bool {
        if self.dims.len() != other.dims.len() {
            return false;
        }
        self.dims
            .iter()
            .zip(other.dims.iter())
            .all(|(a, b)| match (a, b) {
                (None, _) | (_, None) => true,
                (Some(x), Some(y)) => x == y,
            })
    }

    /// 检查此形状是否与实际张量形状兼容
    ///
    /// # 示例
    /// ```
    /// use only_replica::nn::DynamicShape;
    ///
    /// let shape = DynamicShape::new(&[None, Some(128)]);
    /// assert!(shape.is_compatible_with_tensor(&[32, 128]));
    /// assert!(!shape.is_compatible_with_tensor(&[32, 64]));
    /// assert!(!shape.is_compatible_with_tensor(&[32, 128, 10])); // 维度数不匹配
    /// ```
    pub fn is_compatible_with_tensor(&self, tensor_shape: &[usize]) -> bool {
        if self.dims.len() != tensor_shape.len() {
            return false;
        }
        self.dims
            .iter()
            .zip(tensor_shape.iter())
            .all(|(expected, &actual)| match expected {
                None => true,
                Some(n) => *n == actual,
            })
    }

    /// 转换为固定形状向量（如果所有维度都是固定的），有任何动态维度则返回 None
    pub fn to_vec_fixed(&self) -> Option<Vec<usize>> {
        self.dims.iter().copied().collect()
    }

    /// 获取内部维度数组的引用
    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }
}

impl fmt::Display for DynamicShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .dims
            .iter()
            .map(|d| match d {
                Some(n) => n.to_string(),
                None => "?".to_string(),
            })
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// 从固定形状转换
impl From<&[usize]> for DynamicShape {
    fn from(shape: &[usize]) -> Self {
        DynamicShape::fixed(shape)
    }
}

impl From<&[Dim]> for DynamicShape {
    fn from(dims: &[Dim]) -> Self {
        DynamicShape::new(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_shape_creation() {
        let fixed = DynamicShape::fixed(&[32, 128]);
        assert_eq!(fixed.ndim(), 2);
        assert!(!fixed.has_dynamic_dims());
        assert_eq!(fixed.dim(0), Some(32));
        assert_eq!(fixed.dim(1), Some(128));

        let dynamic_batch = DynamicShape::with_dynamic_batch(&[128]);
        assert!(dynamic_batch.has_dynamic_dims());
        assert!(dynamic_batch.is_dynamic(0));
        assert_eq!(dynamic_batch.dim(0), None);
        assert_eq!(dynamic_batch.last_dim(), Some(128));
    }

    #[test]
    fn test_dynamic_shape_display() {
        assert_eq!(DynamicShape::fixed(&[32, 128]).to_string(), "[32, 128]");
        assert_eq!(
            DynamicShape::new(&[None, Some(10), None]).to_string(),
            "[?, 10, ?]"
        );
    }

    #[test]
    fn test_with_last_dim() {
        let shape = DynamicShape::with_dynamic_batch(&[4, 3]);
        assert_eq!(shape.with_last_dim(Some(2)).to_string(), "[?, 4, 2]");
        assert_eq!(shape.with_last_dim(None).to_string(), "[?, 4, ?]");
        // 原形状不受影响
        assert_eq!(shape.to_string(), "[?, 4, 3]");
    }

    #[test]
    fn test_dynamic_shape_compatibility() {
        let dynamic = DynamicShape::new(&[None, Some(128)]);
        assert!(dynamic.is_compatible(&DynamicShape::fixed(&[32, 128])));
        assert!(!dynamic.is_compatible(&DynamicShape::fixed(&[32, 64])));
        assert!(!dynamic.is_compatible(&DynamicShape::fixed(&[32, 128, 10])));
    }

    #[test]
    fn test_dynamic_shape_serde_uses_null_for_dynamic_dims() {
        let shape = DynamicShape::with_dynamic_batch(&[3]);
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json, serde_json::json!([null, 3]));

        let back: DynamicShape = serde_json::from_value(json).unwrap();
        assert_eq!(back, shape);
    }

    #[test]
    fn test_to_vec_fixed() {
        assert_eq!(
            DynamicShape::fixed(&[32, 128]).to_vec_fixed(),
            Some(vec![32, 128])
        );
        assert_eq!(DynamicShape::with_dynamic_batch(&[128]).to_vec_fixed(), None);
    }
}
