/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 复刻配置：输入形状改写、输出宽度改写与若干开关
 */

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::nn::{DynamicShape, GraphError};

/// 输入形状改写中表示"保持原样"的关键字
const PRESERVE_KEYWORD: &str = "preserve";

/// 单个入口层的输入形状改写
///
/// JSON 中以`"preserve"`（或`null`）表示保持原样，以形状数组（含 batch 维，动态维为`null`）表示改写。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShapeOverride {
    Preserve,
    Shape(DynamicShape),
}

impl InputShapeOverride {
    /// 改写为`[None, feature_dims...]`
    pub fn with_dynamic_batch(feature_dims: &[usize]) -> Self {
        Self::Shape(DynamicShape::with_dynamic_batch(feature_dims))
    }

    pub const fn shape(&self) -> Option<&DynamicShape> {
        match self {
            Self::Preserve => None,
            Self::Shape(shape) => Some(shape),
        }
    }
}

impl From<DynamicShape> for InputShapeOverride {
    fn from(shape: DynamicShape) -> Self {
        Self::Shape(shape)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OverrideRepr {
    Keyword(String),
    Shape(DynamicShape),
    Null(()),
}

impl<'de> Deserialize<'de> for InputShapeOverride {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match OverrideRepr::deserialize(deserializer)? {
            OverrideRepr::Keyword(k) if k == PRESERVE_KEYWORD => Ok(Self::Preserve),
            OverrideRepr::Keyword(k) => Err(serde::de::Error::custom(format!(
                "未知的输入形状改写关键字`{k}`，只支持`{PRESERVE_KEYWORD}`"
            ))),
            OverrideRepr::Shape(shape) => Ok(Self::Shape(shape)),
            OverrideRepr::Null(()) => Ok(Self::Preserve),
        }
    }
}

impl Serialize for InputShapeOverride {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Preserve => serializer.serialize_str(PRESERVE_KEYWORD),
            Self::Shape(shape) => shape.serialize(serializer),
        }
    }
}

/// 复刻配置
///
/// # 示例
/// ```
/// use only_replica::nn::{InputShapeOverride, ReplicateConfig};
///
/// let config = ReplicateConfig::new()
///     .with_input_shapes(vec![InputShapeOverride::with_dynamic_batch(&[5])])
///     .with_output_widths(vec![Some(2)])
///     .verbose(true);
/// assert!(!config.preserved_weights_are_trainable);
///
/// let from_json = ReplicateConfig::from_json(
///     r#"{"new_input_shapes": [[null, 5]], "new_output_widths": [2], "verbose": true}"#,
/// )
/// .unwrap();
/// assert_eq!(from_json, config);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplicateConfig {
    /// 每个入口层一项；缺省表示全部保持原样
    #[serde(alias = "newInputShapes")]
    pub new_input_shapes: Option<Vec<InputShapeOverride>>,
    /// 每个出口层一项，`None`表示保持原样；缺省表示全部保持原样
    #[serde(alias = "newOutputWidths")]
    pub new_output_widths: Option<Vec<Option<usize>>>,
    /// 权重被重置的层是否仍可训练
    #[serde(alias = "preservedWeightsAreTrainable")]
    pub preserved_weights_are_trainable: bool,
    /// 完成后以 info 级别日志列出权重被重置的层
    pub verbose: bool,
    /// 为 true 时，任何直接上游的输出形状发生变化的层也重置权重（沿图传递）
    #[serde(alias = "propagateShapeChanges")]
    pub propagate_shape_changes: bool,
    /// 新图权重初始化的随机种子
    pub seed: Option<u64>,
}

impl ReplicateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_shapes(mut self, shapes: Vec<InputShapeOverride>) -> Self {
        self.new_input_shapes = Some(shapes);
        self
    }

    pub fn with_output_widths(mut self, widths: Vec<Option<usize>>) -> Self {
        self.new_output_widths = Some(widths);
        self
    }

    pub const fn preserved_weights_are_trainable(mut self, trainable: bool) -> Self {
        self.preserved_weights_are_trainable = trainable;
        self
    }

    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub const fn propagate_shape_changes(mut self, propagate: bool) -> Self {
        self.propagate_shape_changes = propagate;
        self
    }

    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json)
            .map_err(|e| GraphError::InvalidConfiguration(format!("复刻配置解析失败：{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;

    #[test]
    fn test_input_shape_override_json() {
        let overrides: Vec<InputShapeOverride> =
            serde_json::from_str(r#"["preserve", null, [null, 5], [2, 5]]"#).unwrap();
        assert_eq!(
            overrides,
            vec![
                InputShapeOverride::Preserve,
                InputShapeOverride::Preserve,
                InputShapeOverride::with_dynamic_batch(&[5]),
                InputShapeOverride::Shape(DynamicShape::fixed(&[2, 5])),
            ]
        );

        let json = serde_json::to_string(&overrides[..1]).unwrap();
        assert_eq!(json, r#"["preserve"]"#);

        assert!(serde_json::from_str::<InputShapeOverride>(r#""keep""#).is_err());
    }

    #[test]
    fn test_replicate_config_json_aliases() {
        let config = ReplicateConfig::from_json(
            r#"{"newInputShapes": ["preserve"], "newOutputWidths": [null, 3], "preservedWeightsAreTrainable": true}"#,
        )
        .unwrap();
        assert_eq!(
            config.new_input_shapes,
            Some(vec![InputShapeOverride::Preserve])
        );
        assert_eq!(config.new_output_widths, Some(vec![None, Some(3)]));
        assert!(config.preserved_weights_are_trainable);
        assert!(!config.verbose);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_replicate_config_rejects_unknown_field() {
        assert_err!(
            ReplicateConfig::from_json(r#"{"new_shapes": []}"#),
            GraphError::InvalidConfiguration(msg) if msg.contains("new_shapes")
        );
    }
}
