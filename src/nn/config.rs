/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 层配置（LayerConfig）：与框架无关的键值表，底层是 JSON 对象
 *
 * 层通过 `get_config()` 导出配置、通过注册表按配置重新实例化；
 * 复刻时会克隆配置、去掉名称、再按需改写 `units`/`filters`/`batch_input_shape`。
 */

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::GraphError;

/// 层名称（复刻时总会被剥离，由运行时重新分配）
pub const NAME_KEY: &str = "name";
/// 层是否可训练
pub const TRAINABLE_KEY: &str = "trainable";
/// 全连接类层的输出宽度
pub const UNITS_KEY: &str = "units";
/// 卷积类层的输出宽度
pub const FILTERS_KEY: &str = "filters";
/// 输入层的完整形状（含 batch 维）
pub const BATCH_INPUT_SHAPE_KEY: &str = "batch_input_shape";
/// 输入层不含 batch 维的形状
pub const INPUT_SHAPE_KEY: &str = "input_shape";

/// 层配置（不透明的键值表）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerConfig {
    map: Map<String, Value>,
}

/// 层被应用时记录下的附加调用参数，复刻时原样回放
pub type CallArgs = LayerConfig;

impl LayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置一个键值
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.map.insert(key.to_string(), value.into());
    }

    /// 将可序列化的值写入配置
    pub fn set_serialized<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), GraphError> {
        let value = serde_json::to_value(value).map_err(|e| {
            GraphError::InvalidConfiguration(format!("配置项`{key}`无法序列化: {e}"))
        })?;
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 读取并反序列化一个必需的配置项
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, GraphError> {
        self.get_as_opt(key)?.ok_or_else(|| {
            GraphError::InvalidConfiguration(format!("缺少配置项`{key}`"))
        })
    }

    /// 读取并反序列化一个可选的配置项（缺失或为 null 时返回 None）
    pub fn get_as_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, GraphError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                GraphError::InvalidConfiguration(format!("配置项`{key}`的值{value}无效: {e}"))
            }),
        }
    }
}

impl From<Map<String, Value>> for LayerConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self { map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;
    use crate::nn::DynamicShape;

    #[test]
    fn test_layer_config_get_set_remove() {
        let mut config = LayerConfig::new().with(UNITS_KEY, 3).with(NAME_KEY, "dense_1");
        assert!(config.contains_key(UNITS_KEY));
        assert_eq!(config.get_as::<usize>(UNITS_KEY).unwrap(), 3);

        config.set(UNITS_KEY, 5);
        assert_eq!(config.get_as::<usize>(UNITS_KEY).unwrap(), 5);

        assert_eq!(config.remove(NAME_KEY), Some(Value::from("dense_1")));
        assert!(!config.contains_key(NAME_KEY));
    }

    #[test]
    fn test_layer_config_shape_round_trip_through_json() {
        let mut config = LayerConfig::new();
        config
            .set_serialized(BATCH_INPUT_SHAPE_KEY, &DynamicShape::with_dynamic_batch(&[3]))
            .unwrap();
        assert_eq!(
            config.get(BATCH_INPUT_SHAPE_KEY),
            Some(&serde_json::json!([null, 3]))
        );
        let shape: DynamicShape = config.get_as(BATCH_INPUT_SHAPE_KEY).unwrap();
        assert_eq!(shape.to_string(), "[?, 3]");
    }

    #[test]
    fn test_layer_config_missing_or_invalid_value() {
        let config = LayerConfig::new().with(UNITS_KEY, "three").with("bias", Value::Null);
        assert_err!(
            config.get_as::<usize>("filters"),
            GraphError::InvalidConfiguration(msg) if msg.contains("filters")
        );
        assert_err!(
            config.get_as::<usize>(UNITS_KEY),
            GraphError::InvalidConfiguration(msg) if msg.contains("units")
        );
        assert_eq!(config.get_as_opt::<bool>("bias").unwrap(), None);
    }
}
