/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 层注册表：类型标签 -> 构造函数
 */

use std::collections::HashMap;
use std::fmt;

use super::layer::{Activation, Add, Concatenate, Conv1d, Dense, InputLayer, LayerKind, Split};
use super::{GraphError, LayerConfig};

/// 由配置构造一个层
pub type LayerConstructor = fn(&LayerConfig) -> Result<LayerKind, GraphError>;

#[derive(Clone)]
pub struct LayerRegistry {
    constructors: HashMap<String, LayerConstructor>,
}

impl LayerRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// 注册了全部内置层的注册表
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("InputLayer", |c| InputLayer::from_config(c).map(LayerKind::from));
        registry.register("Dense", |c| Dense::from_config(c).map(LayerKind::from));
        registry.register("Conv1d", |c| Conv1d::from_config(c).map(LayerKind::from));
        registry.register("Activation", |c| Activation::from_config(c).map(LayerKind::from));
        registry.register("Add", |c| Add::from_config(c).map(LayerKind::from));
        registry.register("Concatenate", |c| Concatenate::from_config(c).map(LayerKind::from));
        registry.register("Split", |c| Split::from_config(c).map(LayerKind::from));
        registry
    }

    /// 注册（或覆盖）某类型标签的构造函数
    pub fn register(&mut self, class_name: &str, constructor: LayerConstructor) {
        self.constructors.insert(class_name.to_string(), constructor);
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    pub fn instantiate(
        &self,
        class_name: &str,
        config: &LayerConfig,
    ) -> Result<LayerKind, GraphError> {
        let constructor = self
            .constructors
            .get(class_name)
            .ok_or_else(|| GraphError::UnknownLayerType(class_name.to_string()))?;
        constructor(config)
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("LayerRegistry")
            .field("class_names", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;
    use crate::nn::layer::TraitLayer;

    #[test]
    fn test_registry_instantiates_builtins() {
        let registry = LayerRegistry::with_builtins();
        let layer = registry
            .instantiate("Dense", &LayerConfig::new().with("units", 3))
            .unwrap();
        assert_eq!(layer.class_name(), "Dense");
        assert!(registry.contains("Split"));
    }

    #[test]
    fn test_registry_unknown_layer() {
        let registry = LayerRegistry::empty();
        assert_err!(
            registry.instantiate("Dense", &LayerConfig::new()),
            GraphError::UnknownLayerType("Dense")
        );
    }

    #[test]
    fn test_registry_override_constructor() {
        let mut registry = LayerRegistry::with_builtins();
        // 把 Dense 的构造替换为总是带 relu 的版本
        registry.register("Dense", |c| {
            let mut config = c.clone();
            config.set("activation", "relu");
            Dense::from_config(&config).map(LayerKind::from)
        });
        let layer = registry
            .instantiate("Dense", &LayerConfig::new().with("units", 2))
            .unwrap();
        assert_eq!(layer.get_config().get("activation"), Some(&"relu".into()));
    }
}
