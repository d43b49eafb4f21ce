/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 运行时：层注册表 + 资源计数器。同一运行时下建出的图共享这两者
 */

use std::rc::Rc;

use super::{LayerRegistry, MemoryInfo, MemoryTracker};

#[derive(Debug, Clone, Default)]
pub struct Runtime {
    registry: Rc<LayerRegistry>,
    tracker: MemoryTracker,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义注册表
    pub fn with_registry(registry: LayerRegistry) -> Self {
        Self {
            registry: Rc::new(registry),
            tracker: MemoryTracker::new(),
        }
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub const fn tracker(&self) -> &MemoryTracker {
        &self.tracker
    }

    /// 当前存活的参数张量计数
    pub fn memory(&self) -> MemoryInfo {
        self.tracker.memory()
    }
}
