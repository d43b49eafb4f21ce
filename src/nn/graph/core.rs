/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : Graph 的创建、访问器与命名
 */

use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{Graph, GraphError, LayerId, LayerNode};
use crate::nn::{MemoryInfo, Runtime};

static NEXT_GRAPH_UID: AtomicU64 = AtomicU64::new(1);

impl Graph {
    // ========== 创建 ==========

    pub fn new() -> Self {
        Self::with_runtime(Runtime::new(), None)
    }

    /// 创建一个带固定种子的图（确保权重初始化可重复）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_runtime(Runtime::new(), Some(seed))
    }

    /// 在给定运行时下创建图；同一运行时下的图共享注册表与资源计数器
    pub fn with_runtime(runtime: Runtime, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            uid: NEXT_GRAPH_UID.fetch_add(1, Ordering::Relaxed),
            name: "default_graph".to_string(),
            runtime,
            layers: Vec::new(),
            node_order: Vec::new(),
            rng,
            seeded: seed.is_some(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // ========== 基础访问器 ==========

    /// 设置/重置图的随机种子
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.seeded = true;
    }

    /// 检查图是否有固定种子
    pub const fn has_seed(&self) -> bool {
        self.seeded
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn uid(&self) -> u64 {
        self.uid
    }

    pub const fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn memory(&self) -> MemoryInfo {
        self.runtime.memory()
    }

    /// 按插入（拓扑）顺序排列的全部层
    pub fn layers(&self) -> &[LayerNode] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// 按调用先后排列的（层，调用序号）
    pub fn node_order(&self) -> &[(LayerId, usize)] {
        &self.node_order
    }

    pub fn get_layer(&self, id: LayerId) -> Result<&LayerNode, GraphError> {
        self.layers.get(id.0).ok_or(GraphError::LayerNotFound(id))
    }

    pub fn get_layer_mut(&mut self, id: LayerId) -> Result<&mut LayerNode, GraphError> {
        self.layers.get_mut(id.0).ok_or(GraphError::LayerNotFound(id))
    }

    pub fn find_layer(&self, name: &str) -> Option<&LayerNode> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    // ========== 命名 ==========

    pub(in crate::nn::graph) fn check_duplicate_layer_name(&self, name: &str) -> Result<(), GraphError> {
        if self.find_layer(name).is_some() {
            return Err(GraphError::DuplicateLayerName(name.to_string()));
        }
        Ok(())
    }

    /// `base_name`非空时直接使用（须不重复）；否则按`{层类型}_{序号}`自动生成
    pub(in crate::nn::graph) fn generate_valid_new_layer_name(
        &self,
        base_name: &str,
        layer_type: &str,
    ) -> Result<String, GraphError> {
        if !base_name.is_empty() {
            self.check_duplicate_layer_name(base_name)?;
            return Ok(base_name.to_string());
        }

        let mut counter = 1;
        loop {
            let name = format!("{layer_type}_{counter}");
            if self.check_duplicate_layer_name(&name).is_ok() {
                return Ok(name);
            }
            counter += 1;
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("layers", &self.layers.len())
            .field("calls", &self.node_order.len())
            .finish()
    }
}
