/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 负责层图模型的构建、执行与复刻（replicate）
 */

mod config;
mod graph;
mod init;
pub mod layer;
mod memory;
mod model;
mod registry;
pub mod replicate;
mod runtime;
mod shape;

pub use config::{CallArgs, LayerConfig};
pub use graph::{
    Graph, GraphError, InboundNode, LayerId, LayerNode, SymbolicInput, SymbolicTensor, Weight,
};
pub use init::Init;
pub use layer::{
    Activation, ActivationFn, Add, Concatenate, Conv1d, Dense, InputLayer, LayerKind, Split,
    TraitLayer,
};
pub use memory::{MemoryInfo, MemoryTracker, TrackedTensor};
pub use model::{LayerSummary, Model, ModelDescriptor, ModelKind};
pub use registry::{LayerConstructor, LayerRegistry};
pub use replicate::{
    InputShapeOverride, ReconstructionRecord, ReconstructionReport, ReplicateConfig, reconstruct,
    reconstruct_with_report,
};
pub use runtime::Runtime;
pub use shape::{Dim, DynamicShape};

#[cfg(test)]
mod tests;
