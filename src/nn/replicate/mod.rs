/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 模型复刻（replicate）：按原模型的拓扑逐层重建一个同构的新模型，
 *                 可改写入口层的输入形状与出口层的输出宽度；
 *                 局部形状约定未受影响的层原样复制权重，其余层保留新初始化的权重
 */

mod config;
mod driver;
mod policy;
mod record;
mod resolver;
mod transfer;

pub use config::{InputShapeOverride, ReplicateConfig};
pub use driver::{reconstruct, reconstruct_with_report};
pub use record::{ReconstructionRecord, ReconstructionReport};
