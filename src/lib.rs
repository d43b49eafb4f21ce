//! # Only Replica
//!
//! `only_replica`用纯rust实现层图模型的复刻（replicate）：
//! 按原模型的拓扑逐层重建一个同构的新模型，可改写入口层的输入形状与出口层的输出宽度，
//! 局部形状约定未受影响的层原样保留已训练的权重，其余层使用新初始化的权重。
//!
//! 为了能端到端地建图、执行与复刻，本crate自带一个小型的层运行时
//! （`Graph`、`Model`、层注册表与参数资源计数）。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;
