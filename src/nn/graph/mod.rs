/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 层图（Graph）：以数组存放层节点，层只能作用于已存在的符号张量，
 *                 因此层的插入顺序即拓扑顺序
 */

mod builders;
mod core;
mod error;
mod forward;
mod node;
mod symbolic;

pub use error::GraphError;
pub use node::{InboundNode, LayerNode, Weight};
pub use symbolic::{LayerId, SymbolicInput, SymbolicTensor};

use rand::rngs::StdRng;

use super::Runtime;

/// 层图
///
/// 持有全部层节点、各次调用的执行顺序、用于权重初始化的随机数生成器，
/// 以及运行时句柄（注册表 + 资源计数器）。
pub struct Graph {
    uid: u64,
    name: String,
    runtime: Runtime,
    layers: Vec<LayerNode>,
    /// 每项为（层，第几次调用），按调用发生的先后排列
    node_order: Vec<(LayerId, usize)>,
    rng: StdRng,
    seeded: bool,
}
