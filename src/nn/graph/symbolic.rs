/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 符号张量：图中某层某次调用的某个输出的句柄，不携带数据
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::nn::DynamicShape;

/// 层在图中的编号（即层在图内数组中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub usize);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 符号张量
///
/// 只标识"哪张图、哪一层、第几次调用、第几个输出"，以及该输出的形状。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicTensor {
    pub(in crate::nn) graph_uid: u64,
    pub(in crate::nn) layer: LayerId,
    pub(in crate::nn) node_index: usize,
    pub(in crate::nn) output_index: usize,
    pub(in crate::nn) shape: DynamicShape,
}

impl SymbolicTensor {
    /// 产生该张量的层
    pub const fn source_layer(&self) -> LayerId {
        self.layer
    }

    /// 该层的第几次调用
    pub const fn node_index(&self) -> usize {
        self.node_index
    }

    /// 该调用的第几个输出
    pub const fn output_index(&self) -> usize {
        self.output_index
    }

    pub const fn shape(&self) -> &DynamicShape {
        &self.shape
    }

    pub const fn graph_uid(&self) -> u64 {
        self.graph_uid
    }
}

/// 层的输入：单个符号张量，或（可嵌套的）符号张量列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicInput {
    Single(SymbolicTensor),
    List(Vec<SymbolicInput>),
}

impl SymbolicInput {
    /// 按出现顺序展平为符号张量列表
    pub fn flatten(&self) -> Vec<&SymbolicTensor> {
        match self {
            Self::Single(t) => vec![t],
            Self::List(items) => items.iter().flat_map(Self::flatten).collect(),
        }
    }

    /// 单个张量时返回它
    pub const fn as_single(&self) -> Option<&SymbolicTensor> {
        match self {
            Self::Single(t) => Some(t),
            Self::List(_) => None,
        }
    }
}

impl From<SymbolicTensor> for SymbolicInput {
    fn from(t: SymbolicTensor) -> Self {
        Self::Single(t)
    }
}

impl From<&SymbolicTensor> for SymbolicInput {
    fn from(t: &SymbolicTensor) -> Self {
        Self::Single(t.clone())
    }
}

impl From<Vec<SymbolicTensor>> for SymbolicInput {
    fn from(tensors: Vec<SymbolicTensor>) -> Self {
        Self::List(tensors.into_iter().map(Self::Single).collect())
    }
}

impl From<&[SymbolicTensor]> for SymbolicInput {
    fn from(tensors: &[SymbolicTensor]) -> Self {
        Self::List(tensors.iter().cloned().map(Self::Single).collect())
    }
}

impl<const N: usize> From<[&SymbolicTensor; N]> for SymbolicInput {
    fn from(tensors: [&SymbolicTensor; N]) -> Self {
        Self::List(tensors.into_iter().map(Self::from).collect())
    }
}
