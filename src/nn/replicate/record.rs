/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 重建记录：原层 -> 新层的对应关系，以及按原层编号直接索引的记录表
 */

use serde::Serialize;

use crate::nn::{GraphError, LayerId};

/// 一个原层的重建结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconstructionRecord {
    /// 原图中的层
    pub original: LayerId,
    /// 新图中对应的层
    pub rebuilt: LayerId,
    /// 入口层：是否被改写了输入形状；其他层：新层的输出形状是否与原层不同
    pub requires_weights_reset: bool,
}

/// 复刻报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructionReport {
    /// 权重未被复制（保留新初始化值）的层，使用原层名称
    pub reset_layers: Vec<String>,
    /// 按原层拓扑顺序排列的全部重建记录
    pub records: Vec<ReconstructionRecord>,
}

impl ReconstructionReport {
    pub fn is_reset(&self, original_name: &str) -> bool {
        self.reset_layers.iter().any(|n| n == original_name)
    }

    pub fn record_of(&self, original: LayerId) -> Option<&ReconstructionRecord> {
        self.records.iter().find(|r| r.original == original)
    }
}

/// 仅在一次复刻过程中存在的记录表，以原层编号为下标
pub(super) struct ReconstructionTable {
    slots: Vec<Option<ReconstructionRecord>>,
}

impl ReconstructionTable {
    pub(super) fn new(layer_count: usize) -> Self {
        Self {
            slots: vec![None; layer_count],
        }
    }

    pub(super) fn insert(&mut self, record: ReconstructionRecord) {
        let index = record.original.0;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(record);
    }

    /// 上游层必然先于下游层被重建，查不到说明拓扑被破坏
    pub(super) fn get(&self, original: LayerId) -> Result<&ReconstructionRecord, GraphError> {
        self.slots
            .get(original.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| GraphError::UnsupportedTopology(format!("层{original}在其下游层之前尚未被重建")))
    }

    pub(super) fn into_records(self) -> Vec<ReconstructionRecord> {
        self.slots.into_iter().flatten().collect()
    }
}
