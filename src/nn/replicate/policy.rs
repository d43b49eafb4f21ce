/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 形状改写策略：决定每个层是否需要重置权重
 */

use super::ReplicateConfig;
use super::record::ReconstructionTable;
use crate::nn::config::{FILTERS_KEY, UNITS_KEY};
use crate::nn::{DynamicShape, GraphError, LayerConfig, LayerId, LayerNode, Model};

pub(super) struct OverridePolicy<'a> {
    config: &'a ReplicateConfig,
    input_layers: &'a [LayerId],
    output_layers: &'a [LayerId],
}

impl<'a> OverridePolicy<'a> {
    /// 校验改写列表的长度与入口/出口层数量一致
    pub(super) fn new(model: &'a Model, config: &'a ReplicateConfig) -> Result<Self, GraphError> {
        let input_layers = model.input_layers();
        let output_layers = model.output_layers();
        let shapes_len = config.new_input_shapes.as_ref().map(Vec::len);
        if let Some(len) = shapes_len.filter(|&len| len != input_layers.len()) {
            return Err(GraphError::InvalidConfiguration(format!(
                "new_input_shapes的长度（{}）与模型{}的输入层数量（{}）不一致",
                len,
                model.name(),
                input_layers.len()
            )));
        }
        let widths_len = config.new_output_widths.as_ref().map(Vec::len);
        if let Some(len) = widths_len.filter(|&len| len != output_layers.len()) {
            return Err(GraphError::InvalidConfiguration(format!(
                "new_output_widths的长度（{}）与模型{}的输出层数量（{}）不一致",
                len,
                model.name(),
                output_layers.len()
            )));
        }
        Ok(Self {
            config,
            input_layers,
            output_layers,
        })
    }

    pub(super) fn is_entry(&self, id: LayerId) -> bool {
        self.input_layers.contains(&id)
    }

    /// 入口层的改写形状（`Preserve`或未提供时为 None）
    pub(super) fn input_override(&self, id: LayerId) -> Option<&'a DynamicShape> {
        let index = self.input_layers.iter().position(|&l| l == id)?;
        self.config
            .new_input_shapes
            .as_ref()?
            .get(index)?
            .shape()
    }

    /// 入口层是否因改写而需要重置；与原形状相同的改写同样算作改写
    pub(super) fn entry_requires_reset(&self, id: LayerId) -> bool {
        self.input_override(id).is_some()
    }

    /// 出口层的改写宽度（同一层作为多个输出时取第一个给出的宽度）
    fn output_width(&self, id: LayerId) -> Option<usize> {
        let widths = self.config.new_output_widths.as_ref()?;
        self.output_layers
            .iter()
            .zip(widths)
            .find_map(|(&l, &w)| if l == id { w } else { None })
    }

    /// 把输出宽度改写写入配置的`units`和/或`filters`，返回是否发生了改写
    pub(super) fn apply_output_override(
        &self,
        node: &LayerNode,
        config: &mut LayerConfig,
    ) -> Result<bool, GraphError> {
        let Some(width) = self.output_width(node.id()) else {
            return Ok(false);
        };
        let mut updated = false;
        for key in [UNITS_KEY, FILTERS_KEY] {
            if config.contains_key(key) {
                config.set(key, width);
                updated = true;
            }
        }
        if !updated {
            return Err(GraphError::InvalidConfiguration(format!(
                "无法改写层{}（{}）的输出宽度：其配置中既没有`{}`也没有`{}`",
                node.name(),
                node.class_name(),
                UNITS_KEY,
                FILTERS_KEY
            )));
        }
        Ok(true)
    }

    /// 非入口层是否需要重置权重
    ///
    /// - 输出宽度被改写；
    /// - 或任一直接输入来自被改写了形状的入口层（只看一跳）；
    /// - 开启`propagate_shape_changes`时，或任一直接上游的输出形状已发生变化。
    pub(super) fn requires_reset(
        &self,
        node: &LayerNode,
        output_overridden: bool,
        table: &ReconstructionTable,
    ) -> Result<bool, GraphError> {
        if output_overridden {
            return Ok(true);
        }
        let Some(inbound) = node.inbound_nodes().first() else {
            return Ok(false);
        };
        for t in inbound.inputs().flatten() {
            let source = t.source_layer();
            if self.is_entry(source) && self.entry_requires_reset(source) {
                return Ok(true);
            }
            if self.config.propagate_shape_changes && table.get(source)?.requires_weights_reset {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
