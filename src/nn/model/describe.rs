/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : Model describe/summary 相关方法
 */

use serde::{Deserialize, Serialize};

use super::{Model, ModelKind};
use crate::nn::{DynamicShape, LayerConfig, TraitLayer};

/// 单个层的描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub name: String,
    pub class_name: String,
    pub output_shapes: Vec<DynamicShape>,
    pub param_count: usize,
    pub trainable: bool,
    /// 首次调用的上游层名称
    pub inbound: Vec<String>,
    pub config: LayerConfig,
}

/// 模型描述符（用于序列化、调试、比较两个模型的结构）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub kind: ModelKind,
    pub layers: Vec<LayerSummary>,
    /// 入口层名称
    pub inputs: Vec<String>,
    /// 出口层名称
    pub outputs: Vec<String>,
}

impl ModelDescriptor {
    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|l| l.param_count).sum()
    }

    pub fn trainable_params(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| l.trainable)
            .map(|l| l.param_count)
            .sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Model {
    // ========== 模型描述（describe）==========

    /// 导出模型的描述符
    pub fn describe(&self) -> ModelDescriptor {
        let layer_name = |id| {
            self.graph
                .get_layer(id)
                .map(|l| l.name().to_string())
                .unwrap_or_default()
        };
        let layers = self
            .layers()
            .into_iter()
            .map(|node| LayerSummary {
                name: node.name().to_string(),
                class_name: node.class_name().to_string(),
                output_shapes: node.output_shapes().map(<[_]>::to_vec).unwrap_or_default(),
                param_count: node.count_params(),
                trainable: node.trainable(),
                inbound: node
                    .inbound_nodes()
                    .first()
                    .map(|n| {
                        n.inputs()
                            .flatten()
                            .iter()
                            .map(|t| layer_name(t.source_layer()))
                            .collect()
                    })
                    .unwrap_or_default(),
                config: node.layer().get_config(),
            })
            .collect();

        ModelDescriptor {
            name: self.name.clone(),
            kind: self.kind,
            layers,
            inputs: self.input_layers.iter().map(|&id| layer_name(id)).collect(),
            outputs: self.output_layers.iter().map(|&id| layer_name(id)).collect(),
        }
    }

    // ========== 模型摘要（summary）==========

    /// 打印模型摘要（类似 Keras 的 `model.summary()`）
    pub fn summary(&self) {
        println!("{}", self.summary_string());
    }

    /// 返回模型摘要字符串（Unicode 文本表格，用于控制台输出）
    ///
    /// ```text
    /// ┌───────────────┬────────────┬──────────┬────────────┬───────────────┐
    /// │ 层名称        │ 类型       │ 输出形状 │ 参数量     │ 上游层        │
    /// ├───────────────┼────────────┼──────────┼────────────┼───────────────┤
    /// │ input_layer_1 │ InputLayer │ [?, 3]   │          - │ -             │
    /// │ dense_1       │ Dense      │ [?, 2]   │          8 │ input_layer_1 │
    /// ├───────────────┴────────────┴──────────┴────────────┴───────────────┤
    /// │ 总参数量: 8                                                        │
    /// ...
    /// ```
    pub fn summary_string(&self) -> String {
        let desc = self.describe();
        let shape_str = |l: &LayerSummary| {
            l.output_shapes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let inbound_str = |l: &LayerSummary| {
            if l.inbound.is_empty() {
                "-".to_string()
            } else {
                l.inbound.join(", ")
            }
        };

        // 计算各列宽度
        let name_width = column_width(&desc.layers, |l| display_width(&l.name), 8);
        let type_width = column_width(&desc.layers, |l| l.class_name.len(), 8);
        let shape_width = column_width(&desc.layers, |l| shape_str(l).len(), 8);
        let param_width = 10;
        let inbound_width = column_width(&desc.layers, |l| display_width(&inbound_str(l)), 6);
        let widths = [name_width, type_width, shape_width, param_width, inbound_width];

        let total_width = widths.iter().sum::<usize>() + 16; // 边框和间距

        let rule = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{left}{}{right}\n", segments.join(mid))
        };
        let row = |cells: [String; 5]| {
            let mut line = String::from("│");
            for (i, (cell, w)) in cells.iter().zip(widths).enumerate() {
                // 参数量列右对齐
                if i == 3 {
                    line.push_str(&format!(" {} │", pad_left(cell, w)));
                } else {
                    line.push_str(&format!(" {} │", pad_right(cell, w)));
                }
            }
            line.push('\n');
            line
        };

        let mut output = String::new();

        // 表头
        output.push_str(&rule("┌", "┬", "┐"));
        output.push_str(&row([
            "层名称".to_string(),
            "类型".to_string(),
            "输出形状".to_string(),
            "参数量".to_string(),
            "上游层".to_string(),
        ]));
        output.push_str(&rule("├", "┼", "┤"));

        // 层行
        for layer in &desc.layers {
            let param_str = if layer.param_count == 0 {
                "-".to_string()
            } else {
                format_number(layer.param_count)
            };
            output.push_str(&row([
                layer.name.clone(),
                layer.class_name.clone(),
                shape_str(layer),
                param_str,
                inbound_str(layer),
            ]));
        }

        // 分隔线
        output.push_str(&rule("├", "┴", "┤"));

        // 统计信息
        let total_params = desc.total_params();
        let trainable_params = desc.trainable_params();
        for line in [
            format!("总参数量: {}", format_number(total_params)),
            format!("可训练参数: {}", format_number(trainable_params)),
            format!("不可训练参数: {}", format_number(total_params - trainable_params)),
        ] {
            output.push_str(&format!("│ {} │\n", pad_right(&line, total_width - 4)));
        }

        // 底边
        output.push_str(&format!("└{}┘\n", "─".repeat(total_width - 2)));

        output
    }
}

fn column_width(layers: &[LayerSummary], f: impl Fn(&LayerSummary) -> usize, min: usize) -> usize {
    layers.iter().map(f).max().unwrap_or(min).max(min)
}

/// 格式化数字为千分位分隔形式
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// 计算字符串显示宽度（考虑中文字符）
fn display_width(s: &str) -> usize {
    s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn pad_right(s: &str, width: usize) -> String {
    format!("{s}{}", " ".repeat(width.saturating_sub(display_width(s))))
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{}{s}", " ".repeat(width.saturating_sub(display_width(s))))
}
