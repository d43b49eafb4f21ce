/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 复刻主流程：按拓扑顺序逐层重建，最后组装新模型
 */

use super::ReplicateConfig;
use super::policy::OverridePolicy;
use super::record::{ReconstructionRecord, ReconstructionReport, ReconstructionTable};
use super::resolver::{resolve, resolve_tensor};
use super::transfer::transfer_weights;
use crate::nn::config::{BATCH_INPUT_SHAPE_KEY, INPUT_SHAPE_KEY, NAME_KEY};
use crate::nn::{DynamicShape, Graph, GraphError, LayerNode, Model, ModelKind};

/// 复刻模型
///
/// 新模型与原模型拓扑同构、层类型与配置相同（名称重新分配），
/// 按`config`改写入口层的输入形状与出口层的输出宽度。
/// 受改写直接影响的层保留新初始化的权重，其余层按位置复制原权重。
///
/// 任何错误都会立即返回，原模型不被修改，已建出的部分新图随之释放。
///
/// # 示例
/// ```
/// use only_replica::nn::{Dense, DynamicShape, Graph, Model, ReplicateConfig, reconstruct};
///
/// let mut graph = Graph::new_with_seed(42);
/// let x = graph.input(DynamicShape::with_dynamic_batch(&[3]), "x").unwrap();
/// let y = graph.apply(Dense::new(3), &x, "fc").unwrap();
/// let model = Model::functional(graph, &[x], &[y]).unwrap();
///
/// let config = ReplicateConfig::new().with_output_widths(vec![Some(2)]);
/// let rebuilt = reconstruct(&model, &config).unwrap();
/// assert_eq!(rebuilt.outputs()[0].shape().to_string(), "[?, 2]");
/// assert_eq!(rebuilt.count_params(), 8);
/// ```
pub fn reconstruct(original: &Model, config: &ReplicateConfig) -> Result<Model, GraphError> {
    reconstruct_with_report(original, config).map(|(model, _)| model)
}

/// 同[`reconstruct`]，另外返回哪些层被重置了权重以及完整的重建记录
pub fn reconstruct_with_report(
    original: &Model,
    config: &ReplicateConfig,
) -> Result<(Model, ReconstructionReport), GraphError> {
    if original.kind() == ModelKind::Sequential {
        return Err(GraphError::UnsupportedTopology(format!(
            "不支持复刻顺序（Sequential）模型{}，请先转为函数式模型",
            original.name()
        )));
    }
    let policy = OverridePolicy::new(original, config)?;

    let source = original.graph();
    let mut rebuilt =
        Graph::with_runtime(source.runtime().clone(), config.seed).with_name(source.name());
    let mut table = ReconstructionTable::new(source.layer_count());
    let mut reset_layers = Vec::new();

    for node in original.layers() {
        let record = if policy.is_entry(node.id()) {
            rebuild_entry_layer(&policy, node, &mut rebuilt)?
        } else {
            let (record, reset) = rebuild_layer(&policy, config, node, &table, &mut rebuilt)?;
            if reset {
                reset_layers.push(node.name().to_string());
            }
            record
        };
        table.insert(record);
    }

    let model = assemble(original, &table, rebuilt)?;

    if config.verbose {
        if reset_layers.is_empty() {
            tracing::info!(model = %original.name(), "复刻完成，全部权重均已复制");
        } else {
            tracing::info!(
                model = %original.name(),
                reset_layers = ?reset_layers,
                "复刻完成，以下层的权重未被复制"
            );
        }
    }

    Ok((
        model,
        ReconstructionReport {
            reset_layers,
            records: table.into_records(),
        },
    ))
}

/// 重建入口层：改写形状写入`batch_input_shape`，入口层没有权重
fn rebuild_entry_layer(
    policy: &OverridePolicy<'_>,
    node: &LayerNode,
    rebuilt: &mut Graph,
) -> Result<ReconstructionRecord, GraphError> {
    let mut layer_config = node.config();
    layer_config.remove(NAME_KEY);

    let new_shape = policy.input_override(node.id());
    if let Some(shape) = new_shape {
        layer_config.remove(INPUT_SHAPE_KEY);
        layer_config.set_serialized(BATCH_INPUT_SHAPE_KEY, shape)?;
    }
    let id = rebuilt.instantiate(node.class_name(), &layer_config)?;

    tracing::debug!(
        layer = %node.name(),
        rebuilt = %rebuilt.get_layer(id)?.name(),
        new_shape = ?new_shape.map(ToString::to_string),
        "重建入口层"
    );
    Ok(ReconstructionRecord {
        original: node.id(),
        rebuilt: id,
        requires_weights_reset: policy.entry_requires_reset(node.id()),
    })
}

/// 重建非入口层，返回记录与该层是否被重置了权重
fn rebuild_layer(
    policy: &OverridePolicy<'_>,
    config: &ReplicateConfig,
    node: &LayerNode,
    table: &ReconstructionTable,
    rebuilt: &mut Graph,
) -> Result<(ReconstructionRecord, bool), GraphError> {
    let [inbound] = node.inbound_nodes() else {
        return Err(GraphError::UnsupportedTopology(format!(
            "层{}被调用了{}次，只支持每层恰好被调用1次",
            node.name(),
            node.inbound_nodes().len()
        )));
    };

    let mut layer_config = node.config();
    layer_config.remove(NAME_KEY);
    let output_overridden = policy.apply_output_override(node, &mut layer_config)?;
    let requires_reset = policy.requires_reset(node, output_overridden, table)?;

    let id = rebuilt.instantiate(node.class_name(), &layer_config)?;
    let inputs = resolve(table, rebuilt, inbound.inputs())?;
    let outputs = rebuilt.call_layer(id, inputs, inbound.call_args().clone())?;
    transfer_weights(
        node,
        rebuilt.get_layer_mut(id)?,
        requires_reset,
        config.preserved_weights_are_trainable,
    )?;

    let new_shapes: Vec<DynamicShape> = outputs.iter().map(|t| t.shape().clone()).collect();
    let shape_changed = new_shapes.as_slice() != inbound.output_shapes();
    if shape_changed && !requires_reset {
        tracing::warn!(
            layer = %node.name(),
            original = ?inbound.output_shapes(),
            rebuilt = ?new_shapes,
            "权重已复制，但输出形状发生了变化"
        );
    }
    tracing::debug!(
        layer = %node.name(),
        class = node.class_name(),
        rebuilt = %rebuilt.get_layer(id)?.name(),
        reset = requires_reset,
        shape_changed,
        "重建层"
    );

    Ok((
        ReconstructionRecord {
            original: node.id(),
            rebuilt: id,
            requires_weights_reset: shape_changed,
        },
        requires_reset,
    ))
}

/// 把原模型声明的输入/输出映射到新图，组装出新模型
fn assemble(original: &Model, table: &ReconstructionTable, rebuilt: Graph) -> Result<Model, GraphError> {
    let inputs = original
        .inputs()
        .iter()
        .map(|t| resolve_tensor(table, &rebuilt, t))
        .collect::<Result<Vec<_>, _>>()?;
    let outputs = original
        .outputs()
        .iter()
        .map(|t| resolve_tensor(table, &rebuilt, t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Model::functional(rebuilt, &inputs, &outputs)?.with_name(original.name()))
}
