/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : Graph 建图：添加层、由配置实例化层、以符号张量调用层
 */

use super::{Graph, GraphError, InboundNode, LayerId, LayerNode, SymbolicInput, SymbolicTensor, Weight};
use crate::nn::config::{NAME_KEY, TRAINABLE_KEY};
use crate::nn::layer::{InputLayer, LayerKind, TraitLayer, snake_case};
use crate::nn::{CallArgs, DynamicShape, LayerConfig};

impl Graph {
    /// 添加一个输入层并返回它的输出
    pub fn input(&mut self, batch_input_shape: DynamicShape, name: &str) -> Result<SymbolicTensor, GraphError> {
        let id = self.add_layer(InputLayer::new(batch_input_shape), name)?;
        let node = &self.layers[id.0];
        Ok(SymbolicTensor {
            graph_uid: self.uid,
            layer: id,
            node_index: 0,
            output_index: 0,
            shape: node.inbound_nodes[0].output_shapes[0].clone(),
        })
    }

    /// 添加一个层（尚未被调用）。`name`为空时自动命名。
    ///
    /// 输入层没有上游，添加时即记录它唯一的一次"调用"。
    pub fn add_layer(&mut self, layer: impl Into<LayerKind>, name: &str) -> Result<LayerId, GraphError> {
        let layer = layer.into();
        let name = self.generate_valid_new_layer_name(name, &snake_case(layer.class_name()))?;
        let id = LayerId(self.layers.len());

        let inbound_nodes = if let LayerKind::InputLayer(input) = &layer {
            self.node_order.push((id, 0));
            vec![InboundNode {
                inputs: SymbolicInput::List(Vec::new()),
                call_args: CallArgs::new(),
                output_shapes: vec![input.batch_input_shape().clone()],
            }]
        } else {
            Vec::new()
        };

        self.layers.push(LayerNode {
            id,
            name,
            layer,
            weights: Vec::new(),
            trainable: true,
            inbound_nodes,
        });
        Ok(id)
    }

    /// 经注册表按类型标签与配置实例化一个层并加入图中
    ///
    /// 配置中的`name`与`trainable`由层节点使用，其余交给层的构造函数。
    pub fn instantiate(&mut self, class_name: &str, config: &LayerConfig) -> Result<LayerId, GraphError> {
        let mut config = config.clone();
        let name = config.get_as_opt::<String>(NAME_KEY)?.unwrap_or_default();
        let trainable = config.get_as_opt::<bool>(TRAINABLE_KEY)?.unwrap_or(true);
        config.remove(NAME_KEY);
        config.remove(TRAINABLE_KEY);

        let layer = self.runtime.registry().instantiate(class_name, &config)?;
        let id = self.add_layer(layer, &name)?;
        self.layers[id.0].trainable = trainable;
        Ok(id)
    }

    /// 以符号输入调用一个已存在的层，返回本次调用的全部输出
    ///
    /// 首次调用时按输入形状创建权重；再次调用（共享层）时要求权重形状不变。
    pub fn call_layer(
        &mut self,
        id: LayerId,
        inputs: impl Into<SymbolicInput>,
        call_args: CallArgs,
    ) -> Result<Vec<SymbolicTensor>, GraphError> {
        let inputs = inputs.into();
        let node = self.get_layer(id)?;
        if node.is_input_layer() {
            return Err(GraphError::InvalidOperation(format!(
                "输入层{}不能被调用",
                node.name
            )));
        }

        let input_shapes = self.check_inputs(&inputs)?;
        let output_shapes = node.layer.compute_output_shape(&input_shapes)?;
        let specs = node.layer.weight_specs(&input_shapes)?;

        if node.inbound_nodes.is_empty() {
            let tracker = self.runtime.tracker().clone();
            let mut weights = Vec::with_capacity(specs.len());
            for spec in specs {
                let value = spec.init.generate_with_rng(&spec.shape, &mut self.rng);
                weights.push(Weight {
                    name: spec.name.to_string(),
                    value: tracker.track(value),
                });
            }
            self.layers[id.0].weights = weights;
        } else {
            let unchanged = specs.len() == node.weights.len()
                && specs
                    .iter()
                    .zip(&node.weights)
                    .all(|(spec, w)| spec.shape.as_slice() == w.value().shape());
            if !unchanged {
                return Err(GraphError::WeightMismatch(format!(
                    "层{}再次被调用时输入形状与首次调用不一致",
                    node.name
                )));
            }
        }

        let node = &mut self.layers[id.0];
        let node_index = node.inbound_nodes.len();
        node.inbound_nodes.push(InboundNode {
            inputs,
            call_args,
            output_shapes: output_shapes.clone(),
        });
        self.node_order.push((id, node_index));

        Ok(output_shapes
            .into_iter()
            .enumerate()
            .map(|(output_index, shape)| SymbolicTensor {
                graph_uid: self.uid,
                layer: id,
                node_index,
                output_index,
                shape,
            })
            .collect())
    }

    /// 添加一个层并立即调用，适用于单输出层
    pub fn apply(
        &mut self,
        layer: impl Into<LayerKind>,
        inputs: impl Into<SymbolicInput>,
        name: &str,
    ) -> Result<SymbolicTensor, GraphError> {
        let mut outputs = self.apply_multi(layer, inputs, name)?;
        if outputs.len() != 1 {
            if let Some(first) = outputs.first() {
                self.remove_last_layer(first.layer);
            }
            return Err(GraphError::InvalidOperation(format!(
                "该层有{}个输出，请使用apply_multi",
                outputs.len()
            )));
        }
        Ok(outputs.remove(0))
    }

    /// 添加一个层并立即调用，返回全部输出。调用失败时撤销该层。
    pub fn apply_multi(
        &mut self,
        layer: impl Into<LayerKind>,
        inputs: impl Into<SymbolicInput>,
        name: &str,
    ) -> Result<Vec<SymbolicTensor>, GraphError> {
        let id = self.add_layer(layer, name)?;
        self.call_layer(id, inputs, CallArgs::new())
            .inspect_err(|_| self.remove_last_layer(id))
    }

    /// 撤销刚加入的层（连同其权重与调用记录）
    fn remove_last_layer(&mut self, id: LayerId) {
        if self.layers.last().map(|l| l.id) == Some(id) {
            self.layers.pop();
            self.node_order.retain(|(layer, _)| *layer != id);
        }
    }

    /// 校验符号输入都来自本图且引用有效，返回展平后的输入形状
    fn check_inputs(&self, inputs: &SymbolicInput) -> Result<Vec<DynamicShape>, GraphError> {
        let flat = inputs.flatten();
        if flat.is_empty() {
            return Err(GraphError::InvalidOperation("层调用至少需要1个输入".to_string()));
        }
        flat.into_iter()
            .map(|t| {
                if t.graph_uid != self.uid {
                    return Err(GraphError::InvalidOperation(format!(
                        "符号张量来自其他图（uid={}），不能在图{}中使用",
                        t.graph_uid, self.name
                    )));
                }
                let source = self.get_layer(t.layer)?;
                let exists = source
                    .inbound_nodes
                    .get(t.node_index)
                    .is_some_and(|n| t.output_index < n.output_shapes.len());
                if !exists {
                    return Err(GraphError::InvalidOperation(format!(
                        "层{}不存在第{}次调用的第{}个输出",
                        source.name, t.node_index, t.output_index
                    )));
                }
                Ok(t.shape.clone())
            })
            .collect()
    }
}
