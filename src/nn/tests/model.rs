use approx::assert_abs_diff_eq;

use crate::assert_err;
use crate::nn::{
    Activation, ActivationFn, Add, Dense, DynamicShape, Graph, GraphError, LayerKind,
    MemoryInfo, Model, ModelDescriptor, ModelKind,
};
use crate::tensor::Tensor;

/// x[?, 3] -> fc(Dense 2)
fn single_dense_model(seed: u64) -> Model {
    let mut graph = Graph::new_with_seed(seed);
    let x = graph.input(DynamicShape::with_dynamic_batch(&[3]), "x").unwrap();
    let y = graph.apply(Dense::new(2), &x, "fc").unwrap();
    Model::functional(graph, &[x], &[y]).unwrap().with_name("single")
}

#[test]
fn test_functional_model_basics() {
    let model = single_dense_model(0);
    assert_eq!(model.name(), "single");
    assert_eq!(model.kind(), ModelKind::Functional);
    assert_eq!(model.layers().len(), 2);
    assert_eq!(model.input_layers().len(), 1);
    assert_eq!(model.output_layers().len(), 1);
    assert_eq!(model.get_layer("fc").unwrap().class_name(), "Dense");
    assert_eq!(model.count_params(), 8);
    assert_eq!(model.trainable_params(), 8);
    assert_eq!(model.non_trainable_params(), 0);
    assert_eq!(model.get_weights().len(), 2);
    assert_eq!(
        model.outputs()[0].shape(),
        &DynamicShape::with_dynamic_batch(&[2])
    );
    assert_err!(model.get_layer("nope"), GraphError::InvalidOperation(_));
}

#[test]
fn test_functional_model_rejects_non_input_entry() {
    let mut graph = Graph::new();
    let x = graph.input(DynamicShape::with_dynamic_batch(&[3]), "x").unwrap();
    let h = graph.apply(Dense::new(3), &x, "h").unwrap();
    let y = graph.apply(Dense::new(1), &h, "y").unwrap();
    assert_err!(
        Model::functional(graph, &[h], &[y]),
        GraphError::UnsupportedTopology(msg) if msg.contains("输入层")
    );
}

#[test]
fn test_functional_model_rejects_undeclared_input() {
    let mut graph = Graph::new();
    let a = graph.input(DynamicShape::with_dynamic_batch(&[3]), "a").unwrap();
    let b = graph.input(DynamicShape::with_dynamic_batch(&[3]), "b").unwrap();
    let sum = graph.apply(Add, vec![a.clone(), b], "sum").unwrap();
    assert_err!(
        Model::functional(graph, &[a], &[sum]),
        GraphError::UnsupportedTopology(msg) if msg.contains("b")
    );
}

#[test]
fn test_model_only_contains_reachable_layers() {
    let mut graph = Graph::new();
    let x = graph.input(DynamicShape::with_dynamic_batch(&[3]), "x").unwrap();
    let y = graph.apply(Dense::new(2), &x, "used").unwrap();
    let _ = graph.apply(Dense::new(5), &x, "unused").unwrap();
    let model = Model::functional(graph, &[x], &[y]).unwrap();
    let names: Vec<&str> = model.layers().iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["x", "used"]);
    assert_eq!(model.count_params(), 8);
}

#[test]
fn test_sequential_model() {
    let model = Model::sequential(
        Graph::new_with_seed(1),
        DynamicShape::with_dynamic_batch(&[4]),
        [
            LayerKind::from(Dense::new(3).with_activation(ActivationFn::Tanh)),
            LayerKind::from(Activation::new(ActivationFn::Relu)),
            LayerKind::from(Dense::new(1)),
        ],
    )
    .unwrap();
    assert_eq!(model.kind(), ModelKind::Sequential);
    assert_eq!(model.layers().len(), 4);
    assert_eq!(model.count_params(), 4 * 3 + 3 + 3 + 1);

    let out = model.predict(&[Tensor::ones(&[2, 4])]).unwrap();
    assert_eq!(out[0].shape(), &[2, 1]);
}

#[test]
fn test_predict_checks_inputs() {
    let model = single_dense_model(2);
    assert_err!(model.predict(&[]), GraphError::InvalidOperation(_));
    assert_err!(
        model.predict(&[Tensor::ones(&[1, 4])]),
        GraphError::ShapeMismatch([None, Some(3)], [Some(1), Some(4)], "输入数据与InputLayer的形状不兼容")
    );
}

#[test]
fn test_set_weights_then_predict() {
    let mut model = single_dense_model(3);
    model
        .set_weights(&[
            Tensor::new(&[1.0, 0.0, 0.0, 1.0, 1.0, 1.0], &[3, 2]),
            Tensor::new(&[0.5, -0.5], &[2]),
        ])
        .unwrap();
    let out = model
        .predict(&[Tensor::new(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0], &[2, 3])])
        .unwrap();
    let expected = [4.5, 4.5, 0.5, -0.5];
    for (got, want) in out[0].to_vec().iter().zip(expected) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
    }

    assert_err!(
        model.set_weights(&[Tensor::zeros(&[3, 2])]),
        GraphError::WeightMismatch(_)
    );
    assert_err!(
        model.set_weights(&[Tensor::zeros(&[2, 3]), Tensor::zeros(&[2])]),
        GraphError::WeightMismatch(msg) if msg.contains("第0个权重")
    );
}

#[test]
fn test_trainable_counts() {
    let mut model = single_dense_model(4);
    model.get_layer_mut("fc").unwrap().set_trainable(false);
    assert_eq!(model.trainable_params(), 0);
    assert_eq!(model.non_trainable_params(), 8);
}

#[test]
fn test_dispose_releases_weights() {
    let model = single_dense_model(5);
    let runtime = model.graph().runtime().clone();
    assert_eq!(runtime.memory().num_tensors, 2);
    model.dispose();
    assert_eq!(runtime.memory(), MemoryInfo::default());
}

#[test]
fn test_describe_and_summary() {
    let model = single_dense_model(6);
    let desc = model.describe();
    assert_eq!(desc.name, "single");
    assert_eq!(desc.inputs, vec!["x"]);
    assert_eq!(desc.outputs, vec!["fc"]);
    assert_eq!(desc.layers[1].inbound, vec!["x"]);
    assert_eq!(desc.layers[1].output_shapes[0].to_string(), "[?, 2]");
    assert_eq!(desc.total_params(), 8);

    let json = desc.to_json().unwrap();
    assert_eq!(ModelDescriptor::from_json(&json).unwrap(), desc);

    let summary = model.summary_string();
    assert!(summary.starts_with('┌'));
    assert!(summary.contains("dense") || summary.contains("Dense"));
    assert!(summary.contains("[?, 2]"));
    assert!(summary.contains("总参数量: 8"));
    assert!(summary.contains("可训练参数: 8"));
    assert!(summary.contains("不可训练参数: 0"));
    // 每行显示宽度一致
    let widths: Vec<usize> = summary
        .lines()
        .map(|l| l.chars().map(|c| if c.is_ascii() || "┌┬┐├┼┤└┴┘─│".contains(c) { 1 } else { 2 }).sum())
        .collect();
    assert!(widths.windows(2).all(|w| w[0] == w[1]), "{summary}");
}
