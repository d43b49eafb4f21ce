/*
 * @Author       : 老董
 * @Date         : 2026-02-13
 * @Description  : 迁移场景：保留已"训练"好的主干，只换一个不同宽度的输出头
 *                 网络结构：Input(4) -> Dense(8, relu) -> Dense(8, tanh) -> Dense(3)
 */
use only_replica::nn::{
    ActivationFn, Dense, DynamicShape, Graph, GraphError, Model, ReplicateConfig,
    reconstruct_with_report,
};
use only_replica::tensor::Tensor;

fn build_classifier(seed: u64) -> Result<(Model, [Tensor; 2]), GraphError> {
    let mut graph = Graph::new_with_seed(seed);
    let x = graph.input(DynamicShape::with_dynamic_batch(&[4]), "features")?;
    let h1 = graph.apply(Dense::new(8).with_activation(ActivationFn::Relu), &x, "backbone_1")?;
    let h2 = graph.apply(Dense::new(8).with_activation(ActivationFn::Tanh), &h1, "backbone_2")?;
    let logits = graph.apply(Dense::new(3), &h2, "head")?;

    let mut model = Model::functional(graph, &[x], &[logits])?.with_name("classifier");

    // 模拟训练后的权重：按位置整体覆盖
    let trained: Vec<Tensor> = model
        .get_weights()
        .iter()
        .map(|w| w.map(|v| v * 0.5 + 0.01))
        .collect();
    model.set_weights(&trained)?;

    let samples = [
        Tensor::new(&[0.5, -1.0, 2.0, 0.0, 1.0, 1.0, -1.0, -1.0], &[2, 4]),
        Tensor::new(&[3.0, 0.25, -0.5, 1.5], &[1, 4]),
    ];
    Ok((model, samples))
}

#[test]
fn test_replace_head_keeps_backbone() -> Result<(), GraphError> {
    let (model, samples) = build_classifier(42)?;
    assert_eq!(model.count_params(), (4 * 8 + 8) + (8 * 8 + 8) + (8 * 3 + 3));

    let config = ReplicateConfig::new()
        .with_output_widths(vec![Some(5)])
        .preserved_weights_are_trainable(true)
        .seed(2026);
    let (rebuilt, report) = reconstruct_with_report(&model, &config)?;

    assert_eq!(report.reset_layers, vec!["head"]);
    assert_eq!(rebuilt.name(), "classifier");
    assert_eq!(rebuilt.count_params(), (4 * 8 + 8) + (8 * 8 + 8) + (8 * 5 + 5));
    assert_eq!(rebuilt.trainable_params(), rebuilt.count_params());

    // 主干权重逐个相同
    let original_layers = model.layers();
    let rebuilt_layers = rebuilt.layers();
    for i in 1..=2 {
        assert_eq!(original_layers[i].get_weights(), rebuilt_layers[i].get_weights());
    }

    for sample in &samples {
        let out = rebuilt.predict(std::slice::from_ref(sample))?;
        assert_eq!(out[0].shape(), &[sample.shape()[0], 5]);
    }

    // 复刻不影响原模型
    let out = model.predict(&samples[..1])?;
    assert_eq!(out[0].shape(), &[2, 3]);
    assert_eq!(model.get_layer("head")?.count_params(), 27);
    Ok(())
}

#[test]
fn test_replicate_twice_from_same_model() -> Result<(), GraphError> {
    let (model, samples) = build_classifier(7)?;
    let plain = model.replicate(&ReplicateConfig::new())?;
    let plain_again = model.replicate(&ReplicateConfig::new())?;

    let expected = model.predict(&samples[..1])?;
    assert_eq!(plain.predict(&samples[..1])?, expected);
    assert_eq!(plain_again.predict(&samples[..1])?, expected);

    // 复刻出的模型还可以再被复刻
    let nested = plain.replicate(&ReplicateConfig::new().with_output_widths(vec![Some(1)]))?;
    assert_eq!(nested.outputs()[0].shape().to_string(), "[?, 1]");
    // 四个模型共享同一个运行时，各有 6 个参数张量
    assert_eq!(model.memory().num_tensors, 24);
    Ok(())
}
