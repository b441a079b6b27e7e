use super::tiny_cnn;
use crate::nn::{GraphError, OpKind, Padding};
use crate::vis::{LayerKind, LayerRequest, parse_layer_list, resolve};

#[test]
fn test_layer_kind_codes() {
    assert_eq!(LayerKind::from_code("r"), Some(LayerKind::Activation));
    assert_eq!(LayerKind::from_code("P"), Some(LayerKind::Pooling));
    assert_eq!(LayerKind::from_code("c"), Some(LayerKind::Convolution));
    assert_eq!(LayerKind::from_code("conv"), None);
    assert_eq!(LayerKind::Pooling.op_kind(), OpKind::MaxPool);
    assert_eq!(LayerKind::Convolution.code(), 'c');
}

#[test]
fn test_request_conversions() {
    assert_eq!(LayerRequest::default(), LayerRequest::Kind(LayerKind::Activation));
    assert_eq!(LayerRequest::from("R"), LayerRequest::Kind(LayerKind::Activation));
    assert_eq!(LayerRequest::from("conv1"), LayerRequest::Name("conv1".to_string()));
    assert_eq!(LayerRequest::from(None::<&str>), LayerRequest::Skip);
    assert_eq!(LayerRequest::from(Some("p")), LayerRequest::Kind(LayerKind::Pooling));
}

#[test]
fn test_parse_layer_list() {
    let requests = parse_layer_list("r, conv1,,P");
    assert_eq!(
        requests,
        [
            LayerRequest::Kind(LayerKind::Activation),
            LayerRequest::Name("conv1".to_string()),
            LayerRequest::Skip,
            LayerRequest::Kind(LayerKind::Pooling),
        ]
    );
}

#[test]
fn test_resolve_expands_kinds_in_graph_order() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    let resolution = resolve(
        &graph,
        &[
            LayerRequest::Kind(LayerKind::Activation),
            LayerRequest::Name("pool1".to_string()),
            LayerRequest::Kind(LayerKind::Convolution),
        ],
    );
    assert_eq!(resolution.targets, ["relu1", "relu2", "pool1", "conv1", "conv2"]);
    assert!(resolution.skipped.is_empty());
    Ok(())
}

#[test]
fn test_resolve_records_skipped_requests() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    let resolution = resolve(
        &graph,
        &[LayerRequest::Skip, LayerRequest::Name("no_such_layer".to_string())],
    );
    // 名字原样通过，由解析阶段决定是否跳过
    assert_eq!(resolution.targets, ["no_such_layer"]);
    assert_eq!(resolution.skipped.len(), 1);
    assert_eq!(resolution.skipped[0].request, "None");
    Ok(())
}

#[test]
fn test_type_code_wins_over_node_name() -> Result<(), GraphError> {
    let mut graph = tiny_cnn()?;
    // 一个恰好名为`p`的池化节点
    let relu2 = graph.get_node_by_name("relu2")?;
    graph.new_max_pool_node(relu2, (2, 2), None, Padding::Valid, Some("p"))?;

    let resolution = resolve(&graph, &parse_layer_list("p"));
    assert_eq!(resolution.targets, ["pool1", "p"]);
    Ok(())
}

#[test]
fn test_kind_without_matches_resolves_to_nothing() -> Result<(), GraphError> {
    let mut graph = crate::nn::GraphInner::new();
    graph.new_placeholder_node(&[1, 2, 2, 1], Some("input"))?;
    let resolution = resolve(&graph, &[LayerRequest::Kind(LayerKind::Convolution)]);
    assert!(resolution.targets.is_empty());
    assert!(resolution.skipped.is_empty());
    Ok(())
}
