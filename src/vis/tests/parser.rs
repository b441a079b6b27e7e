use super::{input_feed, tiny_cnn};
use crate::nn::{GraphError, OpKind};
use crate::tensor::Tensor;
use crate::vis::{ValueFeed, VisError, parse, rebind};

#[test]
fn test_rebind_accepts_first_output_suffix() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    let conv1 = graph.get_node_by_name("conv1")?;
    assert_eq!(rebind(&graph, "conv1").ok(), Some(conv1));
    assert_eq!(rebind(&graph, "conv1:0").ok(), Some(conv1));
    Ok(())
}

#[test]
fn test_rebind_failures_are_soft() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    for name in ["conv1:1", "missing", "missing:0"] {
        let err = rebind(&graph, name).unwrap_err();
        assert!(err.is_soft(), "{name}: {err}");
    }
    Ok(())
}

#[test]
fn test_parse_layer() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    let parsed = parse(&graph, "relu1:0", &input_feed()).unwrap();

    assert_eq!(parsed.op.name, "relu1");
    assert_eq!(parsed.op.kind, OpKind::Relu);
    assert_eq!(parsed.output, graph.get_node_by_name("relu1")?);
    assert_eq!(parsed.default_input, Some(graph.get_node_by_name("conv1")?));
    assert!(parsed.feed.contains_key(&graph.get_node_by_name("input")?));
    Ok(())
}

#[test]
fn test_parse_with_unknown_feed_name() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    let mut feed = input_feed();
    feed.insert("ghost".to_string(), Tensor::zeros(&[1]));

    let err = parse(&graph, "conv1", &feed).unwrap_err();
    assert!(matches!(err, VisError::LayerResolution { ref layer, .. } if layer == "conv1"));
    Ok(())
}

#[test]
fn test_resolve_input() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    let parsed = parse(&graph, "conv2", &ValueFeed::new()).unwrap();

    assert_eq!(parsed.resolve_input(&graph, None).ok(), Some(graph.get_node_by_name("pool1")?));
    assert_eq!(
        parsed.resolve_input(&graph, Some("input:0")).ok(),
        Some(graph.get_node_by_name("input")?)
    );
    assert!(parsed.resolve_input(&graph, Some("nope")).unwrap_err().is_soft());

    // 占位符没有输入，必须显式指定
    let source = parse(&graph, "input", &ValueFeed::new()).unwrap();
    assert!(source.resolve_input(&graph, None).unwrap_err().is_soft());
    Ok(())
}

#[test]
fn test_parse_with_non_placeholder_feed() -> Result<(), GraphError> {
    let graph = tiny_cnn()?;
    let mut feed = input_feed();
    feed.insert("conv1:0".to_string(), Tensor::zeros(&[1, 4, 4, 3]));

    let err = parse(&graph, "relu2", &feed).unwrap_err();
    assert!(err.is_soft());
    assert!(matches!(err, VisError::LayerResolution { ref layer, .. } if layer == "relu2"));
    Ok(())
}
