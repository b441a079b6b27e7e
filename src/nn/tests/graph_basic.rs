/*
 * @Date         : 2026-10-15
 * @Description  : 图的基本操作：命名、枚举顺序、标识
 */

use crate::nn::{GraphError, GraphInner, OpKind, Padding};
use crate::tensor::Tensor;

/// input -> conv1 -> relu1 -> pool1 -> conv2 -> relu2
fn small_cnn() -> Result<GraphInner, GraphError> {
    let mut graph = GraphInner::with_name("small_cnn");
    let input = graph.new_placeholder_node(&[1, 8, 8, 1], Some("input"))?;
    let w1 = graph.new_const_node(&Tensor::ones(&[3, 3, 1, 4]), Some("w1"))?;
    let conv1 = graph.new_conv2d_node(input, w1, (1, 1), Padding::Same, Some("conv1"))?;
    let relu1 = graph.new_relu_node(conv1, Some("relu1"))?;
    let pool1 = graph.new_max_pool_node(relu1, (2, 2), None, Padding::Valid, Some("pool1"))?;
    let w2 = graph.new_const_node(&Tensor::ones(&[3, 3, 4, 2]), Some("w2"))?;
    let conv2 = graph.new_conv2d_node(pool1, w2, (1, 1), Padding::Same, Some("conv2"))?;
    graph.new_relu_node(conv2, Some("relu2"))?;
    Ok(graph)
}

#[test]
fn test_operations_in_creation_order() -> Result<(), GraphError> {
    let graph = small_cnn()?;
    let names: Vec<String> = graph.get_operations().into_iter().map(|op| op.name).collect();
    assert_eq!(
        names,
        ["input", "w1", "conv1", "relu1", "pool1", "w2", "conv2", "relu2"]
    );

    let relus: Vec<String> = graph
        .operations_of_kind(OpKind::Relu)
        .into_iter()
        .map(|op| op.name)
        .collect();
    assert_eq!(relus, ["relu1", "relu2"]);
    Ok(())
}

#[test]
fn test_op_info() -> Result<(), GraphError> {
    let graph = small_cnn()?;
    let conv2 = graph.get_node_by_name("conv2")?;
    let info = graph.op_info(conv2)?;

    assert_eq!(info.kind, OpKind::Conv2D);
    assert_eq!(info.output_shape, [1, 4, 4, 2]);
    assert_eq!(
        info.inputs,
        [graph.get_node_by_name("pool1")?, graph.get_node_by_name("w2")?]
    );
    Ok(())
}

#[test]
fn test_auto_names_use_type_name() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 1], None)?;
    let a = graph.new_relu_node(input, None)?;
    let b = graph.new_relu_node(input, None)?;

    assert_eq!(graph.get_node_name(input)?, "Placeholder_1");
    assert_eq!(graph.get_node_name(a)?, "Relu_1");
    assert_eq!(graph.get_node_name(b)?, "Relu_2");
    Ok(())
}

#[test]
fn test_invalid_node_names() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    graph.new_placeholder_node(&[1], Some("x"))?;

    assert!(matches!(
        graph.new_placeholder_node(&[1], Some("x")),
        Err(GraphError::DuplicateNodeName(_))
    ));
    // 冒号保留给`name:0`
    assert!(matches!(
        graph.new_placeholder_node(&[1], Some("x:0")),
        Err(GraphError::InvalidOperation(_))
    ));
    assert!(matches!(
        graph.get_node_by_name("missing"),
        Err(GraphError::NodeNameNotFound(_))
    ));
    Ok(())
}

#[test]
fn test_has_variables() -> Result<(), GraphError> {
    let mut graph = small_cnn()?;
    assert!(!graph.has_variables());
    graph.new_variable_node(&Tensor::zeros(&[1]), Some("v"))?;
    assert!(graph.has_variables());
    Ok(())
}

#[test]
fn test_clone_gets_new_identity() -> Result<(), GraphError> {
    let graph = small_cnn()?;
    let copy = graph.clone();
    assert_ne!(graph.id(), copy.id());
    assert_eq!(graph.nodes_count(), copy.nodes_count());
    assert_eq!(copy.name(), "small_cnn");
    Ok(())
}
