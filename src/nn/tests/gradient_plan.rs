/*
 * @Date         : 2026-10-15
 * @Description  : 梯度计划的构建与求值
 */

use super::feed_of;
use crate::nn::{Fetch, GraphError, GraphInner, Padding, Session};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_build_gradient_requires_upstream_xs() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let a = graph.new_placeholder_node(&[1, 2, 2, 1], Some("a"))?;
    let b = graph.new_placeholder_node(&[1, 2, 2, 1], Some("b"))?;
    let relu = graph.new_relu_node(a, Some("relu"))?;

    assert!(matches!(
        graph.build_gradient(relu, b),
        Err(GraphError::InvalidOperation(_))
    ));
    // 反方向同样不成立
    assert!(graph.build_gradient(a, relu).is_err());
    Ok(())
}

#[test]
fn test_plan_path_only_covers_relevant_nodes() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 4, 4, 1], Some("input"))?;
    let filter = graph.new_const_node(&Tensor::ones(&[2, 2, 1, 1]), Some("w"))?;
    let conv = graph.new_conv2d_node(input, filter, (1, 1), Padding::Valid, Some("conv"))?;
    let relu = graph.new_relu_node(conv, Some("relu"))?;
    // 与路径无关的分支
    let _side = graph.new_relu_node(input, Some("side"))?;

    let plan = graph.build_gradient(relu, input)?;
    assert_eq!(plan.ys(), relu);
    assert_eq!(plan.xs(), input);
    assert_eq!(plan.graph_id(), graph.id());
    // input -> conv -> relu，常量 w 与 side 都不在路径上
    assert_eq!(plan.path_len(), 3);
    Ok(())
}

#[test]
fn test_gradient_accumulates_over_multiple_paths() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let x = graph.new_placeholder_node(&[2, 2], Some("x"))?;
    let doubled = graph.new_add_node(x, x, Some("doubled"))?;
    let plan = graph.build_gradient(doubled, x)?;

    let mut session = Session::new(graph);
    let grads = session.run(&[Fetch::Gradient(&plan)], &feed_of(x, Tensor::ones(&[2, 2])))?;

    assert_abs_diff_eq!(grads[0], Tensor::new(&[2.0; 4], &[2, 2]), epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_plan_is_reusable_across_runs() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let x = graph.new_placeholder_node(&[1, 1, 1, 2], Some("x"))?;
    let relu = graph.new_relu_node(x, Some("relu"))?;
    let plan = graph.build_gradient(relu, x)?;

    let mut session = Session::new(graph);
    let first = session.run(
        &[Fetch::Gradient(&plan)],
        &feed_of(x, Tensor::new(&[1.0, -1.0], &[1, 1, 1, 2])),
    )?;
    let second = session.run(
        &[Fetch::Gradient(&plan)],
        &feed_of(x, Tensor::new(&[-1.0, 1.0], &[1, 1, 1, 2])),
    )?;

    assert_abs_diff_eq!(first[0], Tensor::new(&[1.0, 0.0], &[1, 1, 1, 2]), epsilon = 1e-6);
    assert_abs_diff_eq!(second[0], Tensor::new(&[0.0, 1.0], &[1, 1, 1, 2]), epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_plan_from_another_graph_is_rejected() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let x = graph.new_placeholder_node(&[1, 1, 1, 2], Some("x"))?;
    let relu = graph.new_relu_node(x, Some("relu"))?;
    let plan = graph.build_gradient(relu, x)?;

    // 克隆出的图有新的标识，节点 id 虽然相同也不能混用
    let copy = graph.clone();
    assert_ne!(copy.id(), graph.id());
    let mut session = Session::new(copy);
    let result = session.run(&[Fetch::Gradient(&plan)], &feed_of(x, Tensor::ones(&[1, 1, 1, 2])));
    assert!(matches!(result, Err(GraphError::InvalidOperation(_))));
    Ok(())
}
