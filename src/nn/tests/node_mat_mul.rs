/*
 * @Date         : 2026-10-15
 * @Description  : MatMul / Reshape 节点测试（全连接头：卷积输出 -> 展平 -> 矩阵乘）
 */

use super::feed_of;
use crate::nn::{Fetch, GraphError, GraphInner, Session};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_mat_mul_forward_and_grad() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let a = graph.new_const_node(&Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]), Some("a"))?;
    let b = graph.new_placeholder_node(&[3, 2], Some("b"))?;
    let product = graph.new_mat_mul_node(a, b, Some("product"))?;
    assert_eq!(graph.get_node_shape(product)?, &[2, 2]);
    let grad_b = graph.build_gradient(product, b)?;

    let b_value = Tensor::new(&[1.0, 0.0, 0.0, 1.0, 1.0, 1.0], &[3, 2]);
    let mut session = Session::new(graph);
    let results = session.run(
        &[Fetch::Value(product), Fetch::Gradient(&grad_b)],
        &feed_of(b, b_value),
    )?;

    assert_abs_diff_eq!(results[0], Tensor::new(&[4.0, 5.0, 10.0, 11.0], &[2, 2]), epsilon = 1e-6);
    // dB = Aᵀ · 1
    let expected = Tensor::new(&[5.0, 5.0, 7.0, 7.0, 9.0, 9.0], &[3, 2]);
    assert_abs_diff_eq!(results[1], expected, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_mat_mul_shape_mismatch() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let a = graph.new_placeholder_node(&[2, 3], Some("a"))?;
    let b = graph.new_placeholder_node(&[2, 3], Some("b"))?;
    assert!(matches!(
        graph.new_mat_mul_node(a, b, None),
        Err(GraphError::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_reshape_then_dense_grad() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 1], Some("input"))?;
    let flat = graph.new_reshape_node(input, &[1, 4], Some("flat"))?;
    let weights = graph.new_const_node(&Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[4, 1]), Some("w"))?;
    let dense = graph.new_mat_mul_node(flat, weights, Some("dense"))?;
    let plan = graph.build_gradient(dense, input)?;

    let mut session = Session::new(graph);
    let results = session.run(
        &[Fetch::Value(dense), Fetch::Gradient(&plan)],
        &feed_of(input, Tensor::ones(&[1, 2, 2, 1])),
    )?;

    assert_abs_diff_eq!(results[0], Tensor::new(&[10.0], &[1, 1]), epsilon = 1e-6);
    // 梯度回到输入时恢复原形状
    let expected = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[1, 2, 2, 1]);
    assert_abs_diff_eq!(results[1], expected, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_reshape_size_mismatch() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 1], Some("input"))?;
    assert!(matches!(
        graph.new_reshape_node(input, &[1, 5], None),
        Err(GraphError::ShapeMismatch { .. })
    ));
    Ok(())
}
