/*
 * @Date         : 2026-10-15
 * @Description  : LRN 节点测试
 *
 * 取 r=1, bias=1, alpha=1, beta=0.5，输入通道为 [1, 2]：
 *   s_0 = s_1 = 1 + (1 + 4) = 6
 *   y = [1/√6, 2/√6]
 *   dx_0 = 6^-0.5 - (1*6^-1.5 + 2*6^-1.5) = 0.5 * 6^-0.5
 *   dx_1 = 6^-0.5 - 2*(1*6^-1.5 + 2*6^-1.5) = 0
 */

use super::feed_of;
use crate::nn::{
    Fetch, GradientOverrideMap, GraphError, GraphInner, LrnParams, NodeId, Session,
    register_custom_gradients,
};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

const PARAMS: LrnParams = LrnParams {
    depth_radius: 1,
    bias: 1.0,
    alpha: 1.0,
    beta: 0.5,
};

fn lrn_graph(map: Option<&GradientOverrideMap>) -> Result<(GraphInner, NodeId, NodeId), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 1, 1, 2], Some("input"))?;
    let lrn = match map {
        Some(map) => graph.with_gradient_override_map(map, |g| g.new_lrn_node(input, PARAMS, Some("norm")))?,
        None => graph.new_lrn_node(input, PARAMS, Some("norm"))?,
    };
    Ok((graph, input, lrn))
}

fn input_value() -> Tensor {
    Tensor::new(&[1.0, 2.0], &[1, 1, 1, 2])
}

#[test]
fn test_lrn_default_params() {
    let params = LrnParams::default();
    assert_eq!(params.depth_radius, 5);
    assert_abs_diff_eq!(params.beta, 0.5);
}

#[test]
fn test_lrn_forward() -> Result<(), GraphError> {
    let (graph, input, lrn) = lrn_graph(None)?;
    let mut session = Session::new(graph);
    let output = session.run_value(lrn, &feed_of(input, input_value()))?;

    let inv_sqrt6 = 1.0 / 6.0f32.sqrt();
    let expected = Tensor::new(&[inv_sqrt6, 2.0 * inv_sqrt6], &[1, 1, 1, 2]);
    assert_abs_diff_eq!(output, expected, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_lrn_native_grad() -> Result<(), GraphError> {
    let (graph, input, lrn) = lrn_graph(None)?;
    let plan = graph.build_gradient(lrn, input)?;
    let mut session = Session::new(graph);
    let grads = session.run(&[Fetch::Gradient(&plan)], &feed_of(input, input_value()))?;

    let expected = Tensor::new(&[0.5 / 6.0f32.sqrt(), 0.0], &[1, 1, 1, 2]);
    assert_abs_diff_eq!(grads[0], expected, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_lrn_pass_through_grad() -> Result<(), GraphError> {
    register_custom_gradients();
    let (graph, input, lrn) = lrn_graph(Some(&GradientOverrideMap::deconv_default()))?;
    let plan = graph.build_gradient(lrn, input)?;
    let mut session = Session::new(graph);
    let grads = session.run(&[Fetch::Gradient(&plan)], &feed_of(input, input_value()))?;

    // 覆盖后梯度直接透传
    assert_abs_diff_eq!(grads[0], Tensor::ones(&[1, 1, 1, 2]), epsilon = 1e-6);
    Ok(())
}
