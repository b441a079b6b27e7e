/*
 * @Date         : 2026-10-15
 * @Description  : FeatureMapSelect 节点测试
 */

use crate::nn::{FeedDict, Fetch, GraphError, GraphInner, NodeId, Session};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

/// 输入 [1, 2, 2, 3]，第 c 个通道上的值都是 c+1 的倍数
fn select_graph() -> Result<(Session, NodeId, NodeId, NodeId), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 3], Some("input"))?;
    let index = graph.new_placeholder_node(&[], Some("index"))?;
    let select = graph.new_feature_map_select_node(input, index, Some("select"))?;
    Ok((Session::new(graph), input, index, select))
}

fn feed(input: NodeId, index: NodeId, i: f32) -> FeedDict {
    let mut data = Vec::new();
    for pixel in 0..4 {
        for c in 0..3 {
            data.push((c + 1) as f32 * (pixel + 1) as f32);
        }
    }
    let mut feed = FeedDict::new();
    feed.insert(input, Tensor::new(&data, &[1, 2, 2, 3]));
    feed.insert(index, Tensor::scalar(i));
    feed
}

#[test]
fn test_select_shape_drops_last_axis() -> Result<(), GraphError> {
    let (session, _, _, select) = select_graph()?;
    assert_eq!(session.graph().get_node_shape(select)?, &[1, 2, 2]);
    Ok(())
}

#[test]
fn test_select_requires_scalar_index() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 3], Some("input"))?;
    let index = graph.new_placeholder_node(&[2], Some("index"))?;
    let result = graph.new_feature_map_select_node(input, index, None);
    assert!(matches!(result, Err(GraphError::ShapeMismatch { .. })));
    Ok(())
}

#[test]
fn test_select_forward() -> Result<(), GraphError> {
    let (mut session, input, index, select) = select_graph()?;
    let output = session.run_value(select, &feed(input, index, 1.0))?;

    let expected = Tensor::new(&[2.0, 4.0, 6.0, 8.0], &[1, 2, 2]);
    assert_abs_diff_eq!(output, expected, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_select_grad_scatters_to_selected_map() -> Result<(), GraphError> {
    let (mut session, input, index, select) = select_graph()?;
    let plan = session.graph().build_gradient(select, input)?;
    let grads = session.run(&[Fetch::Gradient(&plan)], &feed(input, index, 2.0))?;

    let grad = &grads[0];
    assert_eq!(grad.shape(), &[1, 2, 2, 3]);
    for h in 0..2 {
        for w in 0..2 {
            assert_abs_diff_eq!(grad[[0, h, w, 0]], 0.0);
            assert_abs_diff_eq!(grad[[0, h, w, 1]], 0.0);
            assert_abs_diff_eq!(grad[[0, h, w, 2]], 1.0);
        }
    }
    Ok(())
}

#[test]
fn test_select_index_out_of_range() -> Result<(), GraphError> {
    let (mut session, input, index, select) = select_graph()?;
    let result = session.run_value(select, &feed(input, index, 3.0));
    assert!(matches!(result, Err(GraphError::ComputationError(_))));

    let result = session.run_value(select, &feed(input, index, 0.5));
    assert!(matches!(result, Err(GraphError::ComputationError(_))));
    Ok(())
}
