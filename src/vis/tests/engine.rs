/*
 * 用 1x1 卷积构造已知答案：第 f 张特征图 = (f+1) * x，
 * 所以第 f 张特征图之和对 x 的梯度恰为 (f+1) * ones。
 */

use crate::nn::{FeedDict, GraphError, GraphInner, NodeId, Padding, Session};
use crate::tensor::Tensor;
use crate::vis::{VisError, activation, deconvolve};
use approx::assert_abs_diff_eq;

fn scaled_maps(num_maps: usize) -> Result<(Session, NodeId, NodeId, FeedDict), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 1], Some("input"))?;
    let weights: Vec<f32> = (1..=num_maps).map(|f| f as f32).collect();
    let w = graph.new_const_node(&Tensor::new(&weights, &[1, 1, 1, num_maps]), Some("w"))?;
    let conv = graph.new_conv2d_node(input, w, (1, 1), Padding::Valid, Some("conv"))?;

    let mut feed = FeedDict::new();
    feed.insert(input, Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[1, 2, 2, 1]));
    Ok((Session::new(graph), input, conv, feed))
}

#[test]
fn test_activation() -> Result<(), VisError> {
    let (mut session, _, conv, feed) = scaled_maps(2)?;
    let value = activation(&mut session, conv, &feed)?;

    assert_eq!(value.shape(), &[1, 2, 2, 2]);
    assert_abs_diff_eq!(value[[0, 1, 1, 0]], 4.0);
    assert_abs_diff_eq!(value[[0, 1, 1, 1]], 8.0);
    Ok(())
}

#[test]
fn test_deconvolve_uneven_groups() -> Result<(), VisError> {
    // 5 张特征图，每组 2 张：2 + 2 + 1
    let (mut session, input, conv, feed) = scaled_maps(5)?;
    let nodes_before = session.graph().nodes_count();
    let reconstructions = deconvolve(&mut session, conv, input, &feed, 2)?;

    assert_eq!(reconstructions.len(), 5);
    for (f, reconstruction) in reconstructions.iter().enumerate() {
        let expected = Tensor::new(&[(f + 1) as f32; 4], &[1, 2, 2, 1]);
        assert_abs_diff_eq!(*reconstruction, expected, epsilon = 1e-6);
    }
    // 只新增 2N 个节点，与特征图数无关
    assert_eq!(session.graph().nodes_count(), nodes_before + 4);
    Ok(())
}

#[test]
fn test_deconvolve_batch_larger_than_maps() -> Result<(), VisError> {
    let (mut session, input, conv, feed) = scaled_maps(3)?;
    let reconstructions = deconvolve(&mut session, conv, input, &feed, 8)?;
    assert_eq!(reconstructions.len(), 3);
    assert_abs_diff_eq!(reconstructions[2][[0, 0, 0, 0]], 3.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_deconvolve_rejects_zero_batch() -> Result<(), GraphError> {
    let (mut session, input, conv, feed) = scaled_maps(3)?;
    let result = deconvolve(&mut session, conv, input, &feed, 0);
    assert!(matches!(result, Err(VisError::InvalidInput(_))));
    Ok(())
}

#[test]
fn test_deconvolve_unrelated_input_is_soft() -> Result<(), GraphError> {
    let (mut session, _, conv, feed) = scaled_maps(3)?;
    let other = session.graph_mut()?.new_placeholder_node(&[1, 2, 2, 1], Some("other"))?;

    let err = deconvolve(&mut session, conv, other, &feed, 2).unwrap_err();
    assert!(err.is_soft());
    Ok(())
}

#[test]
fn test_deconvolve_on_closed_session() -> Result<(), GraphError> {
    let (mut session, input, conv, feed) = scaled_maps(3)?;
    session.close();
    let result = deconvolve(&mut session, conv, input, &feed, 2);
    assert!(matches!(result, Err(VisError::Graph(GraphError::SessionClosed))));
    Ok(())
}
