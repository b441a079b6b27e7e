/*
 * @Date         : 2026-10-15
 * @Description  : 重建引擎：激活值与按特征图分组的梯度重建
 *
 * 反卷积重建的做法：
 * 1. 一次性建好 N 个标量占位符，以及 N 个“选出第 i 张特征图，对输入求梯度”的梯度计划；
 * 2. 把 F 张特征图按每组 N 张依次处理，每组给前 c 个占位符绑定特征图编号，
 *    只对前 c 个梯度计划求值（最后一组可能不满 N 张）；
 * 3. 结果按特征图编号顺序拼接。
 * 这样无论层有多宽，图中新增的节点数都固定为 2N。
 */

use super::VisError;
use crate::nn::{FeedDict, Fetch, GradientPlan, NodeId, Session};
use crate::tensor::Tensor;
use tracing::debug;

/// 一次前向计算，返回层输出
pub fn activation(session: &mut Session, output: NodeId, feed: &FeedDict) -> Result<Tensor, VisError> {
    Ok(session.run_value(output, feed)?)
}

/// 对`output`的每张特征图（最后一维），求其关于`input`的梯度，结果与`input`同形状
pub fn deconvolve(
    session: &mut Session,
    output: NodeId,
    input: NodeId,
    feed: &FeedDict,
    batch_size: usize,
) -> Result<Vec<Tensor>, VisError> {
    if batch_size == 0 {
        return Err(VisError::InvalidInput("batch_size 必须大于0".to_string()));
    }

    let output_shape = session.graph().get_node_shape(output)?.to_vec();
    let Some(&num_maps) = output_shape.last() else {
        let name = session.graph().get_node_name(output)?.to_string();
        return Err(VisError::layer(&name, "层输出是标量，没有特征图维"));
    };

    let (selectors, plans) = build_gradient_plans(session, output, input, batch_size)?;
    debug!(
        "为{}张特征图建好{}个梯度计划，每个计划路径长{}",
        num_maps,
        plans.len(),
        plans.first().map_or(0, GradientPlan::path_len)
    );

    let mut reconstructions = Vec::with_capacity(num_maps);
    for group_start in (0..num_maps).step_by(batch_size) {
        let count = batch_size.min(num_maps - group_start);
        let mut group_feed = feed.clone();
        for (offset, &selector) in selectors.iter().take(count).enumerate() {
            group_feed.insert(selector, Tensor::scalar((group_start + offset) as f32));
        }

        let fetches: Vec<Fetch<'_>> = plans[..count].iter().map(Fetch::Gradient).collect();
        reconstructions.extend(session.run(&fetches, &group_feed)?);
    }
    Ok(reconstructions)
}

/// 预先建好 N 个特征图编号占位符及对应的梯度计划
fn build_gradient_plans(
    session: &mut Session,
    output: NodeId,
    input: NodeId,
    batch_size: usize,
) -> Result<(Vec<NodeId>, Vec<GradientPlan>), VisError> {
    let graph = session.graph_mut()?;
    let mut selectors = Vec::with_capacity(batch_size);
    let mut selected = Vec::with_capacity(batch_size);
    for _ in 0..batch_size {
        let selector = graph.new_placeholder_node(&[], None)?;
        selected.push(graph.new_feature_map_select_node(output, selector, None)?);
        selectors.push(selector);
    }

    // 重建目标不在该层上游时没有梯度可求，只跳过该层
    let plans = selected
        .iter()
        .map(|&ys| graph.build_gradient(ys, input))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| match graph.get_node_name(output) {
            Ok(name) => VisError::layer(name, e.to_string()),
            Err(lookup) => lookup.into(),
        })?;
    Ok((selectors, plans))
}
