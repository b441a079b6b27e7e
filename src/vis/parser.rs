/*
 * @Date         : 2026-10-15
 * @Description  : 张量/喂值解析
 *
 * 图是从检查点重新导入的副本，调用方手里的节点句柄在这里都已失效，
 * 所以一切都按名字重新绑定：`name`或`name:0`（节点的第一个输出）。
 */

use super::VisError;
use crate::nn::{FeedDict, GraphId, GraphInner, NodeId, OpInfo, OpKind, Session};
use crate::tensor::Tensor;
use std::collections::HashMap;

/// 调用方提供的喂值：节点（或张量）名 -> 值
pub type ValueFeed = HashMap<String, Tensor>;

/// 一个层解析后得到的可运行单元
#[derive(Debug, Clone)]
pub struct ParsedLayer {
    /// 解析时所在的图，之后的计算必须在同一张图上进行
    pub graph_id: GraphId,
    pub op: OpInfo,
    /// 要读取或求导的输出
    pub output: NodeId,
    /// 默认的重建目标：该层的第一个输入（没有输入时为 None）
    pub default_input: Option<NodeId>,
    pub feed: FeedDict,
}

/// 按名字在当前图中重新绑定节点。接受`name`或`name:0`
pub fn rebind(graph: &GraphInner, name: &str) -> Result<NodeId, VisError> {
    let op_name = match name.rsplit_once(':') {
        Some((op_name, "0")) => op_name,
        Some((_, index)) if index.parse::<usize>().is_ok() => {
            return Err(VisError::layer(
                name,
                format!("节点只有一个输出，不存在第{index}个输出"),
            ));
        }
        _ => name,
    };
    graph
        .find_node(op_name)
        .ok_or_else(|| VisError::layer(name, "重新加载后的图中找不到该名字"))
}

/// 解析一个层：定位节点、确定默认输入、把喂值重新绑定到当前图
pub fn parse(graph: &GraphInner, layer_name: &str, value_feed: &ValueFeed) -> Result<ParsedLayer, VisError> {
    let output = rebind(graph, layer_name)?;
    let op = graph.op_info(output)?;
    let default_input = op.inputs.first().copied();

    let mut feed = FeedDict::with_capacity(value_feed.len());
    for (name, value) in value_feed {
        let id = rebind(graph, name).map_err(|_| {
            VisError::layer(layer_name, format!("喂值中的`{name}`在重新加载后的图中找不到"))
        })?;
        let kind = graph.get_node_kind(id)?;
        if kind != OpKind::Placeholder {
            return Err(VisError::layer(
                layer_name,
                format!("喂值中的`{name}`是{kind}节点，只能给占位符喂值"),
            ));
        }
        feed.insert(id, value.clone());
    }

    Ok(ParsedLayer {
        graph_id: graph.id(),
        op,
        output,
        default_input,
        feed,
    })
}

impl ParsedLayer {
    /// 确认会话持有的正是解析时的那张图
    pub fn ensure_bound_to(&self, session: &Session) -> Result<(), VisError> {
        let actual = session.graph_id();
        if actual == self.graph_id {
            Ok(())
        } else {
            Err(VisError::GraphMismatch {
                expected: self.graph_id,
                actual,
            })
        }
    }

    /// 确定重建目标：显式指定的张量名优先，否则用该层的第一个输入
    pub fn resolve_input(&self, graph: &GraphInner, input_tensor: Option<&str>) -> Result<NodeId, VisError> {
        match input_tensor {
            Some(name) => rebind(graph, name),
            None => self.default_input.ok_or_else(|| {
                VisError::layer(&self.op.name, "该层没有输入，请显式指定重建目标张量")
            }),
        }
    }
}
