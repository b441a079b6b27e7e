/*
 * @Date         : 2026-10-15
 * @Description  : 会话：把一张图绑定到执行上，负责喂值、取值与求梯度
 *
 * 会话独占其图。喂值只在一次`run`内有效，运行结束（无论成败）都会清空占位符。
 * 会话可显式关闭，drop 时也会自动关闭；关闭后再运行会报错。
 */

use super::{GradientPlan, GraphError, GraphId, GraphInner, NodeId};
use crate::tensor::Tensor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 喂值：占位符 -> 值
pub type FeedDict = HashMap<NodeId, Tensor>;

/// 一次运行要取回的结果
#[derive(Debug, Clone, Copy)]
pub enum Fetch<'a> {
    /// 节点的前向值
    Value(NodeId),
    /// 预先构建的梯度计划的值
    Gradient(&'a GradientPlan),
}

impl Fetch<'_> {
    /// 求该结果需要先前向计算的节点
    const fn target(&self) -> NodeId {
        match self {
            Self::Value(id) => *id,
            Self::Gradient(plan) => plan.ys(),
        }
    }
}

pub struct Session {
    graph: GraphInner,
    closed: bool,
}

impl Session {
    pub fn new(graph: GraphInner) -> Self {
        tracing::debug!("会话已创建，绑定{}", graph.id());
        Self {
            graph,
            closed: false,
        }
    }

    pub const fn graph(&self) -> &GraphInner {
        &self.graph
    }

    /// 修改图（如添加节点）；会话关闭后不可用
    pub fn graph_mut(&mut self) -> Result<&mut GraphInner, GraphError> {
        self.ensure_open()?;
        Ok(&mut self.graph)
    }

    pub const fn graph_id(&self) -> GraphId {
        self.graph.id()
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), GraphError> {
        if self.closed {
            return Err(GraphError::SessionClosed);
        }
        Ok(())
    }

    pub fn initialize_variables(&mut self) -> Result<(), GraphError> {
        self.ensure_open()?;
        self.graph.initialize_variables()
    }

    /// 运行一次：喂值 -> 一次前向传播 -> 依次取回各结果
    pub fn run(&mut self, fetches: &[Fetch<'_>], feed: &FeedDict) -> Result<Vec<Tensor>, GraphError> {
        self.ensure_open()?;
        let result = self.run_inner(fetches, feed);
        self.graph.clear_placeholders();
        result
    }

    fn run_inner(&mut self, fetches: &[Fetch<'_>], feed: &FeedDict) -> Result<Vec<Tensor>, GraphError> {
        for (&id, value) in feed {
            let kind = self.graph.get_node_kind(id)?;
            if kind != super::OpKind::Placeholder {
                return Err(GraphError::InvalidOperation(format!(
                    "只能给占位符喂值，{}是{kind}节点",
                    self.graph.get_node(id)?
                )));
            }
            self.graph.set_node_value(id, Some(value))?;
        }

        let targets: Vec<NodeId> = fetches.iter().map(Fetch::target).collect();
        self.graph.forward_many(&targets)?;

        fetches
            .iter()
            .map(|fetch| match fetch {
                Fetch::Value(id) => self.graph.get_node_value(*id)?.cloned().ok_or_else(|| {
                    GraphError::ComputationError(format!("节点{id}在前向传播后仍没有值"))
                }),
                Fetch::Gradient(plan) => self.graph.evaluate_gradient(plan),
            })
            .collect()
    }

    /// 便捷方法：只取一个节点的值
    pub fn run_value(&mut self, node: NodeId, feed: &FeedDict) -> Result<Tensor, GraphError> {
        self.run(&[Fetch::Value(node)], feed)?
            .pop()
            .ok_or_else(|| GraphError::ComputationError("运行结果为空".to_string()))
    }

    /// 保存检查点（图结构 + 当前的常量/变量值），返回元图路径
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<PathBuf, GraphError> {
        self.ensure_open()?;
        self.graph.save_checkpoint(prefix)
    }

    /// 从检查点前缀恢复常量/变量的值
    pub fn restore(&mut self, prefix: impl AsRef<Path>) -> Result<(), GraphError> {
        self.ensure_open()?;
        self.graph.restore(prefix)
    }

    /// 关闭会话，释放运行期的中间结果。重复关闭无副作用
    pub fn close(&mut self) {
        if !self.closed {
            self.graph.clear_placeholders();
            self.closed = true;
            tracing::debug!("会话已关闭，绑定{}", self.graph.id());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
