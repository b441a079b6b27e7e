/*
 * @Date         : 2026-10-15
 * @Description  : GraphInner 计算图的底层实现
 *
 * 各 impl 块分散在子模块中：
 * - core.rs: 基础操作 + forward
 * - backward.rs: 梯度计划的构建与求值（VJP）
 * - node_builders.rs: new_*_node
 * - gradient_override.rs: 梯度覆盖映射的作用域
 * - describe.rs: 图 <-> 描述符
 * - checkpoint.rs: 检查点保存/导入/恢复
 */

mod backward;
mod checkpoint;
mod core;
mod describe;
mod gradient_override;
mod node_builders;

pub use backward::GradientPlan;
pub use checkpoint::{latest_checkpoint, prefix_of_meta};
pub use core::OpInfo;

use crate::nn::GradientOverrideMap;
use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// 进程内唯一的图标识。克隆出的图也会拿到新的标识，
/// 用来确认“当前会话里的图”确实是要可视化的那张图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u64);

impl GraphId {
    fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph#{}", self.0)
    }
}

/// 图的完整定义（核心实现）
pub struct GraphInner {
    pub(in crate::nn::graph) id: GraphId,
    pub(in crate::nn::graph) name: String,
    pub(in crate::nn::graph) nodes: HashMap<NodeId, NodeHandle>,
    /// 名称索引：name -> id
    pub(in crate::nn::graph) name_index: HashMap<String, NodeId>,
    /// 正向边：parent_id -> child_ids（父节点指向子节点）
    pub(in crate::nn::graph) forward_edges: HashMap<NodeId, Vec<NodeId>>,
    /// 反向边：child_id -> parent_ids（子节点指向父节点，顺序即参数位置）
    pub(in crate::nn::graph) backward_edges: HashMap<NodeId, Vec<NodeId>>,
    /// 最后一次前向传播的 id
    pub(in crate::nn::graph) last_forward_pass_id: u64,
    pub(in crate::nn::graph) next_id: u64,
    /// 当前生效的梯度覆盖映射（仅在 `with_gradient_override_map` 作用域内为 Some）
    pub(in crate::nn::graph) gradient_override_map: Option<GradientOverrideMap>,
}

impl Default for GraphInner {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for GraphInner {
    fn clone(&self) -> Self {
        Self {
            id: GraphId::next(),
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            name_index: self.name_index.clone(),
            forward_edges: self.forward_edges.clone(),
            backward_edges: self.backward_edges.clone(),
            last_forward_pass_id: self.last_forward_pass_id,
            next_id: self.next_id,
            gradient_override_map: None,
        }
    }
}

impl fmt::Debug for GraphInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphInner")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("nodes_count", &self.nodes.len())
            .finish()
    }
}
