/*
 * @Date         : 2026-10-15
 * @Description  : 计算图节点：节点句柄、节点类型（OpKind）以及各具体节点的实现
 */

mod node_handle;
mod op_kind;
pub(in crate::nn) mod raw_node;

pub(crate) use node_handle::NodeHandle;
pub use op_kind::OpKind;
pub use raw_node::{LrnParams, Padding};
pub(in crate::nn) use raw_node::{GradientContext, NodeType, TraitNode, relu_grad};

/// 节点在图中的唯一标识。节点创建时按递增顺序分配，
/// 所以按`NodeId`排序即是图的原生遍历顺序（父节点总先于子节点）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
