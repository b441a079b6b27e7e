/*
 * @Date         : 2026-10-15
 * @Description  : 计算图执行引擎：冻结 CNN 的前向计算、梯度计划与检查点
 */

mod descriptor;
mod gradient_registry;
mod graph;
mod nodes;
mod session;

pub use descriptor::{GraphDescriptor, NodeDescriptor, NodeTypeDescriptor};
pub use gradient_registry::{
    GradientOverride, GradientOverrideMap, is_registered, register_custom_gradients,
    registered_count,
};
pub use graph::{
    GradientPlan, GraphError, GraphId, GraphInner, OpInfo, latest_checkpoint, prefix_of_meta,
};
pub use nodes::{LrnParams, NodeId, OpKind, Padding};
pub use session::{FeedDict, Fetch, Session};

#[cfg(test)]
mod tests;
