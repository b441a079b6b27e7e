/*
 * @Date         : 2026-10-15
 * @Description  : Graph 模块：计算图的核心实现
 *
 * 公开 API：
 * - `GraphInner`: 计算图本体（节点、边、前向/反向传播、检查点）
 * - `GraphId`: 进程内唯一的图标识
 * - `GradientPlan`: 预先构建、可多次求值的梯度计算
 * - `GraphError`: 错误类型
 */

mod error;
mod inner;

pub use error::GraphError;
pub use inner::{GradientPlan, GraphId, GraphInner, OpInfo, latest_checkpoint, prefix_of_meta};
