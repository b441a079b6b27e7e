/*
 * @Date         : 2026-10-15
 * @Description  : Graph 模块的错误类型
 */

use crate::nn::{GradientOverride, NodeId};
use thiserror::Error;

/// Graph 操作错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("节点{0}不存在")]
    NodeNotFound(NodeId),
    #[error("名为`{0}`的节点不存在")]
    NodeNameNotFound(String),
    #[error("无效操作：{0}")]
    InvalidOperation(String),
    #[error("形状不匹配：期望{expected:?}，得到{got:?}。{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("计算错误：{0}")]
    ComputationError(String),
    #[error("节点名重复：{0}")]
    DuplicateNodeName(String),
    #[error("梯度覆盖规则`{0}`尚未注册，请先调用 register_custom_gradients")]
    GradientNotRegistered(GradientOverride),
    #[error("会话已关闭")]
    SessionClosed,
    #[error("检查点错误：{0}")]
    Checkpoint(String),
}
