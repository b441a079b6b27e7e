/*
 * @Date         : 2026-10-15
 * @Description  : 可视化层的错误类型
 */

use crate::nn::{GraphError, GraphId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisError {
    /// 模型来源类型无法识别，或需要冻结图时给了含变量的图。整个调用失败
    #[error("无效输入：{0}")]
    InvalidInput(String),

    /// 检查点缺失或损坏，重新加载失败
    #[error("恢复检查点失败：{0}")]
    Restore(String),

    /// 层名/层类型找不到，或解析不到所需张量。只跳过该层
    #[error("无法解析层`{layer}`：{reason}")]
    LayerResolution { layer: String, reason: String },

    /// 当前会话的图不是要可视化的那张图
    #[error("会话中的图{actual}与要可视化的图{expected}不一致")]
    GraphMismatch { expected: GraphId, actual: GraphId },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("npy 文件读写失败：{0}")]
    Npy(String),
}

impl VisError {
    pub(crate) fn layer(layer: &str, reason: impl Into<String>) -> Self {
        Self::LayerResolution {
            layer: layer.to_string(),
            reason: reason.into(),
        }
    }

    /// 是否为只影响单个层、不应中断整批可视化的错误
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::LayerResolution { .. })
    }
}
