/*
 * @Date         : 2026-10-15
 * @Description  : 层解析：把层名或层类型代码展开成图中具体的节点名
 */

use crate::nn::{GraphInner, OpKind};
use std::fmt;
use tracing::{debug, warn};

/// 层类型代码：'r' 激活层、'p' 池化层、'c' 卷积层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Activation,
    Pooling,
    Convolution,
}

impl LayerKind {
    /// 解析类型代码（不区分大小写）
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "r" => Some(Self::Activation),
            "p" => Some(Self::Pooling),
            "c" => Some(Self::Convolution),
            _ => None,
        }
    }

    pub const fn code(self) -> char {
        match self {
            Self::Activation => 'r',
            Self::Pooling => 'p',
            Self::Convolution => 'c',
        }
    }

    /// 对应的节点类型
    pub const fn op_kind(self) -> OpKind {
        match self {
            Self::Activation => OpKind::Relu,
            Self::Pooling => OpKind::MaxPool,
            Self::Convolution => OpKind::Conv2D,
        }
    }
}

/// 一项层请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerRequest {
    /// 空请求：记录后跳过
    Skip,
    /// 精确的节点名
    Name(String),
    /// 某一类型的全部节点
    Kind(LayerKind),
}

impl Default for LayerRequest {
    fn default() -> Self {
        Self::Kind(LayerKind::Activation)
    }
}

/// 类型代码优先：名字恰好是`r`/`p`/`c`（不区分大小写）的节点只能按类型被选中
impl From<&str> for LayerRequest {
    fn from(value: &str) -> Self {
        LayerKind::from_code(value).map_or_else(|| Self::Name(value.to_string()), Self::Kind)
    }
}

impl From<String> for LayerRequest {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl<T: Into<Self>> From<Option<T>> for LayerRequest {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Skip, Into::into)
    }
}

impl From<LayerKind> for LayerRequest {
    fn from(kind: LayerKind) -> Self {
        Self::Kind(kind)
    }
}

impl fmt::Display for LayerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("None"),
            Self::Name(name) => f.write_str(name),
            Self::Kind(kind) => write!(f, "{}", kind.code()),
        }
    }
}

/// 解析请求串，逗号分隔，如`"r,conv1"`；空项视为跳过
pub fn parse_layer_list(list: &str) -> Vec<LayerRequest> {
    list.split(',')
        .map(str::trim)
        .map(|item| {
            if item.is_empty() {
                LayerRequest::Skip
            } else {
                LayerRequest::from(item)
            }
        })
        .collect()
}

/// 被跳过的请求及原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLayer {
    pub request: String,
    pub reason: String,
}

/// 解析结果：按顺序排列的目标节点名，以及被跳过的请求
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub targets: Vec<String>,
    pub skipped: Vec<SkippedLayer>,
}

/// 把层请求展开为节点名序列
///
/// - 类型代码：图中该类型的全部节点，按原生遍历顺序
/// - 节点名：原样作为目标（找不到时由后续解析阶段报告并跳过）
/// - 空请求：记录并跳过
pub fn resolve(graph: &GraphInner, requests: &[LayerRequest]) -> Resolution {
    let mut resolution = Resolution::default();
    for request in requests {
        match request {
            LayerRequest::Skip => {
                warn!("跳过 {request}：不是有效的层名或层类型");
                resolution.skipped.push(SkippedLayer {
                    request: request.to_string(),
                    reason: "不是有效的层名或层类型".to_string(),
                });
            }
            LayerRequest::Name(name) => resolution.targets.push(name.clone()),
            LayerRequest::Kind(kind) => {
                let ops = graph.operations_of_kind(kind.op_kind());
                debug!("层类型`{}`匹配到 {} 个{}节点", kind.code(), ops.len(), kind.op_kind());
                resolution.targets.extend(ops.into_iter().map(|op| op.name));
            }
        }
    }
    resolution
}
