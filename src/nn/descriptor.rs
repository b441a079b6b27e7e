/*
 * @Date         : 2026-10-15
 * @Description  : 图描述符（Graph Descriptor）
 *                 统一的中间表示（IR），即检查点中的元图（.meta）
 */

use super::GradientOverride;
use super::nodes::{LrnParams, Padding};
use serde::{Deserialize, Serialize};

/// 图的可序列化描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDescriptor {
    /// 格式版本（用于向后兼容）
    pub version: String,
    /// 图名称
    pub name: String,
    /// 所有节点描述，按节点 ID 升序（即原生遍历顺序）
    pub nodes: Vec<NodeDescriptor>,
}

/// 节点描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// 节点 ID
    pub id: u64,
    /// 节点名称
    pub name: String,
    /// 节点类型
    pub node_type: NodeTypeDescriptor,
    /// 输出形状
    pub output_shape: Vec<usize>,
    /// 父节点 ID 列表（定义拓扑，顺序即父节点的参数位置）
    pub parents: Vec<u64>,
    /// 节点被赋予的梯度覆盖规则
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_override: Option<GradientOverride>,
}

/// 节点类型描述（包含类型特定参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeTypeDescriptor {
    Placeholder,
    Const,
    Variable,
    Conv2D {
        strides: (usize, usize),
        padding: Padding,
    },
    BiasAdd,
    Relu,
    MaxPool {
        kernel_size: (usize, usize),
        strides: (usize, usize),
        padding: Padding,
    },
    Lrn {
        params: LrnParams,
    },
    Add,
    MatMul,
    Reshape {
        shape: Vec<usize>,
    },
    FeatureMapSelect,
}

impl GraphDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: name.to_string(),
            nodes: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeDescriptor) {
        self.nodes.push(node);
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
