use serde::{Deserialize, Serialize};
use std::fmt;

/// 节点（算子）类型。用封闭枚举代替字符串匹配，
/// `type_name`给出执行引擎意义上的类型标签（用于日志、描述符和自动命名）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Placeholder,
    Const,
    Variable,
    Conv2D,
    BiasAdd,
    Relu,
    MaxPool,
    Lrn,
    Add,
    MatMul,
    Reshape,
    FeatureMapSelect,
}

impl OpKind {
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Placeholder => "Placeholder",
            Self::Const => "Const",
            Self::Variable => "VariableV2",
            Self::Conv2D => "Conv2D",
            Self::BiasAdd => "BiasAdd",
            Self::Relu => "Relu",
            Self::MaxPool => "MaxPool",
            Self::Lrn => "LRN",
            Self::Add => "Add",
            Self::MatMul => "MatMul",
            Self::Reshape => "Reshape",
            Self::FeatureMapSelect => "FeatureMapSelect",
        }
    }

    /// 是否为可训练的变量（冻结图中不允许出现）
    pub const fn is_variable(self) -> bool {
        matches!(self, Self::Variable)
    }

    /// 是否为源节点：其值来自喂值、常量或变量本身，而非由父节点计算
    pub const fn is_source(self) -> bool {
        matches!(self, Self::Placeholder | Self::Const | Self::Variable)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
