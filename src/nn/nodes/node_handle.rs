use super::raw_node::{NodeType, TraitNode};
use super::{NodeId, OpKind};
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::{GradientOverride, GraphError};
use crate::tensor::Tensor;
use std::fmt;

/// 图中节点的句柄：在具体节点（`NodeType`）之外，记录图层面的信息：
/// id、名称、前向传播批次以及导入时被赋予的梯度覆盖规则
#[derive(Clone)]
pub(crate) struct NodeHandle {
    id: NodeId,
    name: String,
    raw_node: NodeType,
    last_forward_pass_id: u64,
    gradient_override: Option<GradientOverride>,
}

impl NodeHandle {
    pub(crate) fn new<T: Into<NodeType>>(id: NodeId, name: &str, raw_node: T) -> Self {
        Self {
            id,
            name: name.to_string(),
            raw_node: raw_node.into(),
            last_forward_pass_id: 0,
            gradient_override: None,
        }
    }

    pub(crate) const fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn kind(&self) -> OpKind {
        self.raw_node.kind()
    }

    pub(crate) fn value_expected_shape(&self) -> &[usize] {
        self.raw_node.value_expected_shape()
    }

    pub(crate) fn value(&self) -> Option<&Tensor> {
        self.raw_node.value()
    }

    pub(crate) fn has_value(&self) -> bool {
        self.raw_node.value().is_some()
    }

    pub(crate) fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        if let Some(v) = value {
            if v.shape() != self.value_expected_shape() {
                return Err(GraphError::ShapeMismatch {
                    expected: self.value_expected_shape().to_vec(),
                    got: v.shape().to_vec(),
                    message: format!("{self}的值形状与声明不一致"),
                });
            }
        }
        self.raw_node.set_value(value)
    }

    pub(crate) fn clear_value(&mut self) {
        self.raw_node.clear_value();
    }

    /// 变量节点：以初始值初始化；其余节点无操作
    pub(crate) fn initialize(&mut self) -> Result<(), GraphError> {
        if let NodeType::Variable(var) = &mut self.raw_node {
            if !var.initialize() {
                return Err(GraphError::InvalidOperation(format!(
                    "变量{}没有初始值（从检查点导入的变量只能通过 restore 赋值）",
                    self.name
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn calc_value_by_parents(&mut self, parents: &[&Tensor]) -> Result<(), GraphError> {
        self.raw_node.calc_value_by_parents(parents)
    }

    pub(crate) fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        self.raw_node
            .calc_grad_to_parent(parent_index, parents, upstream_grad)
    }

    pub(crate) fn describe(&self) -> NodeTypeDescriptor {
        self.raw_node.describe()
    }

    pub(crate) const fn last_forward_pass_id(&self) -> u64 {
        self.last_forward_pass_id
    }

    pub(crate) fn set_last_forward_pass_id(&mut self, pass_id: u64) {
        self.last_forward_pass_id = pass_id;
    }

    pub(crate) const fn gradient_override(&self) -> Option<GradientOverride> {
        self.gradient_override
    }

    pub(crate) fn set_gradient_override(&mut self, rule: Option<GradientOverride>) {
        self.gradient_override = rule;
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "节点[id={}, name={}, type={}]", self.id.0, self.name, self.kind())
    }
}
