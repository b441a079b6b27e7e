mod constant;
mod ops;
mod placeholder;
mod variable;

pub(in crate::nn) use constant::Constant;
pub(in crate::nn) use ops::*;
pub use ops::{LrnParams, Padding};
pub(in crate::nn) use placeholder::Placeholder;
pub(in crate::nn) use variable::Variable;

use super::OpKind;
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
#[derive(Clone)]
pub(in crate::nn) enum NodeType {
    Placeholder,
    Constant,
    Variable,
    Conv2d,
    BiasAdd,
    Relu,
    MaxPool,
    Lrn,
    Add,
    MatMul,
    Reshape,
    FeatureMapSelect,
}

#[enum_dispatch(NodeType)]
pub(in crate::nn) trait TraitNode {
    fn kind(&self) -> OpKind;

    /// 构建时推断出的静态输出形状
    fn value_expected_shape(&self) -> &[usize];

    fn value(&self) -> Option<&Tensor>;

    fn set_value(&mut self, _value: Option<&Tensor>) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}类型节点的值不应该被手动设置",
            self.kind()
        )))
    }

    fn clear_value(&mut self);

    // 根据父节点的值计算本节点的值（注意：由于该接口只在Graph中使用，所以实现时不用关心父节点的值是否已被计算，所有父节点的值都已预先被计算过了）
    fn calc_value_by_parents(&mut self, parents: &[&Tensor]) -> Result<(), GraphError>;

    /// 原生梯度（VJP）：给定上游梯度，计算对第`parent_index`个父节点的梯度
    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError>;

    fn describe(&self) -> NodeTypeDescriptor;
}

/// 梯度覆盖规则可见的前向信息：本节点的输出与各父节点（输入）的值
pub(in crate::nn) struct GradientContext<'a> {
    pub output: &'a Tensor,
    pub inputs: &'a [&'a Tensor],
}

/// 源节点（占位符/常量/变量）没有父节点，也就不会有对父节点的梯度
fn no_parent_error(kind: OpKind) -> GraphError {
    GraphError::InvalidOperation(format!("{kind}节点没有父节点，不应参与梯度计算"))
}
