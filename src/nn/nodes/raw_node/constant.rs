use super::{OpKind, TraitNode, no_parent_error};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::tensor::Tensor;

/// 常量：冻结图中的权重。从元图导入时先只声明形状，值随后由 restore 填入
#[derive(Clone)]
pub(in crate::nn) struct Constant {
    shape: Vec<usize>,
    value: Option<Tensor>,
}

impl Constant {
    pub(in crate::nn) fn new(value: &Tensor) -> Self {
        Self {
            shape: value.shape().to_vec(),
            value: Some(value.clone()),
        }
    }

    pub(in crate::nn) fn declared(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            value: None,
        }
    }
}

impl TraitNode for Constant {
    fn kind(&self) -> OpKind {
        OpKind::Const
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.value = value.cloned();
        Ok(())
    }

    // 常量的值不随前向传播变化
    fn clear_value(&mut self) {}

    fn calc_value_by_parents(&mut self, _parents: &[&Tensor]) -> Result<(), GraphError> {
        if self.value.is_none() {
            return Err(GraphError::ComputationError(
                "常量没有值，请先从检查点 restore".to_string(),
            ));
        }
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _parent_index: usize,
        _parents: &[&Tensor],
        _upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        Err(no_parent_error(self.kind()))
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::Const
    }
}
