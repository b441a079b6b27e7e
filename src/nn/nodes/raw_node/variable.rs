use super::{OpKind, TraitNode, no_parent_error};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::tensor::Tensor;

/// 可训练变量：持有活的状态，须先初始化（或 restore）才有值
#[derive(Clone)]
pub(in crate::nn) struct Variable {
    shape: Vec<usize>,
    initial_value: Option<Tensor>,
    value: Option<Tensor>,
}

impl Variable {
    pub(in crate::nn) fn new(initial_value: &Tensor) -> Self {
        Self {
            shape: initial_value.shape().to_vec(),
            initial_value: Some(initial_value.clone()),
            value: None,
        }
    }

    /// 从元图导入的变量只有形状，没有初始值
    pub(in crate::nn) fn declared(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            initial_value: None,
            value: None,
        }
    }

    /// 以初始值赋值；没有初始值时返回false
    pub(in crate::nn) fn initialize(&mut self) -> bool {
        match &self.initial_value {
            Some(init) => {
                self.value = Some(init.clone());
                true
            }
            None => false,
        }
    }
}

impl TraitNode for Variable {
    fn kind(&self) -> OpKind {
        OpKind::Variable
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

    fn clear_value(&mut self) {}

    fn calc_value_by_parents(&mut self, _parents: &[&Tensor]) -> Result<(), GraphError> {
        if self.value.is_none() {
            return Err(GraphError::ComputationError(
                "变量未初始化，请先初始化变量或从检查点 restore".to_string(),
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
        NodeTypeDescriptor::Variable
    }
}
