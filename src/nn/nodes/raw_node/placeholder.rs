use super::{OpKind, TraitNode, no_parent_error};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::tensor::Tensor;

/// 占位符：值只在一次`Session::run`期间由喂值提供
#[derive(Clone)]
pub(in crate::nn) struct Placeholder {
    shape: Vec<usize>,
    value: Option<Tensor>,
}

impl Placeholder {
    pub(in crate::nn) fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            value: None,
        }
    }
}

impl TraitNode for Placeholder {
    fn kind(&self) -> OpKind {
        OpKind::Placeholder
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

    fn clear_value(&mut self) {
        self.value = None;
    }

    fn calc_value_by_parents(&mut self, _parents: &[&Tensor]) -> Result<(), GraphError> {
        if self.value.is_none() {
            return Err(GraphError::ComputationError(
                "占位符没有被喂值，请在feed中提供".to_string(),
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
        NodeTypeDescriptor::Placeholder
    }
}
