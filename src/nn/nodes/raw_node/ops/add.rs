use super::{invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

/// 两个张量逐元素相加（支持 NumPy 风格广播）
#[derive(Clone)]
pub(in crate::nn) struct Add {
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl Add {
    pub(in crate::nn) fn new(a_shape: &[usize], b_shape: &[usize]) -> Result<Self, GraphError> {
        let rank = a_shape.len().max(b_shape.len());
        let dim_at = |shape: &[usize], i: usize| {
            // 右对齐，缺失的前导维视为1
            (i + shape.len()).checked_sub(rank).map_or(1, |j| shape[j])
        };
        let mut shape = Vec::with_capacity(rank);
        for i in 0..rank {
            let (a, b) = (dim_at(a_shape, i), dim_at(b_shape, i));
            if a != b && a != 1 && b != 1 {
                return Err(GraphError::ShapeMismatch {
                    expected: a_shape.to_vec(),
                    got: b_shape.to_vec(),
                    message: "Add 的两个输入形状无法广播".to_string(),
                });
            }
            shape.push(a.max(b));
        }
        Ok(Self { value: None, shape })
    }
}

impl TraitNode for Add {
    fn kind(&self) -> OpKind {
        OpKind::Add
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor]) -> Result<(), GraphError> {
        let a = parent(parents, 0, "Add")?;
        let b = parent(parents, 1, "Add")?;
        self.value = Some(a + b);
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index > 1 {
            return Err(invalid_parent_index("Add", parent_index));
        }
        // 被广播过的父节点需要把梯度归约回自身形状
        let target = parent(parents, parent_index, "Add")?;
        if target.shape() == upstream_grad.shape() {
            Ok(upstream_grad.clone())
        } else {
            Ok(upstream_grad.sum_to_shape(target.shape()))
        }
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::Add
    }
}
