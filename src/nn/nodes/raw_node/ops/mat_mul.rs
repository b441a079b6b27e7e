use super::{invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

/// 矩阵乘法节点：[m, k] x [k, n] -> [m, n]
///
/// 反向传播：dA = G · Bᵀ，dB = Aᵀ · G
#[derive(Clone)]
pub(in crate::nn) struct MatMul {
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl MatMul {
    pub(in crate::nn) fn new(a_shape: &[usize], b_shape: &[usize]) -> Result<Self, GraphError> {
        if a_shape.len() != 2 || b_shape.len() != 2 || a_shape[1] != b_shape[0] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![a_shape.first().copied().unwrap_or(0), b_shape.first().copied().unwrap_or(0)],
                got: b_shape.to_vec(),
                message: format!(
                    "MatMul 需要两个二维矩阵且前者列数等于后者行数，得到{a_shape:?}和{b_shape:?}"
                ),
            });
        }
        Ok(Self {
            value: None,
            shape: vec![a_shape[0], b_shape[1]],
        })
    }
}

impl TraitNode for MatMul {
    fn kind(&self) -> OpKind {
        OpKind::MatMul
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
        let a = parent(parents, 0, "MatMul")?;
        let b = parent(parents, 1, "MatMul")?;
        self.value = Some(a.mat_mul(b));
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let a = parent(parents, 0, "MatMul")?;
        let b = parent(parents, 1, "MatMul")?;
        match parent_index {
            0 => Ok(upstream_grad.mat_mul(&b.transpose())),
            1 => Ok(a.transpose().mat_mul(upstream_grad)),
            _ => Err(invalid_parent_index("MatMul", parent_index)),
        }
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::MatMul
    }
}
