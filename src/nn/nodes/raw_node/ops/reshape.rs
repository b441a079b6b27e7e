use super::{invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

/// 改变形状（元素总数不变）。常用于卷积部分与全连接部分的衔接
#[derive(Clone)]
pub(in crate::nn) struct Reshape {
    value: Option<Tensor>,
    input_shape: Vec<usize>,
    target_shape: Vec<usize>,
}

impl Reshape {
    pub(in crate::nn) fn new(input_shape: &[usize], target_shape: &[usize]) -> Result<Self, GraphError> {
        let input_size: usize = input_shape.iter().product();
        let target_size: usize = target_shape.iter().product();
        if input_size != target_size {
            return Err(GraphError::ShapeMismatch {
                expected: input_shape.to_vec(),
                got: target_shape.to_vec(),
                message: format!(
                    "Reshape 前后元素数量必须一致：{input_size} != {target_size}"
                ),
            });
        }
        Ok(Self {
            value: None,
            input_shape: input_shape.to_vec(),
            target_shape: target_shape.to_vec(),
        })
    }
}

impl TraitNode for Reshape {
    fn kind(&self) -> OpKind {
        OpKind::Reshape
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.target_shape
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor]) -> Result<(), GraphError> {
        let input = parent(parents, 0, "Reshape")?;
        self.value = Some(input.reshape(&self.target_shape));
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index("Reshape", parent_index));
        }
        Ok(upstream_grad.reshape(&self.input_shape))
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::Reshape {
            shape: self.target_shape.clone(),
        }
    }
}
