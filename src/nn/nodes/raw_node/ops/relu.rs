use super::{invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

/// ReLU 激活函数节点
///
/// forward: f(x) = max(x, 0)
/// backward: 只有输出为正的位置让上游梯度通过
#[derive(Clone)]
pub(in crate::nn) struct Relu {
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl Relu {
    pub(in crate::nn) fn new(input_shape: &[usize]) -> Self {
        Self {
            value: None,
            shape: input_shape.to_vec(),
        }
    }
}

/// ReLU 的原生梯度：以前向输出`output`作为掩码，`output > 0`处取`grad`，其余为0。
/// 梯度覆盖规则（如导向反向传播）也复用本函数
pub(in crate::nn) fn relu_grad(grad: &Tensor, output: &Tensor) -> Tensor {
    grad.where_with_tensor(output, |_, y| y > 0.0, |g, _| g, |_, _| 0.0)
}

impl TraitNode for Relu {
    fn kind(&self) -> OpKind {
        OpKind::Relu
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
        let input = parent(parents, 0, "Relu")?;
        self.value = Some(input.where_with_f32(|x| x > 0.0, |x| x, |_| 0.0));
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index("Relu", parent_index));
        }
        let output = self.value.as_ref().ok_or_else(|| {
            GraphError::ComputationError("Relu 尚未前向传播，无法计算梯度".to_string())
        })?;
        Ok(relu_grad(upstream_grad, output))
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::Relu
    }
}
