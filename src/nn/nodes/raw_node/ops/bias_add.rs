/*
 * @Date         : 2026-10-15
 * @Description  : BiasAdd 节点：按通道（最后一维）加偏置
 *
 * 形状约定：
 * - parents[0]: 输入 [..., C]，通常为卷积输出 [batch, H, W, C]
 * - parents[1]: 偏置 [C]
 * - 输出：与输入形状相同
 */

use super::{invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct BiasAdd {
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl BiasAdd {
    pub(in crate::nn) fn new(input_shape: &[usize], bias_shape: &[usize]) -> Result<Self, GraphError> {
        let channels = input_shape.last().copied().unwrap_or(0);
        if bias_shape != [channels] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![channels],
                got: bias_shape.to_vec(),
                message: format!("BiasAdd 的偏置必须是长度等于输入最后一维的向量，输入形状为{input_shape:?}"),
            });
        }
        Ok(Self {
            value: None,
            shape: input_shape.to_vec(),
        })
    }
}

impl TraitNode for BiasAdd {
    fn kind(&self) -> OpKind {
        OpKind::BiasAdd
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
        let input = parent(parents, 0, "BiasAdd")?;
        let bias = parent(parents, 1, "BiasAdd")?;
        // 偏置沿最后一维对齐，按广播规则相加即可
        self.value = Some(input + bias);
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        match parent_index {
            // 对 input: 梯度直接传递
            0 => Ok(upstream_grad.clone()),
            // 对 bias: 梯度在除通道外的所有维度求和
            1 => {
                let bias = parent(parents, 1, "BiasAdd")?;
                Ok(upstream_grad.sum_to_shape(bias.shape()))
            }
            _ => Err(invalid_parent_index("BiasAdd", parent_index)),
        }
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::BiasAdd
    }
}
