/*
 * @Date         : 2026-10-15
 * @Description  : 特征图选取节点：沿最后一维（特征图维）取出第 i 个特征图
 *
 * 父节点：
 * - parents[0]: 层输出 [..., C]
 * - parents[1]: 标量索引（通常是运行时喂值的占位符）
 *
 * 输出形状为去掉最后一维后的形状。反向传播时，上游梯度被放回所选的那一张特征图，
 * 其余特征图的梯度为0；索引是离散值，对它的梯度恒为0。
 */

use super::{invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct FeatureMapSelect {
    value: Option<Tensor>,
    shape: Vec<usize>,
    num_maps: usize,
    // 前向传播时实际选取的索引，供反向传播使用
    selected: Option<usize>,
}

impl FeatureMapSelect {
    pub(in crate::nn) fn new(input_shape: &[usize], index_shape: &[usize]) -> Result<Self, GraphError> {
        let Some((&num_maps, rest)) = input_shape.split_last() else {
            return Err(GraphError::InvalidOperation(
                "FeatureMapSelect 的输入至少需要1维".to_string(),
            ));
        };
        if index_shape.iter().product::<usize>() != 1 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![],
                got: index_shape.to_vec(),
                message: "FeatureMapSelect 的索引必须是标量".to_string(),
            });
        }
        Ok(Self {
            value: None,
            shape: rest.to_vec(),
            num_maps,
            selected: None,
        })
    }

    fn index_of(&self, index: &Tensor) -> Result<usize, GraphError> {
        let raw = index.number().ok_or_else(|| {
            GraphError::ComputationError("FeatureMapSelect 的索引必须是标量".to_string())
        })?;
        if raw < 0.0 || raw.fract() != 0.0 || raw as usize >= self.num_maps {
            return Err(GraphError::ComputationError(format!(
                "特征图索引{raw}越界，共有{}张特征图",
                self.num_maps
            )));
        }
        Ok(raw as usize)
    }
}

impl TraitNode for FeatureMapSelect {
    fn kind(&self) -> OpKind {
        OpKind::FeatureMapSelect
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
        self.selected = None;
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor]) -> Result<(), GraphError> {
        let input = parent(parents, 0, "FeatureMapSelect")?;
        let index = self.index_of(parent(parents, 1, "FeatureMapSelect")?)?;
        self.value = Some(input.select_last_axis(index));
        self.selected = Some(index);
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        match parent_index {
            0 => {
                let index = match self.selected {
                    Some(index) => index,
                    None => self.index_of(parent(parents, 1, "FeatureMapSelect")?)?,
                };
                Ok(upstream_grad.scatter_last_axis(index, self.num_maps))
            }
            1 => Ok(Tensor::zeros_like(parent(parents, 1, "FeatureMapSelect")?)),
            _ => Err(invalid_parent_index("FeatureMapSelect", parent_index)),
        }
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::FeatureMapSelect
    }
}
