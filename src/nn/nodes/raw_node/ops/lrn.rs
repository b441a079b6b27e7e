/*
 * @Date         : 2026-10-15
 * @Description  : 局部响应归一化（LRN）节点，沿最后一维（通道）做跨通道归一化
 *
 * 对每个位置的第 j 个通道：
 *   s_j = bias + alpha * Σ_{i ∈ [j-r, j+r]} x_i²
 *   y_j = x_j * s_j^(-beta)
 *
 * 反向传播：
 *   dx_j = g_j * s_j^(-beta) - 2 * alpha * beta * x_j * Σ_{i: j ∈ [i-r, i+r]} g_i * x_i * s_i^(-beta-1)
 *
 * 父节点：
 * - parents[0]: 输入数据
 */

use super::{invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// LRN 超参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LrnParams {
    /// 窗口半径 r：窗口覆盖 [j-r, j+r] 共 2r+1 个通道
    pub depth_radius: usize,
    pub bias: f32,
    pub alpha: f32,
    pub beta: f32,
}

impl Default for LrnParams {
    fn default() -> Self {
        Self {
            depth_radius: 5,
            bias: 1.0,
            alpha: 1.0,
            beta: 0.5,
        }
    }
}

#[derive(Clone)]
pub(in crate::nn) struct Lrn {
    value: Option<Tensor>,
    shape: Vec<usize>,
    params: LrnParams,
}

impl Lrn {
    pub(in crate::nn) fn new(input_shape: &[usize], params: LrnParams) -> Result<Self, GraphError> {
        if input_shape.is_empty() {
            return Err(GraphError::InvalidOperation(
                "LRN 的输入至少需要1维（最后一维为通道）".to_string(),
            ));
        }
        Ok(Self {
            value: None,
            shape: input_shape.to_vec(),
            params,
        })
    }

    /// 通道 j 的窗口 [lo, hi]
    fn window(&self, j: usize, depth: usize) -> (usize, usize) {
        let r = self.params.depth_radius;
        (j.saturating_sub(r), (j + r).min(depth - 1))
    }

    /// 对每个通道行（最后一维上的一段连续数据）计算 s_j
    fn scale_row(&self, row: &[f32]) -> Vec<f32> {
        let depth = row.len();
        (0..depth)
            .map(|j| {
                let (lo, hi) = self.window(j, depth);
                let sq_sum: f32 = row[lo..=hi].iter().map(|x| x * x).sum();
                self.params.bias + self.params.alpha * sq_sum
            })
            .collect()
    }
}

impl TraitNode for Lrn {
    fn kind(&self) -> OpKind {
        OpKind::Lrn
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
        let input = parent(parents, 0, "LRN")?;
        let depth = input.last_axis_len();
        let beta = self.params.beta;

        let mut output = Vec::with_capacity(input.size());
        for row in input.data_as_slice().chunks(depth.max(1)) {
            let scale = self.scale_row(row);
            output.extend(row.iter().zip(&scale).map(|(x, s)| x * s.powf(-beta)));
        }
        self.value = Some(Tensor::new(&output, input.shape()));
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index("LRN", parent_index));
        }
        let input = parent(parents, 0, "LRN")?;
        let depth = input.last_axis_len().max(1);
        let LrnParams { alpha, beta, .. } = self.params;

        let mut grad = Vec::with_capacity(input.size());
        for (row, g_row) in input
            .data_as_slice()
            .chunks(depth)
            .zip(upstream_grad.data_as_slice().chunks(depth))
        {
            let scale = self.scale_row(row);
            // t_i = g_i * x_i * s_i^(-beta-1)
            let t: Vec<f32> = (0..depth)
                .map(|i| g_row[i] * row[i] * scale[i].powf(-beta - 1.0))
                .collect();
            for j in 0..depth {
                // 通道 j 落在通道 i 的窗口内，等价于 i 落在 j 的窗口内
                let (lo, hi) = self.window(j, depth);
                let cross: f32 = t[lo..=hi].iter().sum();
                grad.push(g_row[j] * scale[j].powf(-beta) - 2.0 * alpha * beta * row[j] * cross);
            }
        }
        Ok(Tensor::new(&grad, input.shape()))
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::Lrn {
            params: self.params,
        }
    }
}
