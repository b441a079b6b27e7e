/*
 * @Date         : 2026-10-15
 * @Description  : 2D 最大池化节点（NHWC 布局）
 *
 * 设计决策：
 * - 记录最大值位置用于反向传播（稀疏梯度）
 * - 输入必须是 4D [batch, H, W, C]，输出 [batch, H', W', C]
 * - SAME 填充时，填充位置不参与取最大值
 * - 使用 Rayon 在 batch 维度并行加速
 *
 * 父节点：
 * - parents[0]: 输入数据
 */

use super::{Padding, invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;
use rayon::prelude::*;

/// 2D 最大池化节点
#[derive(Clone)]
pub(in crate::nn) struct MaxPool {
    value: Option<Tensor>,
    shape: Vec<usize>,

    // 池化参数
    kernel_size: (usize, usize), // (kH, kW)
    strides: (usize, usize),     // (sH, sW)
    padding: Padding,
    pad_before: (usize, usize),

    // 缓存（用于反向传播）：每个输出位置对应的最大值在输入中的展平索引
    max_indices: Option<Vec<usize>>,
    input_shape: Vec<usize>,
}

impl MaxPool {
    /// 创建 `MaxPool` 节点
    ///
    /// # 参数
    /// - `kernel_size`: 池化窗口大小 (kH, kW)
    /// - `strides`: 步长 (sH, sW)，为 None 时等于 `kernel_size`
    pub(in crate::nn) fn new(
        input_shape: &[usize],
        kernel_size: (usize, usize),
        strides: Option<(usize, usize)>,
        padding: Padding,
    ) -> Result<Self, GraphError> {
        if input_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input_shape.to_vec(),
                message: format!(
                    "MaxPool 输入必须是 4D [batch, H, W, C]，得到 {input_shape:?}。单样本请使用 [1, H, W, C]"
                ),
            });
        }
        let (batch_size, input_h, input_w, channels) = (
            input_shape[0],
            input_shape[1],
            input_shape[2],
            input_shape[3],
        );
        let (k_h, k_w) = kernel_size;
        let strides = strides.unwrap_or(kernel_size);

        let invalid = || {
            GraphError::InvalidOperation(format!(
                "MaxPool 输出尺寸无效：输入 {input_h}x{input_w}，核 {k_h}x{k_w}，步长 {strides:?}，填充 {padding:?}"
            ))
        };
        let (output_h, pad_top) = padding
            .output_and_pad(input_h, k_h, strides.0)
            .ok_or_else(invalid)?;
        let (output_w, pad_left) = padding
            .output_and_pad(input_w, k_w, strides.1)
            .ok_or_else(invalid)?;

        Ok(Self {
            value: None,
            shape: vec![batch_size, output_h, output_w, channels],
            kernel_size,
            strides,
            padding,
            pad_before: (pad_top, pad_left),
            max_indices: None,
            input_shape: input_shape.to_vec(),
        })
    }
}

impl TraitNode for MaxPool {
    fn kind(&self) -> OpKind {
        OpKind::MaxPool
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
        self.max_indices = None;
    }

    fn calc_value_by_parents(&mut self, parents: &[&Tensor]) -> Result<(), GraphError> {
        let input = parent(parents, 0, "MaxPool")?;
        let (batch_size, in_h, in_w, channels) = (
            input.shape()[0],
            input.shape()[1],
            input.shape()[2],
            input.shape()[3],
        );
        let (k_h, k_w) = self.kernel_size;
        let (s_h, s_w) = self.strides;
        let (pad_top, pad_left) = (self.pad_before.0 as isize, self.pad_before.1 as isize);
        let (out_h, out_w) = (self.shape[1], self.shape[2]);
        let single_output_size = out_h * out_w * channels;
        let single_input_size = in_h * in_w * channels;

        let batch_results: Vec<(Vec<f32>, Vec<usize>)> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let mut values = vec![f32::NEG_INFINITY; single_output_size];
                let mut indices = vec![0usize; single_output_size];
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        for c in 0..channels {
                            let out_idx = (oh * out_w + ow) * channels + c;
                            for kh in 0..k_h {
                                let ih = (oh * s_h + kh) as isize - pad_top;
                                if ih < 0 || ih >= in_h as isize {
                                    continue;
                                }
                                for kw in 0..k_w {
                                    let iw = (ow * s_w + kw) as isize - pad_left;
                                    if iw < 0 || iw >= in_w as isize {
                                        continue;
                                    }
                                    let (ih, iw) = (ih as usize, iw as usize);
                                    let val = input[[b, ih, iw, c]];
                                    if val > values[out_idx] {
                                        values[out_idx] = val;
                                        indices[out_idx] =
                                            b * single_input_size + (ih * in_w + iw) * channels + c;
                                    }
                                }
                            }
                        }
                    }
                }
                (values, indices)
            })
            .collect();

        let mut all_values = Vec::with_capacity(batch_size * single_output_size);
        let mut all_indices = Vec::with_capacity(batch_size * single_output_size);
        for (values, indices) in batch_results {
            all_values.extend(values);
            all_indices.extend(indices);
        }

        self.value = Some(Tensor::new(&all_values, &self.shape));
        self.max_indices = Some(all_indices);
        Ok(())
    }

    /// 梯度只流向前向传播时取到最大值的位置
    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index("MaxPool", parent_index));
        }
        let max_indices = self.max_indices.as_ref().ok_or_else(|| {
            GraphError::ComputationError("MaxPool 尚未前向传播，没有最大值位置缓存".to_string())
        })?;

        let input_size: usize = self.input_shape.iter().product();
        let mut grad = vec![0.0f32; input_size];
        for (&input_idx, &g) in max_indices.iter().zip(upstream_grad.data_as_slice()) {
            grad[input_idx] += g;
        }
        Ok(Tensor::new(&grad, &self.input_shape))
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::MaxPool {
            kernel_size: self.kernel_size,
            strides: self.strides,
            padding: self.padding,
        }
    }
}
