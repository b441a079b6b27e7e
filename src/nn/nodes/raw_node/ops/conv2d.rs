/*
 * @Date         : 2026-10-15
 * @Description  : 2D 卷积节点（NHWC 布局）
 *
 * 设计决策：
 * - 输入必须是 4D [batch, H, W, C_in]，单样本使用 batch=1
 * - 卷积核形状 [kH, kW, C_in, C_out]
 * - 输出格式：[batch, H', W', C_out]，最后一维即特征图维
 * - 使用 Rayon 在 batch 维度并行加速
 *
 * 父节点：
 * - parents[0]: 输入数据
 * - parents[1]: 卷积核（冻结图中为 Const）
 */

use super::{Padding, invalid_parent_index, parent};
use crate::nn::GraphError;
use crate::nn::descriptor::NodeTypeDescriptor;
use crate::nn::nodes::OpKind;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;
use rayon::prelude::*;

/// 2D 卷积节点
#[derive(Clone)]
pub(in crate::nn) struct Conv2d {
    value: Option<Tensor>,
    shape: Vec<usize>,
    kernel_size: (usize, usize), // (kH, kW)
    strides: (usize, usize),     // (sH, sW)
    padding: Padding,
    pad_before: (usize, usize), // (上, 左)
}

impl Conv2d {
    /// 创建 Conv2d 节点
    ///
    /// # 形状约定
    /// - 输入: [batch, H, W, `C_in`]
    /// - 卷积核: [kH, kW, `C_in`, `C_out`]
    pub(in crate::nn) fn new(
        input_shape: &[usize],
        filter_shape: &[usize],
        strides: (usize, usize),
        padding: Padding,
    ) -> Result<Self, GraphError> {
        if input_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input_shape.to_vec(),
                message: "Conv2D 输入必须是 4D [batch, H, W, C_in]，单样本请使用 [1, H, W, C_in]"
                    .to_string(),
            });
        }
        if filter_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: filter_shape.to_vec(),
                message: "卷积核必须是 4D [kH, kW, C_in, C_out]".to_string(),
            });
        }
        let (batch_size, input_h, input_w, input_c) =
            (input_shape[0], input_shape[1], input_shape[2], input_shape[3]);
        let (kernel_h, kernel_w, in_channels, out_channels) =
            (filter_shape[0], filter_shape[1], filter_shape[2], filter_shape[3]);

        if input_c != in_channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![in_channels],
                got: vec![input_c],
                message: format!("输入通道数 {input_c} 与卷积核输入通道数 {in_channels} 不匹配"),
            });
        }

        let (stride_h, stride_w) = strides;
        let invalid = || {
            GraphError::InvalidOperation(format!(
                "卷积输出尺寸无效：输入 {input_h}x{input_w}，核 {kernel_h}x{kernel_w}，步长 {strides:?}，填充 {padding:?}"
            ))
        };
        let (output_h, pad_top) = padding
            .output_and_pad(input_h, kernel_h, stride_h)
            .ok_or_else(invalid)?;
        let (output_w, pad_left) = padding
            .output_and_pad(input_w, kernel_w, stride_w)
            .ok_or_else(invalid)?;

        Ok(Self {
            value: None,
            shape: vec![batch_size, output_h, output_w, out_channels],
            kernel_size: (kernel_h, kernel_w),
            strides,
            padding,
            pad_before: (pad_top, pad_left),
        })
    }

    /// 输出位置(oh, ow)与核内偏移(kh, kw)对应的输入坐标；落在填充区域时返回None
    fn input_coord(
        &self,
        (oh, ow): (usize, usize),
        (kh, kw): (usize, usize),
        (in_h, in_w): (usize, usize),
    ) -> Option<(usize, usize)> {
        let ih = (oh * self.strides.0 + kh) as isize - self.pad_before.0 as isize;
        let iw = (ow * self.strides.1 + kw) as isize - self.pad_before.1 as isize;
        if ih < 0 || iw < 0 || ih >= in_h as isize || iw >= in_w as isize {
            None
        } else {
            Some((ih as usize, iw as usize))
        }
    }

    /// 执行卷积运算（Rayon 并行版本）
    fn convolve(&self, input: &Tensor, kernel: &Tensor) -> Tensor {
        let (batch_size, in_h, in_w, in_c) = (
            input.shape()[0],
            input.shape()[1],
            input.shape()[2],
            input.shape()[3],
        );
        let out_c = kernel.shape()[3];
        let (k_h, k_w) = self.kernel_size;
        let (out_h, out_w) = (self.shape[1], self.shape[2]);
        let single_sample_size = out_h * out_w * out_c;

        let batch_results: Vec<Vec<f32>> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let mut sample_data = vec![0.0f32; single_sample_size];
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        for kh in 0..k_h {
                            for kw in 0..k_w {
                                let Some((ih, iw)) =
                                    self.input_coord((oh, ow), (kh, kw), (in_h, in_w))
                                else {
                                    continue;
                                };
                                for ic in 0..in_c {
                                    let input_val = input[[b, ih, iw, ic]];
                                    let base = (oh * out_w + ow) * out_c;
                                    for oc in 0..out_c {
                                        sample_data[base + oc] +=
                                            input_val * kernel[[kh, kw, ic, oc]];
                                    }
                                }
                            }
                        }
                    }
                }
                sample_data
            })
            .collect();

        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        Tensor::new(&all_data, &self.shape)
    }
}

impl TraitNode for Conv2d {
    fn kind(&self) -> OpKind {
        OpKind::Conv2D
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
        let input = parent(parents, 0, "Conv2D")?;
        let kernel = parent(parents, 1, "Conv2D")?;
        self.value = Some(self.convolve(input, kernel));
        Ok(())
    }

    /// 对于 Y = conv(X, K):
    /// - dL/dX: 转置卷积（把上游梯度按核散布回输入位置）
    /// - dL/dK: 输入与上游梯度的相关运算，跨 batch 累加
    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let input = parent(parents, 0, "Conv2D")?;
        let kernel = parent(parents, 1, "Conv2D")?;

        let (batch_size, in_h, in_w, in_c) = (
            input.shape()[0],
            input.shape()[1],
            input.shape()[2],
            input.shape()[3],
        );
        let (k_h, k_w) = self.kernel_size;
        let (out_h, out_w, out_c) = (self.shape[1], self.shape[2], self.shape[3]);

        match parent_index {
            0 => {
                // ========== dL/dX ==========
                let single_sample_size = in_h * in_w * in_c;
                let batch_results: Vec<Vec<f32>> = (0..batch_size)
                    .into_par_iter()
                    .map(|b| {
                        let mut sample_grad = vec![0.0f32; single_sample_size];
                        for oh in 0..out_h {
                            for ow in 0..out_w {
                                for kh in 0..k_h {
                                    for kw in 0..k_w {
                                        let Some((ih, iw)) =
                                            self.input_coord((oh, ow), (kh, kw), (in_h, in_w))
                                        else {
                                            continue;
                                        };
                                        let base = (ih * in_w + iw) * in_c;
                                        for ic in 0..in_c {
                                            let mut acc = 0.0f32;
                                            for oc in 0..out_c {
                                                acc += upstream_grad[[b, oh, ow, oc]]
                                                    * kernel[[kh, kw, ic, oc]];
                                            }
                                            sample_grad[base + ic] += acc;
                                        }
                                    }
                                }
                            }
                        }
                        sample_grad
                    })
                    .collect();

                let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
                Ok(Tensor::new(&all_data, input.shape()))
            }
            1 => {
                // ========== dL/dK ==========
                let kernel_size = k_h * k_w * in_c * out_c;
                let batch_kernel_grads: Vec<Vec<f32>> = (0..batch_size)
                    .into_par_iter()
                    .map(|b| {
                        let mut sample_kernel_grad = vec![0.0f32; kernel_size];
                        for oh in 0..out_h {
                            for ow in 0..out_w {
                                for kh in 0..k_h {
                                    for kw in 0..k_w {
                                        let Some((ih, iw)) =
                                            self.input_coord((oh, ow), (kh, kw), (in_h, in_w))
                                        else {
                                            continue;
                                        };
                                        for ic in 0..in_c {
                                            let input_val = input[[b, ih, iw, ic]];
                                            let base = ((kh * k_w + kw) * in_c + ic) * out_c;
                                            for oc in 0..out_c {
                                                sample_kernel_grad[base + oc] +=
                                                    input_val * upstream_grad[[b, oh, ow, oc]];
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        sample_kernel_grad
                    })
                    .collect();

                let mut total_kernel_grad = vec![0.0f32; kernel_size];
                for sample_grad in batch_kernel_grads {
                    for (total, g) in total_kernel_grad.iter_mut().zip(sample_grad) {
                        *total += g;
                    }
                }
                Ok(Tensor::new(&total_kernel_grad, kernel.shape()))
            }
            _ => Err(invalid_parent_index("Conv2D", parent_index)),
        }
    }

    fn describe(&self) -> NodeTypeDescriptor {
        NodeTypeDescriptor::Conv2D {
            strides: self.strides,
            padding: self.padding,
        }
    }
}
