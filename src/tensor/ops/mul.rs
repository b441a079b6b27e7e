/*
 * @Date         : 2026-10-15
 * @Description  : 张量的逐元素乘法（非矩阵乘法，矩阵乘法见`mat_mul`）
 */

use crate::errors::TensorError;
use crate::tensor::Tensor;
use std::ops::Mul;

impl Mul<f32> for Tensor {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self::from_array(self.data * scalar)
    }
}
impl Mul<f32> for &Tensor {
    type Output = Tensor;

    fn mul(self, scalar: f32) -> Tensor {
        Tensor::from_array(&self.data * scalar)
    }
}

impl<'b> Mul<&'b Tensor> for &Tensor {
    type Output = Tensor;

    fn mul(self, other: &'b Tensor) -> Tensor {
        assert!(
            self.can_broadcast_with(other),
            "{}",
            TensorError::IncompatibleShape {
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
        Tensor::from_array(&self.data * &other.data)
    }
}
