/*
 * @Date         : 2026-10-15
 * @Description  : 沿最后一维（通道/特征图维）的选取与回填
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Axis, IxDyn};

impl Tensor {
    /// 沿最后一维选取第`index`个切片，结果比原张量少一维。
    /// 如：形状为[1, 4, 4, 8]的张量选取后形状为[1, 4, 4]
    pub fn select_last_axis(&self, index: usize) -> Self {
        let last = self.last_axis_len();
        assert!(
            index < last,
            "{}",
            TensorError::IndexOutOfRange {
                index,
                len: last
            }
        );
        let axis = Axis(self.dimension() - 1);
        Self::from_array(self.data.index_axis(axis, index).to_owned())
    }

    /// `select_last_axis`的逆过程：把本张量放回一个最后一维长度为`len`的全零张量的第`index`个切片
    pub fn scatter_last_axis(&self, index: usize, len: usize) -> Self {
        assert!(
            index < len,
            "{}",
            TensorError::IndexOutOfRange { index, len }
        );
        let mut shape = self.shape().to_vec();
        shape.push(len);
        let mut data = ndarray::ArrayD::<f32>::zeros(IxDyn(&shape));
        let axis = Axis(shape.len() - 1);
        data.index_axis_mut(axis, index).assign(&self.data);
        Self::from_array(data)
    }

    /// 最后一维的长度（标量为0）
    pub fn last_axis_len(&self) -> usize {
        self.shape().last().copied().unwrap_or(0)
    }
}
