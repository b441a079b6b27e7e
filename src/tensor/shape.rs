use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Axis, Ix2, IxDyn};

impl Tensor {
    /// 在元素总数不变的前提下改变形状（行优先）
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let target_size: usize = shape.iter().product();
        assert!(
            target_size == self.size(),
            "{}",
            TensorError::IncompatibleShape {
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: shape.to_vec(),
            }
        );
        let data = self
            .data
            .to_shape(IxDyn(shape))
            .expect("元素数量已校验")
            .into_owned();
        Self::from_array(data)
    }

    /// 判断两个张量能否按 NumPy 规则广播：从右向左对齐，每一维须相等或其中之一为 1
    pub fn can_broadcast_with(&self, other: &Self) -> bool {
        self.shape()
            .iter()
            .rev()
            .zip(other.shape().iter().rev())
            .all(|(&a, &b)| a == b || a == 1 || b == 1)
    }

    /// 二维矩阵的转置
    pub fn transpose(&self) -> Self {
        let matrix = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .unwrap_or_else(|_| panic!("只能转置二维张量，得到形状{:?}", self.shape()));
        Self::from_array(matrix.t().to_owned().into_dyn())
    }

    /// 广播的逆过程：把本张量按求和归约到`target`形状。
    /// 多出的前导维直接求和，`target`中为1的维度求和后保留
    pub fn sum_to_shape(&self, target: &[usize]) -> Self {
        assert!(
            target.len() <= self.dimension(),
            "{}",
            TensorError::IncompatibleShape {
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: target.to_vec(),
            }
        );
        let mut data = self.data.clone();
        while data.ndim() > target.len() {
            data = data.sum_axis(Axis(0));
        }
        for (axis, &dim) in target.iter().enumerate() {
            if dim == 1 && data.shape()[axis] != 1 {
                data = data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
            }
        }
        Self::from_array(data)
    }
}
