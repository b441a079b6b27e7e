use crate::errors::TensorError;
use crate::tensor::Tensor;
use ndarray::Ix2;

impl Tensor {
    /// 二维矩阵乘法：[m, k] x [k, n] -> [m, n]
    pub fn mat_mul(&self, other: &Self) -> Self {
        let incompatible = || TensorError::IncompatibleShape {
            tensor1_shape: self.shape().to_vec(),
            tensor2_shape: other.shape().to_vec(),
        };
        let a = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .unwrap_or_else(|_| panic!("{}", incompatible()));
        let b = other
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .unwrap_or_else(|_| panic!("{}", incompatible()));
        assert!(a.ncols() == b.nrows(), "{}", incompatible());
        Self::from_array(a.dot(&b).into_dyn())
    }
}
