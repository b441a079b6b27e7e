use super::Tensor;
use ndarray::IxDyn;
use std::ops::{Index, IndexMut};

// 固定维数的索引，如`t[[b, h, w, c]]`
impl<const N: usize> Index<[usize; N]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; N]) -> &f32 {
        &self.data[IxDyn(&index)]
    }
}

impl<const N: usize> IndexMut<[usize; N]> for Tensor {
    fn index_mut(&mut self, index: [usize; N]) -> &mut f32 {
        &mut self.data[IxDyn(&index)]
    }
}
