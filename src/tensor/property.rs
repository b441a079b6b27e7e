/*
 * @Date         : 2026-10-15
 * @Description  : 本类仅包含一些属性方法，不包含任何运算方法，所以不会需要用到mut
 */

use super::Tensor;
use ndarray::{ArrayD, ArrayViewD};

impl Tensor {
    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// 取出底层数组（消耗自身）
    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数
    /// 即`shape()`的元素个数--如：形状为`[]`的标量阶数为0，向量阶数为1，矩阵阶数为2，以此类推
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 计算张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断两个张量的形状是否严格一致。如：形状为 [1, 4]，[1, 4]和[4]是不一致的，会返回false
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 判断张量是否为标量
    pub fn is_scalar(&self) -> bool {
        self.size() == 1
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 以行优先顺序返回所有元素
    pub fn data_as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .expect("张量内部数组总是以标准布局存储")
    }
}
