/*
 * @Date         : 2026-10-15
 * @Description  : 张量：计算图中流动的数据，底层为 ndarray 的动态维数组
 */

use ndarray::{Array, ArrayD, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::errors::TensorError;

mod ops {
    pub mod add;
    pub mod eq;
    pub mod mat_mul;
    pub mod mul;
}

mod filter;
mod index;
mod property;
mod save_load;
mod shape;
mod slice;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：卷积相关的张量统一采用 NHWC 布局，即最后一维为通道（特征图）维。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量，`data`的长度必须和`shape`中所有元素的乘积相等（标量的`shape`为`[]`）。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        let expected: usize = shape.iter().product();
        assert!(
            expected == data.len(),
            "{}",
            TensorError::DataShapeMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        );
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec())
            .expect("数据长度已校验，构造不会失败");
        Self { data }
    }

    /// 直接由 ndarray 数组构造（统一转为行优先的标准布局）
    pub fn from_array(data: ArrayD<f32>) -> Self {
        if data.is_standard_layout() {
            Self { data }
        } else {
            Self {
                data: data.as_standard_layout().into_owned(),
            }
        }
    }

    /// 创建一个纯数标量张量，形状为`[]`
    pub fn scalar(value: f32) -> Self {
        Self::new(&[value], &[])
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::ones(IxDyn(shape)),
        }
    }

    /// 创建与`other`形状相同的全零张量
    pub fn zeros_like(other: &Self) -> Self {
        Self::zeros(other.shape())
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间
    pub fn new_random(min: f32, max: f32, shape: &[usize]) -> Self {
        let mut rng = rand::thread_rng();
        let dist = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| dist.sample(&mut rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }

    /// 创建一个服从正态分布的随机张量（Box-Muller 变换）
    pub fn new_normal(mean: f32, std_dev: f32, shape: &[usize]) -> Self {
        let mut rng = rand::thread_rng();
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            let u1: f32 = rng.r#gen();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Self::new(&data, shape)
    }
}
