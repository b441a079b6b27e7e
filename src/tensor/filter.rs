use super::Tensor;
use ndarray::Zip;

impl Tensor {
    /// 通用的条件过滤函数，可以灵活处理张量中的元素
    ///
    /// # 参数
    /// * `condition` - 条件函数，接收元素值并返回bool
    /// * `true_fn` - 当条件为true时的值转换函数
    /// * `false_fn` - 当条件为false时的值转换函数
    ///
    /// # 示例
    /// ```
    /// use cnnvis::tensor::Tensor;
    /// let t = Tensor::new(&[-1.0, 0.0, 1.0], &[3]);
    ///
    /// // 类似 np.where(x >= 0.0, 0.0, -x)
    /// let result = t.where_with_f32(|x| x >= 0.0, |_| 0.0, |x| -x);
    /// assert_eq!(result.data_as_slice(), &[1.0, 0.0, 0.0]);
    /// ```
    pub fn where_with_f32<F, T, U>(&self, condition: F, true_fn: T, false_fn: U) -> Self
    where
        F: Fn(f32) -> bool,
        T: Fn(f32) -> f32,
        U: Fn(f32) -> f32,
    {
        let data = self.data.mapv(|x| {
            if x.is_nan() {
                f32::NAN
            } else if condition(x) {
                true_fn(x)
            } else {
                false_fn(x)
            }
        });
        Self::from_array(data)
    }

    /// 基于另一个张量的条件过滤函数，两个张量形状必须一致
    ///
    /// # 示例
    /// ```
    /// use cnnvis::tensor::Tensor;
    /// let g = Tensor::new(&[-1.0, 2.0, 3.0], &[3]);
    /// let y = Tensor::new(&[1.0, 0.0, 5.0], &[3]);
    ///
    /// // 类似 np.where(y > 0, g, 0)
    /// let result = g.where_with_tensor(&y, |_, y| y > 0.0, |g, _| g, |_, _| 0.0);
    /// assert_eq!(result.data_as_slice(), &[-1.0, 0.0, 3.0]);
    /// ```
    pub fn where_with_tensor<F, T, U>(
        &self,
        other: &Self,
        condition: F,
        true_fn: T,
        false_fn: U,
    ) -> Self
    where
        F: Fn(f32, f32) -> bool,
        T: Fn(f32, f32) -> f32,
        U: Fn(f32, f32) -> f32,
    {
        assert!(
            self.is_same_shape(other),
            "where_with_tensor要求两个张量形状一致：{:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        let data = Zip::from(&self.data).and(&other.data).map_collect(|&x, &y| {
            if x.is_nan() || y.is_nan() {
                f32::NAN
            } else if condition(x, y) {
                true_fn(x, y)
            } else {
                false_fn(x, y)
            }
        });
        Self::from_array(data)
    }
}
