use super::Tensor;
use ndarray::ArrayD;
use ndarray_npy::{read_npy, write_npy, ReadNpyError, WriteNpyError};
use std::path::Path;

impl Tensor {
    /// 以 NumPy 的`.npy`格式保存
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteNpyError> {
        write_npy(path, &self.data)
    }

    /// 从`.npy`文件读取（元素须为 f32）
    pub fn load_npy<P: AsRef<Path>>(path: P) -> Result<Self, ReadNpyError> {
        let data: ArrayD<f32> = read_npy(path)?;
        Ok(Self::from_array(data))
    }
}
