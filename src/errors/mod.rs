use thiserror::Error;

/// 张量层面的错误。张量运算本身以 panic 报告这些错误（同 ndarray），
/// 计算图在调用张量运算前负责校验，以`GraphError`返回给调用方。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    #[error("数据长度{data_len}与形状{shape:?}不匹配")]
    DataShapeMismatch { data_len: usize, shape: Vec<usize> },

    #[error("张量形状不兼容：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}")]
    IncompatibleShape {
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },

    #[error("索引{index}越界，该维长度为{len}")]
    IndexOutOfRange { index: usize, len: usize },
}
