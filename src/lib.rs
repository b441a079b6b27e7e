//! # cnnvis
//!
//! 冻结卷积网络的事后特征可视化：
//! - 逐层激活值；
//! - 反卷积重建（引导反向传播）：对某层的每张特征图，求其关于输入的梯度，
//!   ReLU 的反传只保留正的上游梯度。
//!
//! 模型先被存为检查点，再在隔离的新会话里重新加载，所以调用方的图不会被修改。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod vis;

pub use vis::{
    LayerKind, LayerRequest, ValueFeed, VisConfig, VisError, VisMethod, Visualizer,
    activation_visualization, deconv_visualization,
};
