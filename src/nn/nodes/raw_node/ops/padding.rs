use serde::{Deserialize, Serialize};

/// 卷积/池化的填充方式（语义同常见框架的 VALID / SAME）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Padding {
    /// 不填充，窗口必须完全落在输入内
    #[default]
    Valid,
    /// 填充使输出长度为`ceil(input / stride)`，多余的填充放在后侧
    Same,
}

impl Padding {
    /// 计算单个空间维度上的（输出长度, 前侧填充量）。窗口超出输入等无效组合返回None
    pub fn output_and_pad(self, input: usize, kernel: usize, stride: usize) -> Option<(usize, usize)> {
        if kernel == 0 || stride == 0 || input == 0 {
            return None;
        }
        match self {
            Self::Valid => {
                if kernel > input {
                    return None;
                }
                Some(((input - kernel) / stride + 1, 0))
            }
            Self::Same => {
                let output = input.div_ceil(stride);
                let pad_total = ((output - 1) * stride + kernel).saturating_sub(input);
                Some((output, pad_total / 2))
            }
        }
    }
}
