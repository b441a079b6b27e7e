/*
 * @Date         : 2026-10-15
 * @Description  : 运算节点。卷积、池化与 LRN 统一采用 NHWC 布局（最后一维为通道/特征图）
 */

mod add;
mod bias_add;
mod conv2d;
mod feature_map_select;
mod lrn;
mod mat_mul;
mod max_pool;
mod padding;
mod relu;
mod reshape;

pub(in crate::nn) use add::Add;
pub(in crate::nn) use bias_add::BiasAdd;
pub(in crate::nn) use conv2d::Conv2d;
pub(in crate::nn) use feature_map_select::FeatureMapSelect;
pub(in crate::nn) use lrn::Lrn;
pub use lrn::LrnParams;
pub(in crate::nn) use mat_mul::MatMul;
pub(in crate::nn) use max_pool::MaxPool;
pub use padding::Padding;
pub(in crate::nn) use relu::{Relu, relu_grad};
pub(in crate::nn) use reshape::Reshape;

use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 取出第`index`个父节点的值；父节点数量不符说明图的构建有问题
fn parent<'a>(parents: &[&'a Tensor], index: usize, op: &str) -> Result<&'a Tensor, GraphError> {
    parents.get(index).copied().ok_or_else(|| {
        GraphError::ComputationError(format!(
            "{op}缺少第{index}个父节点的值。不该触及本错误，否则说明crate代码有问题"
        ))
    })
}

fn invalid_parent_index(op: &str, parent_index: usize) -> GraphError {
    GraphError::InvalidOperation(format!("{op}没有第{parent_index}个父节点"))
}
