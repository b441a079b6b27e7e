/*
 * @Date         : 2026-10-15
 * @Description  : 梯度覆盖注册表
 *
 * 进程级、只注册一次的自定义梯度规则表。反向传播时，带有覆盖规则的节点不再使用
 * 自身的原生梯度，而是到这里查找对应规则：
 * - GuidedRelu：导向反向传播，只让正的上游梯度流过正的激活
 * - PassThroughLrn：LRN 的梯度直接透传（恒等）
 *
 * 规则用封闭枚举表示，规则到实现的映射由穷尽匹配在编译期保证完整。
 */

use super::nodes::{GradientContext, OpKind, relu_grad};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// 梯度覆盖规则的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradientOverride {
    GuidedRelu,
    PassThroughLrn,
}

impl GradientOverride {
    pub const ALL: [Self; 2] = [Self::GuidedRelu, Self::PassThroughLrn];

    /// 规则名（与原生梯度的名字区分开，原生规则在别处依然可用）
    pub const fn key(self) -> &'static str {
        match self {
            Self::GuidedRelu => "GuidedRelu",
            Self::PassThroughLrn => "NormGrad",
        }
    }

    /// 本规则适用的节点类型
    pub const fn applies_to(self) -> OpKind {
        match self {
            Self::GuidedRelu => OpKind::Relu,
            Self::PassThroughLrn => OpKind::Lrn,
        }
    }

    fn gradient_fn(self) -> GradientFn {
        match self {
            Self::GuidedRelu => guided_relu_grad,
            Self::PassThroughLrn => pass_through_grad,
        }
    }
}

impl fmt::Display for GradientOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 覆盖规则：由前向信息和上游梯度得到对（唯一）输入的梯度
pub(in crate::nn) type GradientFn = fn(&GradientContext<'_>, &Tensor) -> Tensor;

/// 导向反向传播：上游梯度为正处沿用 ReLU 的原生梯度，其余为0
fn guided_relu_grad(ctx: &GradientContext<'_>, grad: &Tensor) -> Tensor {
    let native = relu_grad(grad, ctx.output);
    native.where_with_tensor(grad, |_, g| g > 0.0, |n, _| n, |_, _| 0.0)
}

fn pass_through_grad(_ctx: &GradientContext<'_>, grad: &Tensor) -> Tensor {
    grad.clone()
}

struct GradientRegistry {
    rules: HashMap<GradientOverride, GradientFn>,
}

static REGISTRY: OnceLock<GradientRegistry> = OnceLock::new();

/// 注册全部自定义梯度规则。幂等：多次调用与调用一次效果相同。
/// 返回本次调用是否真的执行了注册
pub fn register_custom_gradients() -> bool {
    let registered_now = AtomicBool::new(false);
    REGISTRY.get_or_init(|| {
        registered_now.store(true, Ordering::Relaxed);
        let rules = GradientOverride::ALL
            .iter()
            .map(|&rule| (rule, rule.gradient_fn()))
            .collect();
        tracing::debug!("已注册自定义梯度规则：{:?}", GradientOverride::ALL);
        GradientRegistry { rules }
    });
    registered_now.load(Ordering::Relaxed)
}

pub fn is_registered(rule: GradientOverride) -> bool {
    REGISTRY
        .get()
        .is_some_and(|registry| registry.rules.contains_key(&rule))
}

/// 已注册规则的数量（未注册时为0）
pub fn registered_count() -> usize {
    REGISTRY.get().map_or(0, |registry| registry.rules.len())
}

pub(in crate::nn) fn lookup(rule: GradientOverride) -> Option<GradientFn> {
    REGISTRY.get()?.rules.get(&rule).copied()
}

/// 节点类型到覆盖规则的映射，在构建/导入图期间生效
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradientOverrideMap {
    entries: HashMap<OpKind, GradientOverride>,
}

impl GradientOverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 反卷积可视化使用的映射：{Relu → GuidedRelu, LRN → PassThroughLrn}
    pub fn deconv_default() -> Self {
        Self::new()
            .with(OpKind::Relu, GradientOverride::GuidedRelu)
            .with(OpKind::Lrn, GradientOverride::PassThroughLrn)
    }

    pub fn with(mut self, kind: OpKind, rule: GradientOverride) -> Self {
        self.entries.insert(kind, rule);
        self
    }

    pub fn get(&self, kind: OpKind) -> Option<GradientOverride> {
        self.entries.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpKind, GradientOverride)> + '_ {
        self.entries.iter().map(|(&kind, &rule)| (kind, rule))
    }
}
