/*
 * @Date         : 2026-10-15
 * @Description  : 可视化的总流程
 *
 * 模型来源 -> 存为检查点 -> （反卷积时注册并启用梯度覆盖）在隔离的新会话中重新加载
 * -> 展开层请求 -> 逐层解析并计算 -> 可选地写出结果
 *
 * 单层的状态：RESOLVED -> PARSED -> {ACTIVATED | RECONSTRUCTED} -> DONE，
 * 解析失败则跳过该层继续下一层。
 */

use super::artifacts::{self, LayerDirNames};
use super::loader::{IntoModelSource, load_model, save_model};
use super::parser::{ParsedLayer, ValueFeed, parse};
use super::resolver::{LayerRequest, SkippedLayer, resolve};
use super::{VisConfig, VisError, engine};
use crate::nn::{GradientOverrideMap, OpKind, Session, register_custom_gradients};
use crate::tensor::Tensor;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 可视化方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisMethod {
    /// 层的原始激活值
    Activation,
    /// 引导反向传播重建：每张特征图得到一张输入空间的重建
    Deconv,
}

impl VisMethod {
    /// 反卷积需要的梯度覆盖映射；调用时确保自定义梯度已注册
    fn gradient_override_map(self) -> Option<GradientOverrideMap> {
        match self {
            Self::Activation => None,
            Self::Deconv => {
                if register_custom_gradients() {
                    debug!("首次使用反卷积，已注册自定义梯度");
                }
                Some(GradientOverrideMap::deconv_default())
            }
        }
    }
}

impl FromStr for VisMethod {
    type Err = VisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "act" | "activation" => Ok(Self::Activation),
            "deconv" | "deconvolution" => Ok(Self::Deconv),
            other => Err(VisError::InvalidInput(format!(
                "未知的可视化方法`{other}`，可选 act / deconv"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub enum VisResult {
    Activation(Tensor),
    /// 按特征图编号排列的重建
    Reconstructions(Vec<Tensor>),
}

impl VisResult {
    /// 结果中数组的个数
    pub fn len(&self) -> usize {
        match self {
            Self::Activation(_) => 1,
            Self::Reconstructions(tensors) => tensors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn first_shape(&self) -> &[usize] {
        match self {
            Self::Activation(tensor) => tensor.shape(),
            Self::Reconstructions(tensors) => tensors.first().map_or(&[][..], Tensor::shape),
        }
    }
}

/// 单层的可视化结果
#[derive(Debug, Clone)]
pub struct LayerVisualization {
    pub layer: String,
    pub op_kind: OpKind,
    pub result: VisResult,
    pub elapsed: Duration,
}

/// 一次可视化调用的完整结果
#[derive(Debug, Clone)]
pub struct VisReport {
    pub method: VisMethod,
    pub layers: Vec<LayerVisualization>,
    pub skipped: Vec<SkippedLayer>,
    /// 写出的文件（未开启落盘时为空）
    pub artifacts: Vec<PathBuf>,
}

impl VisReport {
    fn new(method: VisMethod) -> Self {
        Self {
            method,
            layers: Vec::new(),
            skipped: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn layer(&self, name: &str) -> Option<&LayerVisualization> {
        self.layers.iter().find(|layer| layer.layer == name)
    }
}

pub struct Visualizer {
    config: VisConfig,
}

impl Visualizer {
    pub fn new(config: VisConfig) -> Result<Self, VisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub const fn config(&self) -> &VisConfig {
        &self.config
    }

    /// 执行一次可视化
    ///
    /// # 参数
    /// - `source`: 模型来源
    /// - `value_feed`: 按名字提供的喂值
    /// - `input_tensor`: 重建目标张量名，缺省时为各层的第一个输入
    /// - `layers`: 层请求
    pub fn run<'a>(
        &self,
        source: impl IntoModelSource<'a>,
        value_feed: &ValueFeed,
        input_tensor: Option<&str>,
        layers: &[LayerRequest],
        method: VisMethod,
    ) -> Result<VisReport, VisError> {
        let source = source.into_model_source()?;
        let meta_path = save_model(&source, &self.config)?;

        let override_map = method.gradient_override_map();
        let mut session = load_model(&meta_path, override_map.as_ref())?;

        let resolution = resolve(session.graph(), layers);
        let mut report = VisReport::new(method);
        report.skipped = resolution.skipped;
        let mut dir_names = LayerDirNames::default();

        for layer_name in &resolution.targets {
            match self.visualize_layer(&mut session, layer_name, value_feed, input_tensor, method) {
                Ok(layer) => {
                    info!(
                        "{} 层重建完成，耗时 {:.3} s",
                        layer.layer,
                        layer.elapsed.as_secs_f64()
                    );
                    if self.config.save_artifacts {
                        let layer_dir = self.config.out_dir.join(dir_names.assign(&layer.layer));
                        match artifacts::write_layer(&layer_dir, &layer) {
                            Ok(paths) => report.artifacts.extend(paths),
                            Err(e) => warn!("{} 层的结果写出失败：{e}", layer.layer),
                        }
                    }
                    report.layers.push(layer);
                }
                Err(e) if e.is_soft() => {
                    warn!("跳过 {layer_name}：{e}");
                    report.skipped.push(SkippedLayer {
                        request: layer_name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    session.close();
                    return Err(e);
                }
            }
        }

        if self.config.save_artifacts {
            match artifacts::write_summary(&self.config.log_dir, &report) {
                Ok(path) => report.artifacts.push(path),
                Err(e) => warn!("运行摘要写出失败：{e}"),
            }
        }
        session.close();
        Ok(report)
    }

    fn visualize_layer(
        &self,
        session: &mut Session,
        layer_name: &str,
        value_feed: &ValueFeed,
        input_tensor: Option<&str>,
        method: VisMethod,
    ) -> Result<LayerVisualization, VisError> {
        let start = Instant::now();
        let parsed = parse(session.graph(), layer_name, value_feed)?;
        debug!("{layer_name}：已解析（{}，输出{:?}）", parsed.op.kind, parsed.op.output_shape);

        let result = self.compute_layer(session, &parsed, input_tensor, method)?;
        Ok(LayerVisualization {
            layer: layer_name.to_string(),
            op_kind: parsed.op.kind,
            result,
            elapsed: start.elapsed(),
        })
    }

    /// 对已解析的层计算激活值或重建。会话中的图必须是解析时的那张图
    pub(crate) fn compute_layer(
        &self,
        session: &mut Session,
        parsed: &ParsedLayer,
        input_tensor: Option<&str>,
        method: VisMethod,
    ) -> Result<VisResult, VisError> {
        parsed.ensure_bound_to(session)?;
        let result = match method {
            VisMethod::Activation => {
                VisResult::Activation(engine::activation(session, parsed.output, &parsed.feed)?)
            }
            VisMethod::Deconv => {
                let input = parsed.resolve_input(session.graph(), input_tensor)?;
                VisResult::Reconstructions(engine::deconvolve(
                    session,
                    parsed.output,
                    input,
                    &parsed.feed,
                    self.config.batch_size,
                )?)
            }
        };
        Ok(result)
    }
}
