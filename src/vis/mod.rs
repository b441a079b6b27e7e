/*
 * @Date         : 2026-10-15
 * @Description  : 卷积网络特征可视化：激活值与反卷积（引导反向传播）重建
 */

mod artifacts;
mod config;
mod engine;
mod error;
mod loader;
mod parser;
mod resolver;
mod visualizer;

pub use artifacts::sanitize_layer_name;
pub use config::VisConfig;
pub use engine::{activation, deconvolve};
pub use error::VisError;
pub use loader::{DefaultContext, IntoModelSource, ModelSource, load_model, save_model};
pub use parser::{ParsedLayer, ValueFeed, parse, rebind};
pub use resolver::{LayerKind, LayerRequest, Resolution, SkippedLayer, parse_layer_list, resolve};
pub use visualizer::{LayerVisualization, VisMethod, VisReport, VisResult, Visualizer};

use std::path::Path;
use tracing::warn;

/// 逐层激活值可视化
///
/// 返回`Ok(true)`表示流程完成（个别层可能被跳过），`Ok(false)`表示输入无效、什么都没有做；
/// 其余错误（检查点无法恢复、计算失败等）原样返回。
pub fn activation_visualization<'a>(
    source: impl IntoModelSource<'a>,
    value_feed: &ValueFeed,
    input_tensor: Option<&str>,
    layers: &[LayerRequest],
    log_dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<bool, VisError> {
    run_default(
        source,
        value_feed,
        input_tensor,
        layers,
        log_dir.as_ref(),
        out_dir.as_ref(),
        VisMethod::Activation,
    )
}

/// 反卷积可视化：对每层的每张特征图，得到一张与输入同形状的重建
///
/// 返回值的含义与[`activation_visualization`]相同。
pub fn deconv_visualization<'a>(
    source: impl IntoModelSource<'a>,
    value_feed: &ValueFeed,
    input_tensor: Option<&str>,
    layers: &[LayerRequest],
    log_dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<bool, VisError> {
    run_default(
        source,
        value_feed,
        input_tensor,
        layers,
        log_dir.as_ref(),
        out_dir.as_ref(),
        VisMethod::Deconv,
    )
}

fn run_default<'a>(
    source: impl IntoModelSource<'a>,
    value_feed: &ValueFeed,
    input_tensor: Option<&str>,
    layers: &[LayerRequest],
    log_dir: &Path,
    out_dir: &Path,
    method: VisMethod,
) -> Result<bool, VisError> {
    let config = VisConfig::default().with_dirs(log_dir, out_dir);
    let visualizer = Visualizer::new(config)?;
    match visualizer.run(source, value_feed, input_tensor, layers, method) {
        Ok(_) => Ok(true),
        Err(VisError::InvalidInput(reason)) => {
            warn!("{reason}");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests;
