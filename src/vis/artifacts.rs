/*
 * @Date         : 2026-10-15
 * @Description  : 可视化结果落盘：逐层 .npy 与运行摘要
 *
 * 目录结构：
 * - `{out_dir}/{layer}/activation.npy`
 * - `{out_dir}/{layer}/deconv_{i}.npy`（i 为特征图编号）
 * - `{log_dir}/summary.json`
 */

use super::VisError;
use super::visualizer::{LayerVisualization, VisMethod, VisReport, VisResult};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 把节点名转成可用作目录名的字符串
pub fn sanitize_layer_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// 一次运行内各层的输出目录名。清洗后重名的层（如`a/b`与`a_b`）依次加`_1`、`_2`后缀
#[derive(Debug, Default)]
pub(crate) struct LayerDirNames {
    used: HashSet<String>,
}

impl LayerDirNames {
    pub(crate) fn assign(&mut self, layer: &str) -> String {
        let base = sanitize_layer_name(layer);
        let mut name = base.clone();
        let mut suffix = 1;
        while !self.used.insert(name.clone()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        if name != base {
            warn!("{layer} 的输出目录`{base}`已被其他层占用，改写到`{name}`");
        }
        name
    }
}

/// 把单层结果写到`layer_dir`下，返回写出的文件
pub fn write_layer(layer_dir: &Path, layer: &LayerVisualization) -> Result<Vec<PathBuf>, VisError> {
    fs::create_dir_all(layer_dir)?;

    let mut written = Vec::new();
    match &layer.result {
        VisResult::Activation(tensor) => {
            let path = layer_dir.join("activation.npy");
            tensor
                .save_npy(&path)
                .map_err(|e| VisError::Npy(format!("{}: {e}", path.display())))?;
            written.push(path);
        }
        VisResult::Reconstructions(tensors) => {
            for (i, tensor) in tensors.iter().enumerate() {
                let path = layer_dir.join(format!("deconv_{i}.npy"));
                tensor
                    .save_npy(&path)
                    .map_err(|e| VisError::Npy(format!("{}: {e}", path.display())))?;
                written.push(path);
            }
        }
    }
    Ok(written)
}

#[derive(Serialize)]
struct LayerSummary<'a> {
    layer: &'a str,
    op_type: &'static str,
    arrays: usize,
    shape: &'a [usize],
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct SkippedSummary<'a> {
    request: &'a str,
    reason: &'a str,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    method: &'static str,
    layers: Vec<LayerSummary<'a>>,
    skipped: Vec<SkippedSummary<'a>>,
}

/// 在`log_dir`下写出本次运行的摘要
pub fn write_summary(log_dir: &Path, report: &VisReport) -> Result<PathBuf, VisError> {
    fs::create_dir_all(log_dir)?;
    let summary = RunSummary {
        method: match report.method {
            VisMethod::Activation => "act",
            VisMethod::Deconv => "deconv",
        },
        layers: report
            .layers
            .iter()
            .map(|layer| LayerSummary {
                layer: &layer.layer,
                op_type: layer.op_kind.type_name(),
                arrays: layer.result.len(),
                shape: layer.result.first_shape(),
                elapsed_ms: layer.elapsed.as_millis(),
            })
            .collect(),
        skipped: report
            .skipped
            .iter()
            .map(|s| SkippedSummary {
                request: &s.request,
                reason: &s.reason,
            })
            .collect(),
    };

    let path = log_dir.join("summary.json");
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| VisError::InvalidInput(format!("运行摘要序列化失败: {e}")))?;
    fs::write(&path, json)?;
    Ok(path)
}
