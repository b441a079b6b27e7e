/*
 * @Date         : 2026-10-15
 * @Description  : 可视化配置
 */

use super::VisError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 可视化配置。所有字段都有默认值，JSON 中可以只写需要改动的部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisConfig {
    /// 每组同时求值的梯度数 N（反卷积时预先构建 N 个梯度计划并复用）
    pub batch_size: usize,
    /// 中转检查点所在目录
    pub checkpoint_dir: PathBuf,
    /// 中转检查点的文件名前缀
    pub checkpoint_name: String,
    pub log_dir: PathBuf,
    pub out_dir: PathBuf,
    /// 是否把结果写成 .npy 文件
    pub save_artifacts: bool,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            checkpoint_dir: PathBuf::from("model"),
            checkpoint_name: "tmp-model".to_string(),
            log_dir: PathBuf::from("./Log"),
            out_dir: PathBuf::from("./Output"),
            save_artifacts: true,
        }
    }
}

impl VisConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VisError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            VisError::InvalidInput(format!("配置文件`{}`解析失败: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VisError> {
        if self.batch_size == 0 {
            return Err(VisError::InvalidInput("batch_size 必须大于0".to_string()));
        }
        if self.checkpoint_name.is_empty() {
            return Err(VisError::InvalidInput("checkpoint_name 不能为空".to_string()));
        }
        Ok(())
    }

    /// 中转检查点的前缀，如`model/tmp-model`
    pub fn checkpoint_prefix(&self) -> PathBuf {
        self.checkpoint_dir.join(&self.checkpoint_name)
    }

    pub fn with_dirs(mut self, log_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self.out_dir = out_dir.into();
        self
    }
}
