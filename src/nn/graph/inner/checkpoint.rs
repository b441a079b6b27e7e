/*
 * @Date         : 2026-10-15
 * @Description  : GraphInner 检查点（save_checkpoint/import_meta_graph/restore）
 *
 * 一个检查点由同一前缀的两个文件组成，外加目录级的索引文件：
 * - `{prefix}.meta`: 元图，即图的拓扑描述（GraphDescriptor 的 JSON）
 * - `{prefix}.data`: 全部常量与变量的值（bincode）
 * - `checkpoint`: 索引（JSON），记录该目录下最近一次保存的前缀
 *
 * 与常见框架的 Saver 一致，保存时图中至少要有一个变量。
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::GradientOverrideMap;
use crate::nn::descriptor::GraphDescriptor;
use crate::nn::nodes::OpKind;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const META_SUFFIX: &str = ".meta";
const DATA_SUFFIX: &str = ".data";
const INDEX_FILE: &str = "checkpoint";

/// 数据文件魔数
const DATA_MAGIC: [u8; 4] = *b"CVCK";
/// 数据文件版本
const DATA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SavedTensor {
    name: String,
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct CheckpointData {
    magic: [u8; 4],
    version: u32,
    tensors: Vec<SavedTensor>,
}

#[derive(Serialize, Deserialize)]
struct CheckpointIndex {
    model_checkpoint_path: String,
    all_model_checkpoint_paths: Vec<String>,
}

/// 在路径末尾直接追加后缀（不替换扩展名，`tmp-model.v1` 这类前缀也能保持原样）
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// 元图路径 -> 检查点前缀
pub fn prefix_of_meta(meta_path: &Path) -> PathBuf {
    let raw = meta_path.to_string_lossy();
    match raw.strip_suffix(META_SUFFIX) {
        Some(prefix) => PathBuf::from(prefix),
        None => meta_path.to_path_buf(),
    }
}

fn io_error(action: &str, path: &Path, e: impl std::fmt::Display) -> GraphError {
    GraphError::Checkpoint(format!("{action}`{}`失败: {e}", path.display()))
}

/// 读取`dir`下的索引文件，返回最近一次保存的检查点前缀。没有索引文件时返回None
pub fn latest_checkpoint(dir: impl AsRef<Path>) -> Result<Option<PathBuf>, GraphError> {
    let dir = dir.as_ref();
    let index_path = dir.join(INDEX_FILE);
    if !index_path.is_file() {
        return Ok(None);
    }
    let json = fs::read_to_string(&index_path).map_err(|e| io_error("读取索引文件", &index_path, e))?;
    let index: CheckpointIndex =
        serde_json::from_str(&json).map_err(|e| io_error("解析索引文件", &index_path, e))?;

    let prefix = PathBuf::from(&index.model_checkpoint_path);
    let prefix = if prefix.is_absolute() {
        prefix
    } else {
        dir.join(prefix)
    };
    Ok(Some(prefix))
}

impl GraphInner {
    /// 保存检查点，返回元图文件路径
    ///
    /// # 示例
    /// ```ignore
    /// let meta = graph.save_checkpoint("model/tmp-model")?;
    /// // 生成：model/tmp-model.meta + model/tmp-model.data，并更新 model/checkpoint
    /// ```
    pub fn save_checkpoint(&self, prefix: impl AsRef<Path>) -> Result<PathBuf, GraphError> {
        let prefix = prefix.as_ref();
        if !self.has_variables() {
            return Err(GraphError::Checkpoint("图中没有可保存的变量".to_string()));
        }

        // 1. 收集常量与变量的值
        let mut tensors = Vec::new();
        for id in self.node_ids() {
            let node = self.get_node(id)?;
            if !matches!(node.kind(), OpKind::Const | OpKind::Variable) {
                continue;
            }
            let value = node.value().ok_or_else(|| {
                GraphError::Checkpoint(format!("{node}没有值（变量是否已初始化？）"))
            })?;
            tensors.push(SavedTensor {
                name: node.name().to_string(),
                shape: value.shape().to_vec(),
                data: value.data_as_slice().to_vec(),
            });
        }

        let dir = match prefix.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| io_error("创建目录", &dir, e))?;

        // 2. 数据文件
        let data_path = with_suffix(prefix, DATA_SUFFIX);
        let data = CheckpointData {
            magic: DATA_MAGIC,
            version: DATA_VERSION,
            tensors,
        };
        let bytes = bincode::serialize(&data).map_err(|e| io_error("序列化数据", &data_path, e))?;
        fs::write(&data_path, bytes).map_err(|e| io_error("写入数据文件", &data_path, e))?;

        // 3. 元图
        let meta_path = with_suffix(prefix, META_SUFFIX);
        let json = self
            .describe()
            .to_json()
            .map_err(|e| io_error("序列化元图", &meta_path, e))?;
        fs::write(&meta_path, json).map_err(|e| io_error("写入元图文件", &meta_path, e))?;

        // 4. 索引
        self.update_index(&dir, prefix)?;

        tracing::debug!("检查点已保存：{}", meta_path.display());
        Ok(meta_path)
    }

    fn update_index(&self, dir: &Path, prefix: &Path) -> Result<(), GraphError> {
        let index_path = dir.join(INDEX_FILE);
        let entry = prefix
            .file_name()
            .map_or_else(|| prefix.to_string_lossy(), |name| name.to_string_lossy())
            .to_string();

        let mut all_paths = fs::read_to_string(&index_path)
            .ok()
            .and_then(|json| serde_json::from_str::<CheckpointIndex>(&json).ok())
            .map(|index| index.all_model_checkpoint_paths)
            .unwrap_or_default();
        all_paths.retain(|p| p != &entry);
        all_paths.push(entry.clone());

        let index = CheckpointIndex {
            model_checkpoint_path: entry,
            all_model_checkpoint_paths: all_paths,
        };
        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| io_error("序列化索引", &index_path, e))?;
        fs::write(&index_path, json).map_err(|e| io_error("写入索引文件", &index_path, e))
    }

    /// 从元图文件导入一张全新的图（常量与变量暂无值）。
    /// 给定`override_map`时，导入在该映射的作用域内进行
    pub fn import_meta_graph(
        meta_path: impl AsRef<Path>,
        override_map: Option<&GradientOverrideMap>,
    ) -> Result<Self, GraphError> {
        let meta_path = meta_path.as_ref();
        let json = fs::read_to_string(meta_path).map_err(|e| io_error("读取元图", meta_path, e))?;
        let descriptor =
            GraphDescriptor::from_json(&json).map_err(|e| io_error("解析元图", meta_path, e))?;

        let mut graph = Self::with_name(&descriptor.name);
        match override_map {
            Some(map) => graph.with_gradient_override_map(map, |g| g.rebuild_from_descriptor(&descriptor))?,
            None => graph.rebuild_from_descriptor(&descriptor)?,
        }
        tracing::debug!(
            "已导入元图 {}（{} 个节点）",
            meta_path.display(),
            graph.nodes_count()
        );
        Ok(graph)
    }

    /// 从检查点前缀恢复常量与变量的值（按节点名对应，并检查形状）
    pub fn restore(&mut self, prefix: impl AsRef<Path>) -> Result<(), GraphError> {
        let data_path = with_suffix(prefix.as_ref(), DATA_SUFFIX);
        let bytes = fs::read(&data_path).map_err(|e| io_error("读取数据文件", &data_path, e))?;
        let data: CheckpointData =
            bincode::deserialize(&bytes).map_err(|e| io_error("解析数据文件", &data_path, e))?;

        if data.magic != DATA_MAGIC {
            return Err(GraphError::Checkpoint(format!(
                "`{}`不是有效的检查点数据文件",
                data_path.display()
            )));
        }
        if data.version != DATA_VERSION {
            return Err(GraphError::Checkpoint(format!(
                "不支持的检查点数据版本 {}（当前为 {DATA_VERSION}）",
                data.version
            )));
        }

        for saved in data.tensors {
            let id = self.get_node_by_name(&saved.name)?;
            let expected: usize = saved.shape.iter().product();
            if expected != saved.data.len() {
                return Err(GraphError::Checkpoint(format!(
                    "`{}`的数据长度{}与形状{:?}不符",
                    saved.name,
                    saved.data.len(),
                    saved.shape
                )));
            }
            let value = Tensor::new(&saved.data, &saved.shape);
            self.set_node_value(id, Some(&value))?;
        }
        tracing::debug!("已从 {} 恢复参数", data_path.display());
        Ok(())
    }
}
