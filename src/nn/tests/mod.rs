mod gradient_plan;
mod gradient_registry;
mod graph_basic;
mod node_feature_map_select;
mod node_lrn;
mod node_mat_mul;

use crate::nn::{FeedDict, NodeId};
use crate::tensor::Tensor;
use std::path::{Path, PathBuf};

/// 单个占位符的喂值
fn feed_of(id: NodeId, value: Tensor) -> FeedDict {
    let mut feed = FeedDict::new();
    feed.insert(id, value);
    feed
}

/// 每个测试独占的临时目录（进程号区分并行运行的测试二进制），离开作用域时删除
struct TempDir(PathBuf);

impl std::ops::Deref for TempDir {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn unique_temp_dir(name: &str) -> TempDir {
    let dir = std::env::temp_dir().join(format!("cnnvis_nn_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    TempDir(dir)
}
