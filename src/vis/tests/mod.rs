mod artifacts;
mod config;
mod engine;
mod parser;
mod resolver;

use crate::nn::{GraphError, GraphInner, Padding};
use crate::tensor::Tensor;
use crate::vis::ValueFeed;
use std::path::{Path, PathBuf};

/// input[1,4,4,1] -> conv1(3张) -> relu1 -> pool1 -> conv2(4张) -> relu2
fn tiny_cnn() -> Result<GraphInner, GraphError> {
    let mut graph = GraphInner::with_name("tiny_cnn");
    let input = graph.new_placeholder_node(&[1, 4, 4, 1], Some("input"))?;
    let w1 = graph.new_const_node(&Tensor::new_normal(0.0, 1.0, &[3, 3, 1, 3]), Some("w1"))?;
    let conv1 = graph.new_conv2d_node(input, w1, (1, 1), Padding::Same, Some("conv1"))?;
    let relu1 = graph.new_relu_node(conv1, Some("relu1"))?;
    let pool1 = graph.new_max_pool_node(relu1, (2, 2), None, Padding::Valid, Some("pool1"))?;
    let w2 = graph.new_const_node(&Tensor::new_normal(0.0, 1.0, &[2, 2, 3, 4]), Some("w2"))?;
    let conv2 = graph.new_conv2d_node(pool1, w2, (1, 1), Padding::Same, Some("conv2"))?;
    graph.new_relu_node(conv2, Some("relu2"))?;
    Ok(graph)
}

fn input_feed() -> ValueFeed {
    let mut feed = ValueFeed::new();
    feed.insert("input".to_string(), Tensor::new_random(0.0, 1.0, &[1, 4, 4, 1]));
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
    let dir = std::env::temp_dir().join(format!("cnnvis_vis_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    TempDir(dir)
}
