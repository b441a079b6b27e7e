//! cnnvis 命令行：对已保存的检查点做激活值或反卷积可视化

use anyhow::{Context, Result, bail};
use clap::Parser;
use cnnvis::tensor::Tensor;
use cnnvis::vis::{ValueFeed, VisConfig, VisMethod, Visualizer, parse_layer_list};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cnnvis")]
#[command(author, version)]
#[command(about = "冻结卷积网络的特征可视化")]
#[command(long_about = "对检查点中的卷积网络做逐层激活值或反卷积重建。

示例：
  # 所有 ReLU 层的激活值
  cnnvis --checkpoint model/net.meta --feed input=img.npy --layers r --method act

  # conv1 的每张特征图的反卷积重建
  cnnvis --checkpoint model/net.meta --feed input=img.npy --layers conv1 --method deconv

层请求：
  r            全部激活层
  p            全部池化层
  c            全部卷积层
  其他         按节点名精确匹配")]
struct Cli {
    /// 增加日志详细程度（-v, -vv, -vvv）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 检查点的 .meta 文件
    #[arg(long, value_name = "META")]
    checkpoint: PathBuf,

    /// 喂值，形如`name=file.npy`，可重复
    #[arg(long = "feed", value_name = "NAME=NPY")]
    feeds: Vec<String>,

    /// 逗号分隔的层请求
    #[arg(long, default_value = "r", value_name = "LAYERS")]
    layers: String,

    /// 可视化方法：act 或 deconv
    #[arg(long, default_value = "deconv", value_name = "METHOD")]
    method: String,

    /// 反卷积的重建目标张量，缺省为每层的第一个输入
    #[arg(long, value_name = "NAME")]
    input_tensor: Option<String>,

    /// 每组同时求值的梯度数
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// JSON 配置文件
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    let config = build_config(&cli)?;
    let method: VisMethod = cli.method.parse()?;
    let value_feed = load_feeds(&cli.feeds)?;
    let layers = parse_layer_list(&cli.layers);

    let visualizer = Visualizer::new(config)?;
    let report = visualizer
        .run(
            cli.checkpoint.as_path(),
            &value_feed,
            cli.input_tensor.as_deref(),
            &layers,
            method,
        )
        .with_context(|| format!("可视化`{}`失败", cli.checkpoint.display()))?;

    for layer in &report.layers {
        println!(
            "{:<24} {:<10} {} 个数组",
            layer.layer,
            layer.op_kind.to_string(),
            layer.result.len()
        );
    }
    for skipped in &report.skipped {
        println!("{:<24} 已跳过：{}", skipped.request, skipped.reason);
    }
    if !report.artifacts.is_empty() {
        println!("共写出 {} 个文件", report.artifacts.len());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<VisConfig> {
    let mut config = match &cli.config {
        Some(path) => VisConfig::from_json_file(path)
            .with_context(|| format!("读取配置`{}`失败", path.display()))?,
        None => VisConfig::default(),
    };
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir.clone_from(log_dir);
    }
    if let Some(out_dir) = &cli.out_dir {
        config.out_dir.clone_from(out_dir);
    }
    Ok(config)
}

fn load_feeds(feeds: &[String]) -> Result<ValueFeed> {
    let mut value_feed = ValueFeed::with_capacity(feeds.len());
    for feed in feeds {
        let Some((name, path)) = feed.split_once('=') else {
            bail!("喂值`{feed}`的格式应为 name=file.npy");
        };
        let tensor =
            Tensor::load_npy(path).with_context(|| format!("读取喂值文件`{path}`失败"))?;
        value_feed.insert(name.to_string(), tensor);
    }
    Ok(value_feed)
}
