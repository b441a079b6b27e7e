/*
 * @Date         : 2026-10-15
 * @Description  : 模型加载：把任意模型来源序列化为检查点，再在隔离的新图与新会话中重新加载
 *
 * 可视化会往图里加节点、给节点挂梯度覆盖规则。先存盘再导入一张全新的图，
 * 保证这些副作用不会泄漏到调用方原来的图或会话上。
 */

use super::{VisConfig, VisError};
use crate::nn::{
    GradientOverrideMap, GraphInner, Session, latest_checkpoint, prefix_of_meta,
};
use crate::tensor::Tensor;
use std::any::Any;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 冻结图存盘时补上的占位变量名（检查点至少要有一个变量）
const FAKE_VAR_NAME: &str = "fake_var";

/// 显式的“默认上下文”：调用方当前使用的会话（可选）和图
#[derive(Clone, Copy)]
pub struct DefaultContext<'a> {
    pub session: Option<&'a Session>,
    pub graph: &'a GraphInner,
}

/// 模型来源
#[derive(Clone)]
pub enum ModelSource<'a> {
    /// 冻结图（不能含变量）
    Graph(&'a GraphInner),
    /// 会话：保存其图和当前的常量/变量值，不会关闭它
    Session(&'a Session),
    /// 已有检查点的元图路径（`.meta`），直接使用，不再保存
    Checkpoint(PathBuf),
    /// 有会话就用会话，否则用图
    Default(DefaultContext<'a>),
}

/// 可转换为模型来源的类型
pub trait IntoModelSource<'a> {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError>;
}

impl<'a> IntoModelSource<'a> for ModelSource<'a> {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        Ok(self)
    }
}

impl<'a> IntoModelSource<'a> for &'a GraphInner {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        Ok(ModelSource::Graph(self))
    }
}

impl<'a> IntoModelSource<'a> for &'a Session {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        Ok(ModelSource::Session(self))
    }
}

impl<'a> IntoModelSource<'a> for &Path {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        Ok(ModelSource::Checkpoint(self.to_path_buf()))
    }
}

impl<'a> IntoModelSource<'a> for PathBuf {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        Ok(ModelSource::Checkpoint(self))
    }
}

impl<'a> IntoModelSource<'a> for &str {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        Ok(ModelSource::Checkpoint(PathBuf::from(self)))
    }
}

impl<'a> IntoModelSource<'a> for DefaultContext<'a> {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        Ok(ModelSource::Default(self))
    }
}

/// 运行时类型未知的来源：只接受图、会话与路径，其余一律视为无效输入
impl<'a> IntoModelSource<'a> for &'a dyn Any {
    fn into_model_source(self) -> Result<ModelSource<'a>, VisError> {
        if let Some(graph) = self.downcast_ref::<GraphInner>() {
            return Ok(ModelSource::Graph(graph));
        }
        if let Some(session) = self.downcast_ref::<Session>() {
            return Ok(ModelSource::Session(session));
        }
        if let Some(path) = self.downcast_ref::<PathBuf>() {
            return Ok(ModelSource::Checkpoint(path.clone()));
        }
        if let Some(path) = self.downcast_ref::<String>() {
            return Ok(ModelSource::Checkpoint(PathBuf::from(path)));
        }
        if let Some(path) = self.downcast_ref::<&str>() {
            return Ok(ModelSource::Checkpoint(PathBuf::from(*path)));
        }
        Err(VisError::InvalidInput(
            "模型来源必须是 GraphInner、Session、检查点路径或默认上下文".to_string(),
        ))
    }
}

/// 把模型来源落成检查点，返回元图路径
pub fn save_model(source: &ModelSource<'_>, config: &VisConfig) -> Result<PathBuf, VisError> {
    let prefix = config.checkpoint_prefix();
    match source {
        ModelSource::Graph(graph) => save_frozen_graph(graph, &prefix),
        ModelSource::Session(session) => save_session(session, &prefix),
        ModelSource::Checkpoint(meta_path) => Ok(meta_path.clone()),
        ModelSource::Default(ctx) => match ctx.session {
            Some(session) => save_session(session, &prefix),
            None => save_frozen_graph(ctx.graph, &prefix),
        },
    }
}

/// 冻结图：先检查不含变量，再在图的副本上补一个占位变量并保存。原图不会被修改
fn save_frozen_graph(graph: &GraphInner, prefix: &Path) -> Result<PathBuf, VisError> {
    if graph.has_variables() {
        return Err(VisError::InvalidInput(
            "请提供冻结图（不含变量），或者直接传入会话".to_string(),
        ));
    }
    save_with_fake_var(graph.clone(), prefix)
}

fn save_with_fake_var(mut graph: GraphInner, prefix: &Path) -> Result<PathBuf, VisError> {
    let name = (graph.find_node(FAKE_VAR_NAME).is_none()).then_some(FAKE_VAR_NAME);
    graph.new_variable_node(&Tensor::zeros(&[1]), name)?;

    let mut session = Session::new(graph);
    session.initialize_variables()?;
    let meta_path = session.save(prefix)?;
    session.close();
    Ok(meta_path)
}

/// 会话：直接保存，调用方的会话保持打开。
/// 会话中的图若没有变量，则在其副本上补占位变量后保存
fn save_session(session: &Session, prefix: &Path) -> Result<PathBuf, VisError> {
    if session.is_closed() {
        return Err(VisError::InvalidInput("传入的会话已关闭".to_string()));
    }
    if session.graph().has_variables() {
        Ok(session.save(prefix)?)
    } else {
        save_with_fake_var(session.graph().clone(), prefix)
    }
}

/// 在全新的图与会话中导入元图，并从其所在目录最近的检查点恢复参数
///
/// `override_map`非空时，导入在该梯度覆盖映射的作用域内进行
pub fn load_model(
    meta_path: &Path,
    override_map: Option<&GradientOverrideMap>,
) -> Result<Session, VisError> {
    let graph = GraphInner::import_meta_graph(meta_path, override_map)
        .map_err(|e| VisError::Restore(e.to_string()))?;

    let dir = match meta_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = latest_checkpoint(&dir)
        .map_err(|e| VisError::Restore(e.to_string()))?
        .ok_or_else(|| {
            VisError::Restore(format!(
                "目录`{}`下找不到检查点（元图前缀为`{}`）",
                dir.display(),
                prefix_of_meta(meta_path).display()
            ))
        })?;

    let mut session = Session::new(graph);
    session
        .restore(&prefix)
        .map_err(|e| VisError::Restore(e.to_string()))?;
    debug!("已在{}中加载检查点 {}", session.graph_id(), prefix.display());
    Ok(session)
}
