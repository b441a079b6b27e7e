/*
 * @Date         : 2026-10-15
 * @Description  : GraphInner 核心操作 + 前向传播
 */

use super::super::error::GraphError;
use super::{GraphId, GraphInner};
use crate::nn::NodeId;
use crate::nn::nodes::{NodeHandle, OpKind};
use crate::tensor::Tensor;
use std::collections::HashMap;

/// 图中一个节点（算子）的只读概要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: OpKind,
    pub output_shape: Vec<usize>,
    /// 输入节点，顺序即参数位置
    pub inputs: Vec<NodeId>,
}

impl GraphInner {
    // ========== 创建 ==========

    pub fn new() -> Self {
        Self::with_name("default_graph")
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            id: GraphId::next(),
            name: name.to_string(),
            nodes: HashMap::new(),
            name_index: HashMap::new(),
            forward_edges: HashMap::new(),
            backward_edges: HashMap::new(),
            last_forward_pass_id: 0,
            next_id: 0,
            gradient_override_map: None,
        }
    }

    // ========== 基础访问器 ==========

    pub const fn id(&self) -> GraphId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub(in crate::nn) const fn last_forward_pass_id(&self) -> u64 {
        self.last_forward_pass_id
    }

    pub(in crate::nn) fn get_node(&self, id: NodeId) -> Result<&NodeHandle, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_node_mut(&mut self, id: NodeId) -> Result<&mut NodeHandle, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn get_node_parents(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        // 先检查节点是否存在
        let _ = self.get_node(id)?;
        Ok(self.backward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn get_node_children(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let _ = self.get_node(id)?;
        Ok(self.forward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn get_node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(self.get_node(id)?.name())
    }

    pub fn get_node_kind(&self, id: NodeId) -> Result<OpKind, GraphError> {
        Ok(self.get_node(id)?.kind())
    }

    pub fn get_node_shape(&self, id: NodeId) -> Result<&[usize], GraphError> {
        Ok(self.get_node(id)?.value_expected_shape())
    }

    pub fn get_node_value(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.value())
    }

    /// 按名称查找节点
    pub fn get_node_by_name(&self, name: &str) -> Result<NodeId, GraphError> {
        self.find_node(name)
            .ok_or_else(|| GraphError::NodeNameNotFound(name.to_string()))
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    /// 手动设置源节点（占位符/常量/变量）的值
    pub fn set_node_value(&mut self, id: NodeId, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_value(value)
    }

    // ========== 枚举 ==========

    /// 按原生遍历顺序（即节点 id 升序）列出全部节点的 id
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn op_info(&self, id: NodeId) -> Result<OpInfo, GraphError> {
        let node = self.get_node(id)?;
        Ok(OpInfo {
            id,
            name: node.name().to_string(),
            kind: node.kind(),
            output_shape: node.value_expected_shape().to_vec(),
            inputs: self.get_node_parents(id)?,
        })
    }

    /// 按原生遍历顺序列出全部节点（算子）
    pub fn get_operations(&self) -> Vec<OpInfo> {
        self.node_ids()
            .into_iter()
            .filter_map(|id| self.op_info(id).ok())
            .collect()
    }

    /// 按原生遍历顺序列出某一类型的全部节点
    pub fn operations_of_kind(&self, kind: OpKind) -> Vec<OpInfo> {
        self.get_operations()
            .into_iter()
            .filter(|op| op.kind == kind)
            .collect()
    }

    /// 是否含有可训练变量（即不是冻结图）
    pub fn has_variables(&self) -> bool {
        self.nodes.values().any(|node| node.kind().is_variable())
    }

    // ========== 名称 ==========

    pub(in crate::nn::graph) fn check_duplicate_node_name(&self, name: &str) -> Result<(), GraphError> {
        if self.name_index.contains_key(name) {
            return Err(GraphError::DuplicateNodeName(format!(
                "节点{}在图{}中重复",
                name,
                self.name()
            )));
        }
        Ok(())
    }

    pub(in crate::nn::graph) fn generate_valid_new_node_name(
        &self,
        base_name: &str,
        kind: OpKind,
    ) -> Result<String, GraphError> {
        if !base_name.is_empty() {
            // `name:0` 形式用于引用节点的第一个输出，所以名称本身不能带冒号
            if base_name.contains(':') {
                return Err(GraphError::InvalidOperation(format!(
                    "节点名`{base_name}`不能包含`:`"
                )));
            }
            self.check_duplicate_node_name(base_name)?;
            return Ok(base_name.to_string());
        }

        let node_type = kind.type_name();
        let mut counter = 1;
        loop {
            let name = format!("{node_type}_{counter}");
            if self.check_duplicate_node_name(&name).is_ok() {
                return Ok(name);
            }
            counter += 1;
        }
    }

    pub(in crate::nn::graph) fn generate_valid_node_id(&mut self) -> NodeId {
        // 生成唯一的节点ID
        self.next_id += 1;
        NodeId(self.next_id)
    }

    // ========== 前向传播 ==========

    pub fn forward(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        self.forward_many(&[node_id])
    }

    /// 在同一次前向传播中计算多个节点，共享的上游只计算一次
    pub fn forward_many(&mut self, node_ids: &[NodeId]) -> Result<(), GraphError> {
        let new_graph_forward_pass_id = self.last_forward_pass_id + 1;
        for &node_id in node_ids {
            self.forward_node_internal(node_id, new_graph_forward_pass_id)?;
        }
        self.last_forward_pass_id = new_graph_forward_pass_id;
        Ok(())
    }

    fn forward_node_internal(
        &mut self,
        node_id: NodeId,
        new_graph_forward_pass_id: u64,
    ) -> Result<(), GraphError> {
        let node = self.get_node(node_id)?;
        if node.last_forward_pass_id() == new_graph_forward_pass_id {
            return Ok(());
        }

        if node.kind().is_source() {
            let node = self.get_node_mut(node_id)?;
            node.calc_value_by_parents(&[]).map_err(|e| match e {
                GraphError::ComputationError(msg) => {
                    GraphError::ComputationError(format!("{node}：{msg}"))
                }
                other => other,
            })?;
            node.set_last_forward_pass_id(new_graph_forward_pass_id);
            return Ok(());
        }

        let parents_ids = self.get_node_parents(node_id)?;
        for parent_id in &parents_ids {
            self.forward_node_internal(*parent_id, new_graph_forward_pass_id)?;
        }

        let parent_values = parents_ids
            .iter()
            .map(|&id| {
                let parent = self.get_node(id)?;
                parent.value().cloned().ok_or_else(|| {
                    GraphError::ComputationError(format!(
                        "{parent}没有值。不该触及本错误，否则说明crate代码有问题"
                    ))
                })
            })
            .collect::<Result<Vec<Tensor>, GraphError>>()?;
        let parent_refs: Vec<&Tensor> = parent_values.iter().collect();

        let node = self.get_node_mut(node_id)?;
        node.calc_value_by_parents(&parent_refs)?;
        node.set_last_forward_pass_id(new_graph_forward_pass_id);

        Ok(())
    }

    /// 清除所有占位符的值（喂值只在一次运行内有效）
    pub(in crate::nn) fn clear_placeholders(&mut self) {
        for node in self.nodes.values_mut() {
            if node.kind() == OpKind::Placeholder {
                node.clear_value();
            }
        }
    }

    /// 以初始值初始化所有变量
    pub fn initialize_variables(&mut self) -> Result<(), GraphError> {
        for id in self.node_ids() {
            self.get_node_mut(id)?.initialize()?;
        }
        Ok(())
    }
}
