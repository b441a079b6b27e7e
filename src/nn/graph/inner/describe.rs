/*
 * @Date         : 2026-10-15
 * @Description  : GraphInner 与图描述符（GraphDescriptor）之间的互相转换
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::descriptor::{GraphDescriptor, NodeDescriptor, NodeTypeDescriptor};
use crate::nn::nodes::NodeType;
use crate::nn::nodes::raw_node::{
    Add, BiasAdd, Constant, Conv2d, FeatureMapSelect, Lrn, MatMul, MaxPool, Placeholder, Relu,
    Reshape, Variable,
};
use std::collections::HashMap;

impl GraphInner {
    /// 生成图的描述符（节点按原生遍历顺序排列）
    pub fn describe(&self) -> GraphDescriptor {
        let mut descriptor = GraphDescriptor::new(&self.name);
        for id in self.node_ids() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let parents = self
                .backward_edges
                .get(&id)
                .map(|ps| ps.iter().map(|p| p.0).collect())
                .unwrap_or_default();
            descriptor.add_node(NodeDescriptor {
                id: id.0,
                name: node.name().to_string(),
                node_type: node.describe(),
                output_shape: node.value_expected_shape().to_vec(),
                parents,
                gradient_override: node.gradient_override(),
            });
        }
        descriptor
    }

    /// 由描述符重建一张新图。常量与变量只有形状，值需随后通过 restore 填入。
    ///
    /// 重建时若有生效的梯度覆盖映射，则映射优先于描述符中记录的规则
    pub(in crate::nn::graph) fn rebuild_from_descriptor(
        &mut self,
        descriptor: &GraphDescriptor,
    ) -> Result<(), GraphError> {
        let mut nodes: Vec<&NodeDescriptor> = descriptor.nodes.iter().collect();
        nodes.sort_unstable_by_key(|n| n.id);

        // 描述符中的 id -> 新图中的 id
        let mut id_map: HashMap<u64, NodeId> = HashMap::new();
        for node_desc in nodes {
            let parents = node_desc
                .parents
                .iter()
                .map(|p| {
                    id_map.get(p).copied().ok_or_else(|| {
                        GraphError::Checkpoint(format!(
                            "节点`{}`引用了不存在（或顺序在后）的父节点 {p}",
                            node_desc.name
                        ))
                    })
                })
                .collect::<Result<Vec<NodeId>, GraphError>>()?;

            let raw_node = self.raw_node_from_descriptor(node_desc, &parents)?;
            let new_id = self.add_node_to_list(
                raw_node,
                Some(&node_desc.name),
                &parents,
                node_desc.gradient_override,
            )?;

            let built_shape = self.get_node_shape(new_id)?;
            if built_shape != node_desc.output_shape.as_slice() {
                return Err(GraphError::ShapeMismatch {
                    expected: node_desc.output_shape.clone(),
                    got: built_shape.to_vec(),
                    message: format!("重建节点`{}`得到的形状与元图记录不一致", node_desc.name),
                });
            }
            id_map.insert(node_desc.id, new_id);
        }
        Ok(())
    }

    fn raw_node_from_descriptor(
        &self,
        node_desc: &NodeDescriptor,
        parents: &[NodeId],
    ) -> Result<NodeType, GraphError> {
        let parent_shape = |index: usize| -> Result<&[usize], GraphError> {
            let id = parents.get(index).ok_or_else(|| {
                GraphError::Checkpoint(format!(
                    "节点`{}`缺少第{index}个父节点",
                    node_desc.name
                ))
            })?;
            self.get_node_shape(*id)
        };

        let raw_node: NodeType = match &node_desc.node_type {
            NodeTypeDescriptor::Placeholder => Placeholder::new(&node_desc.output_shape).into(),
            NodeTypeDescriptor::Const => Constant::declared(&node_desc.output_shape).into(),
            NodeTypeDescriptor::Variable => Variable::declared(&node_desc.output_shape).into(),
            NodeTypeDescriptor::Conv2D { strides, padding } => {
                Conv2d::new(parent_shape(0)?, parent_shape(1)?, *strides, *padding)?.into()
            }
            NodeTypeDescriptor::BiasAdd => BiasAdd::new(parent_shape(0)?, parent_shape(1)?)?.into(),
            NodeTypeDescriptor::Relu => Relu::new(parent_shape(0)?).into(),
            NodeTypeDescriptor::MaxPool {
                kernel_size,
                strides,
                padding,
            } => MaxPool::new(parent_shape(0)?, *kernel_size, Some(*strides), *padding)?.into(),
            NodeTypeDescriptor::Lrn { params } => Lrn::new(parent_shape(0)?, *params)?.into(),
            NodeTypeDescriptor::Add => Add::new(parent_shape(0)?, parent_shape(1)?)?.into(),
            NodeTypeDescriptor::MatMul => MatMul::new(parent_shape(0)?, parent_shape(1)?)?.into(),
            NodeTypeDescriptor::Reshape { shape } => Reshape::new(parent_shape(0)?, shape)?.into(),
            NodeTypeDescriptor::FeatureMapSelect => {
                FeatureMapSelect::new(parent_shape(0)?, parent_shape(1)?)?.into()
            }
        };
        Ok(raw_node)
    }
}
