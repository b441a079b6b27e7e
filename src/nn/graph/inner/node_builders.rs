/*
 * @Date         : 2026-10-15
 * @Description  : GraphInner 节点构建方法（new_*_node）
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::nodes::raw_node::{
    Add, BiasAdd, Constant, Conv2d, FeatureMapSelect, Lrn, MatMul, MaxPool, Placeholder, Relu,
    Reshape, Variable,
};
use crate::nn::nodes::{LrnParams, NodeHandle, NodeType, Padding, TraitNode};
use crate::nn::{GradientOverride, NodeId};
use crate::tensor::Tensor;

impl GraphInner {
    /// 添加节点到列表
    ///
    /// 若当前有生效的梯度覆盖映射，且映射中含有本节点类型，则节点带上对应规则；
    /// 否则沿用`inherited_override`（从元图导入时记录的规则）
    pub(in crate::nn::graph) fn add_node_to_list(
        &mut self,
        raw_node: NodeType,
        name: Option<&str>,
        parents: &[NodeId],
        inherited_override: Option<GradientOverride>,
    ) -> Result<NodeId, GraphError> {
        for &parent_id in parents {
            let _ = self.get_node(parent_id)?;
        }
        let kind = raw_node.kind();
        let node_name = self.generate_valid_new_node_name(name.unwrap_or(""), kind)?;
        let node_id = self.generate_valid_node_id();

        for &parent_id in parents {
            self.forward_edges.entry(parent_id).or_default().push(node_id);
        }
        self.backward_edges
            .entry(node_id)
            .or_default()
            .extend(parents);

        let mut node_handle = NodeHandle::new(node_id, &node_name, raw_node);
        let rule = self
            .gradient_override_map
            .as_ref()
            .and_then(|map| map.get(kind))
            .or(inherited_override);
        node_handle.set_gradient_override(rule);

        self.name_index.insert(node_name, node_id);
        self.nodes.insert(node_id, node_handle);
        Ok(node_id)
    }

    fn add_node(
        &mut self,
        raw_node: impl Into<NodeType>,
        name: Option<&str>,
        parents: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        self.add_node_to_list(raw_node.into(), name, parents, None)
    }

    /// 创建占位符节点：值在每次运行时通过喂值提供
    pub fn new_placeholder_node(
        &mut self,
        shape: &[usize],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_node(Placeholder::new(shape), name, &[])
    }

    /// 创建常量节点（冻结图中的权重）
    pub fn new_const_node(&mut self, value: &Tensor, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_node(Constant::new(value), name, &[])
    }

    /// 创建变量节点：需先`initialize_variables`才有值
    pub fn new_variable_node(
        &mut self,
        initial_value: &Tensor,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_node(Variable::new(initial_value), name, &[])
    }

    /// 创建 Conv2D 节点
    ///
    /// # 参数
    /// - `input`: [batch, H, W, `C_in`]
    /// - `filter`: [kH, kW, `C_in`, `C_out`]
    pub fn new_conv2d_node(
        &mut self,
        input: NodeId,
        filter: NodeId,
        strides: (usize, usize),
        padding: Padding,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = Conv2d::new(
            self.get_node_shape(input)?,
            self.get_node_shape(filter)?,
            strides,
            padding,
        )?;
        self.add_node(node, name, &[input, filter])
    }

    pub fn new_bias_add_node(
        &mut self,
        input: NodeId,
        bias: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = BiasAdd::new(self.get_node_shape(input)?, self.get_node_shape(bias)?)?;
        self.add_node(node, name, &[input, bias])
    }

    pub fn new_relu_node(&mut self, input: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        let node = Relu::new(self.get_node_shape(input)?);
        self.add_node(node, name, &[input])
    }

    /// 创建 MaxPool 节点，`strides`为 None 时等于`kernel_size`
    pub fn new_max_pool_node(
        &mut self,
        input: NodeId,
        kernel_size: (usize, usize),
        strides: Option<(usize, usize)>,
        padding: Padding,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = MaxPool::new(self.get_node_shape(input)?, kernel_size, strides, padding)?;
        self.add_node(node, name, &[input])
    }

    pub fn new_lrn_node(
        &mut self,
        input: NodeId,
        params: LrnParams,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = Lrn::new(self.get_node_shape(input)?, params)?;
        self.add_node(node, name, &[input])
    }

    pub fn new_add_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        let node = Add::new(self.get_node_shape(a)?, self.get_node_shape(b)?)?;
        self.add_node(node, name, &[a, b])
    }

    pub fn new_mat_mul_node(
        &mut self,
        a: NodeId,
        b: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = MatMul::new(self.get_node_shape(a)?, self.get_node_shape(b)?)?;
        self.add_node(node, name, &[a, b])
    }

    pub fn new_reshape_node(
        &mut self,
        input: NodeId,
        shape: &[usize],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = Reshape::new(self.get_node_shape(input)?, shape)?;
        self.add_node(node, name, &[input])
    }

    /// 创建特征图选取节点：沿`input`的最后一维取出第`index`张特征图，
    /// `index`须是标量节点（通常为占位符）
    pub fn new_feature_map_select_node(
        &mut self,
        input: NodeId,
        index: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = FeatureMapSelect::new(self.get_node_shape(input)?, self.get_node_shape(index)?)?;
        self.add_node(node, name, &[input, index])
    }
}
