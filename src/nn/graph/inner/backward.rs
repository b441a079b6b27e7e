/*
 * @Date         : 2026-10-15
 * @Description  : GraphInner 梯度计算（VJP）
 *
 * 与训练用的反向传播不同，这里的梯度是“预先构建、多次求值”的：
 * `build_gradient(ys, xs)`一次性确定从 ys 回到 xs 的路径，
 * 之后每次喂入不同的值都可以用`evaluate_gradient`直接求值，不再重复构建。
 */

use super::super::error::GraphError;
use super::{GraphId, GraphInner};
use crate::nn::NodeId;
use crate::nn::gradient_registry;
use crate::nn::nodes::GradientContext;
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};

/// 预先构建的梯度计算：d(sum(ys))/d(xs)
#[derive(Debug, Clone)]
pub struct GradientPlan {
    graph_id: GraphId,
    ys: NodeId,
    xs: NodeId,
    /// 路径上的节点，按 id 降序（即反向拓扑序）
    order: Vec<NodeId>,
    on_path: HashSet<NodeId>,
}

impl GradientPlan {
    pub const fn ys(&self) -> NodeId {
        self.ys
    }

    pub const fn xs(&self) -> NodeId {
        self.xs
    }

    pub const fn graph_id(&self) -> GraphId {
        self.graph_id
    }

    /// 路径上的节点数（含 ys 与 xs）
    pub fn path_len(&self) -> usize {
        self.order.len()
    }
}

impl GraphInner {
    /// 构建 d(sum(ys))/d(xs) 的梯度计划
    ///
    /// 路径 = ys 的祖先 ∩ xs 的后代。xs 不在 ys 上游时返回错误
    pub fn build_gradient(&self, ys: NodeId, xs: NodeId) -> Result<GradientPlan, GraphError> {
        let _ = self.get_node(ys)?;
        let _ = self.get_node(xs)?;

        let ancestors = self.collect_reachable(ys, &self.backward_edges);
        let descendants = self.collect_reachable(xs, &self.forward_edges);
        let on_path: HashSet<NodeId> = ancestors.intersection(&descendants).copied().collect();

        if !on_path.contains(&xs) {
            return Err(GraphError::InvalidOperation(format!(
                "{}不在{}的上游，无法求梯度",
                self.get_node(xs)?,
                self.get_node(ys)?
            )));
        }

        let mut order: Vec<NodeId> = on_path.iter().copied().collect();
        order.sort_unstable_by(|a, b| b.cmp(a));

        Ok(GradientPlan {
            graph_id: self.id,
            ys,
            xs,
            order,
            on_path,
        })
    }

    /// 从`start`出发沿给定的边能到达的全部节点（含自身）
    fn collect_reachable(
        &self,
        start: NodeId,
        edges: &HashMap<NodeId, Vec<NodeId>>,
    ) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if visited.insert(id) {
                if let Some(next) = edges.get(&id) {
                    stack.extend(next.iter().copied());
                }
            }
        }
        visited
    }

    /// 对已构建的梯度计划求值。调用前须已对 ys 做过前向传播（路径上所有节点都有值）
    ///
    /// 以`ones_like(ys)`作为起始梯度，返回与 xs 同形状的张量
    pub fn evaluate_gradient(&self, plan: &GradientPlan) -> Result<Tensor, GraphError> {
        if plan.graph_id != self.id {
            return Err(GraphError::InvalidOperation(format!(
                "梯度计划属于{}，不能在{}上求值",
                plan.graph_id, self.id
            )));
        }

        let ys_value = self.node_value_or_err(plan.ys)?;
        let mut grads: HashMap<NodeId, Tensor> = HashMap::new();
        grads.insert(plan.ys, Tensor::ones(ys_value.shape()));

        for &node_id in &plan.order {
            if node_id == plan.xs {
                break;
            }
            let Some(upstream) = grads.remove(&node_id) else {
                continue;
            };
            self.propagate_grad_to_parents(node_id, &upstream, plan, &mut grads)?;
        }

        match grads.remove(&plan.xs) {
            Some(grad) => Ok(grad),
            None => Ok(Tensor::zeros(self.get_node_shape(plan.xs)?)),
        }
    }

    /// 将梯度从当前节点传播到路径上的父节点
    fn propagate_grad_to_parents(
        &self,
        node_id: NodeId,
        upstream: &Tensor,
        plan: &GradientPlan,
        grads: &mut HashMap<NodeId, Tensor>,
    ) -> Result<(), GraphError> {
        let node = self.get_node(node_id)?;
        let parent_ids = self.get_node_parents(node_id)?;
        let parent_values = parent_ids
            .iter()
            .map(|&id| self.node_value_or_err(id))
            .collect::<Result<Vec<&Tensor>, GraphError>>()?;

        for (index, parent_id) in parent_ids.iter().enumerate() {
            if !plan.on_path.contains(parent_id) {
                continue;
            }

            let grad = match node.gradient_override() {
                Some(rule) => {
                    if index != 0 {
                        return Err(GraphError::InvalidOperation(format!(
                            "梯度覆盖规则`{rule}`只作用于单输入节点，但{node}有多个输入"
                        )));
                    }
                    let gradient_fn = gradient_registry::lookup(rule)
                        .ok_or(GraphError::GradientNotRegistered(rule))?;
                    let ctx = GradientContext {
                        output: self.node_value_or_err(node_id)?,
                        inputs: &parent_values,
                    };
                    gradient_fn(&ctx, upstream)
                }
                None => node.calc_grad_to_parent(index, &parent_values, upstream)?,
            };

            match grads.get_mut(parent_id) {
                Some(existing) => *existing += &grad,
                None => {
                    grads.insert(*parent_id, grad);
                }
            }
        }
        Ok(())
    }

    fn node_value_or_err(&self, id: NodeId) -> Result<&Tensor, GraphError> {
        let node = self.get_node(id)?;
        node.value().ok_or_else(|| {
            GraphError::ComputationError(format!("{node}没有值，请先执行 forward"))
        })
    }
}
