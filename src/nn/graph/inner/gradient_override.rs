/*
 * @Date         : 2026-10-15
 * @Description  : 梯度覆盖映射的作用域
 *
 * 在作用域内新建（或从元图导入）的节点，若其类型出现在映射中，就会带上对应的
 * 覆盖规则；反向传播时按规则到注册表中查找实现。作用域结束后映射失效，
 * 之后新建的节点不受影响。
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::{GradientOverrideMap, gradient_registry};

impl GraphInner {
    /// 在`map`生效期间执行`f`。映射中的规则必须已注册，且与所映射的节点类型相符
    pub fn with_gradient_override_map<T>(
        &mut self,
        map: &GradientOverrideMap,
        f: impl FnOnce(&mut Self) -> Result<T, GraphError>,
    ) -> Result<T, GraphError> {
        for (kind, rule) in map.iter() {
            if !gradient_registry::is_registered(rule) {
                return Err(GraphError::GradientNotRegistered(rule));
            }
            if rule.applies_to() != kind {
                return Err(GraphError::InvalidOperation(format!(
                    "梯度覆盖规则`{rule}`只适用于{}节点，不能映射到{kind}",
                    rule.applies_to()
                )));
            }
        }

        let previous = self.gradient_override_map.replace(map.clone());
        let result = f(self);
        self.gradient_override_map = previous;
        result
    }

    /// 当前生效的梯度覆盖映射
    pub const fn active_gradient_override_map(&self) -> Option<&GradientOverrideMap> {
        self.gradient_override_map.as_ref()
    }
}
