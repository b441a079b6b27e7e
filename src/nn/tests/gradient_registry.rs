/*
 * @Date         : 2026-10-15
 * @Description  : 梯度覆盖注册表与覆盖映射的测试
 *
 * 注册表是进程级的，其他测试也可能已经注册过，所以这里只验证与调用次序无关的性质。
 */

use crate::nn::{
    GradientOverride, GradientOverrideMap, GraphError, GraphInner, OpKind, is_registered,
    register_custom_gradients, registered_count,
};

#[test]
fn test_register_is_idempotent() {
    register_custom_gradients();
    // 第二次调用不会再注册
    assert!(!register_custom_gradients());
    assert!(!register_custom_gradients());

    assert_eq!(registered_count(), GradientOverride::ALL.len());
    for rule in GradientOverride::ALL {
        assert!(is_registered(rule));
    }
}

#[test]
fn test_rule_keys_and_targets() {
    assert_eq!(GradientOverride::GuidedRelu.key(), "GuidedRelu");
    assert_eq!(GradientOverride::PassThroughLrn.key(), "NormGrad");
    assert_eq!(GradientOverride::GuidedRelu.applies_to(), OpKind::Relu);
    assert_eq!(GradientOverride::PassThroughLrn.applies_to(), OpKind::Lrn);
}

#[test]
fn test_deconv_default_map() {
    let map = GradientOverrideMap::deconv_default();
    assert_eq!(map.get(OpKind::Relu), Some(GradientOverride::GuidedRelu));
    assert_eq!(map.get(OpKind::Lrn), Some(GradientOverride::PassThroughLrn));
    assert_eq!(map.get(OpKind::Conv2D), None);
    assert_eq!(map.iter().count(), 2);
    assert!(GradientOverrideMap::new().is_empty());
}

#[test]
fn test_override_map_rejects_mismatched_kind() -> Result<(), GraphError> {
    register_custom_gradients();
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 1], Some("input"))?;

    let map = GradientOverrideMap::new().with(OpKind::MaxPool, GradientOverride::GuidedRelu);
    let result = graph.with_gradient_override_map(&map, |g| g.new_relu_node(input, None));
    assert!(matches!(result, Err(GraphError::InvalidOperation(_))));
    // 校验失败时不会进入作用域
    assert_eq!(graph.nodes_count(), 1);
    Ok(())
}

#[test]
fn test_override_scope_restores_previous_map() -> Result<(), GraphError> {
    register_custom_gradients();
    let mut graph = GraphInner::new();
    let input = graph.new_placeholder_node(&[1, 2, 2, 1], Some("input"))?;
    let outer = GradientOverrideMap::deconv_default();
    let inner = GradientOverrideMap::new();

    graph.with_gradient_override_map(&outer, |g| {
        g.with_gradient_override_map(&inner, |g| g.new_relu_node(input, Some("plain")))?;
        assert_eq!(g.active_gradient_override_map(), Some(&outer));
        g.new_relu_node(input, Some("guided"))
    })?;
    assert!(graph.active_gradient_override_map().is_none());

    let descriptor = graph.describe();
    let rule_of = |name: &str| {
        descriptor
            .nodes
            .iter()
            .find(|n| n.name == name)
            .and_then(|n| n.gradient_override)
    };
    assert_eq!(rule_of("plain"), None);
    assert_eq!(rule_of("guided"), Some(GradientOverride::GuidedRelu));
    Ok(())
}
