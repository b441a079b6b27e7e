use super::unique_temp_dir;
use crate::nn::OpKind;
use crate::tensor::Tensor;
use crate::vis::artifacts::{LayerDirNames, write_layer};
use crate::vis::{LayerVisualization, VisResult, sanitize_layer_name};
use std::time::Duration;

#[test]
fn test_sanitize_layer_name() {
    assert_eq!(sanitize_layer_name("conv1"), "conv1");
    assert_eq!(sanitize_layer_name("block1/conv:0"), "block1_conv_0");
}

#[test]
fn test_colliding_layer_dirs_get_suffix() {
    let mut names = LayerDirNames::default();
    assert_eq!(names.assign("conv1"), "conv1");
    assert_eq!(names.assign("a/b"), "a_b");
    assert_eq!(names.assign("a_b"), "a_b_1");
    assert_eq!(names.assign("a:b"), "a_b_2");
    assert_eq!(names.assign("a_b_1"), "a_b_1_1");
}

#[test]
fn test_colliding_layers_keep_both_results() {
    let dir = unique_temp_dir("artifacts_collide");
    let mut names = LayerDirNames::default();
    let layer = |name: &str, value: f32| LayerVisualization {
        layer: name.to_string(),
        op_kind: OpKind::Relu,
        result: VisResult::Activation(Tensor::new(&[value], &[1])),
        elapsed: Duration::ZERO,
    };

    let first = write_layer(&dir.join(names.assign("a/b")), &layer("a/b", 1.0)).unwrap();
    let second = write_layer(&dir.join(names.assign("a_b")), &layer("a_b", 2.0)).unwrap();

    assert_ne!(first, second);
    assert_eq!(Tensor::load_npy(&first[0]).unwrap(), Tensor::new(&[1.0], &[1]));
    assert_eq!(Tensor::load_npy(&second[0]).unwrap(), Tensor::new(&[2.0], &[1]));
}
