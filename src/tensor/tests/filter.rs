use crate::tensor::Tensor;

#[test]
fn test_where_with_f32_keeps_nan() {
    let t = Tensor::new(&[-2.0, f32::NAN, 3.0], &[3]);
    let result = t.where_with_f32(|x| x > 0.0, |x| x, |_| 0.0);
    let data = result.data_as_slice();
    assert_eq!(data[0], 0.0);
    assert!(data[1].is_nan());
    assert_eq!(data[2], 3.0);
}

#[test]
fn test_where_with_tensor_masks_by_other() {
    // 类似 relu 的反向：仅在 y > 0 处保留 g
    let g = Tensor::new(&[1.0, -2.0, 3.0, -4.0], &[2, 2]);
    let y = Tensor::new(&[0.5, 0.0, 0.0, 2.0], &[2, 2]);
    let result = g.where_with_tensor(&y, |_, y| y > 0.0, |g, _| g, |_, _| 0.0);
    assert_eq!(result.shape(), &[2, 2]);
    assert_eq!(result.data_as_slice(), &[1.0, 0.0, 0.0, -4.0]);
}

#[test]
#[should_panic]
fn test_where_with_tensor_shape_mismatch() {
    let a = Tensor::zeros(&[2, 2]);
    let b = Tensor::zeros(&[4]);
    let _ = a.where_with_tensor(&b, |_, _| true, |x, _| x, |x, _| x);
}
