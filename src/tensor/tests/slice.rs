use crate::tensor::Tensor;

#[test]
fn test_select_last_axis() {
    // [1, 2, 3]：两个位置，每个位置三个通道
    let t = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[1, 2, 3]);
    let c1 = t.select_last_axis(1);
    assert_eq!(c1.shape(), &[1, 2]);
    assert_eq!(c1.data_as_slice(), &[2.0, 5.0]);
}

#[test]
fn test_scatter_last_axis_is_inverse_of_select() {
    let g = Tensor::new(&[7.0, 8.0], &[1, 2]);
    let scattered = g.scatter_last_axis(2, 3);
    assert_eq!(scattered.shape(), &[1, 2, 3]);
    assert_eq!(scattered.data_as_slice(), &[0.0, 0.0, 7.0, 0.0, 0.0, 8.0]);
    assert_eq!(scattered.select_last_axis(2), g);
}

#[test]
#[should_panic]
fn test_select_last_axis_out_of_range() {
    let t = Tensor::zeros(&[2, 3]);
    let _ = t.select_last_axis(3);
}
