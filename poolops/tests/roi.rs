use poolops::prelude::*;

#[cfg(not(feature = "test-f64"))]
type TestDtype = f32;

#[cfg(feature = "test-f64")]
type TestDtype = f64;

/// Keeps its buffers in host memory but reports itself as an accelerator,
/// standing in for a device without ROI kernels.
#[derive(Debug, Clone, Default)]
struct Accelerator;

impl<E: Unit> Storage<E> for Accelerator {
    type Vec = Vec<E>;

    fn device_kind(&self) -> DeviceKind {
        DeviceKind::Accelerator
    }

    fn try_alloc_len(&self, len: usize) -> Result<Self::Vec, Error> {
        Ok(vec![Default::default(); len])
    }

    fn try_upload(&self, src: Vec<E>) -> Result<Self::Vec, Error> {
        Ok(src)
    }

    fn download(&self, v: &Self::Vec) -> Vec<E> {
        v.clone()
    }
}

#[test]
fn roi_max_pool_over_whole_map_is_global_channel_max() {
    let dev = Cpu::seed_from_u64(3);
    let (c, h, w) = (4, 5, 7);
    let x: Tensor<TestDtype, _> = dev.sample_normal_like([2, c, h, w]);
    let rois = dev.tensor_from_vec(
        vec![0.0 as TestDtype, 0.0, h as TestDtype, w as TestDtype],
        [1, 4],
    );
    let roi_indices = dev.tensor_from_vec(vec![1usize], [1]);
    let y = x.roi_max_pool2d(&rois, &roi_indices, &RoiPool2DConfig::new([1, 1]));
    assert_eq!(y.shape(), &Shape::from([1, c, 1, 1]));

    let xs = x.as_vec();
    let expected: Vec<TestDtype> = (0..c)
        .map(|ch| {
            let start = (c + ch) * h * w;
            xs[start..start + h * w]
                .iter()
                .copied()
                .fold(TestDtype::MIN, TestDtype::max)
        })
        .collect();
    assert_eq!(y.as_vec(), expected);
}

#[test]
fn roi_align_samples_bin_center() {
    let dev: Cpu = Default::default();
    let x = dev.tensor_from_vec(vec![1.0 as TestDtype, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
    let rois = dev.tensor_from_vec(vec![0.0 as TestDtype, 0.0, 1.0, 1.0], [1, 4]);
    let roi_indices = dev.tensor_from_vec(vec![0usize], [1]);
    let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([1, 1]);
    assert_eq!(
        x.roi_average_align2d(&rois, &roi_indices, &cfg).as_vec(),
        vec![2.5]
    );
    assert_eq!(
        x.roi_max_align2d(&rois, &roi_indices, &cfg).as_vec(),
        vec![2.5]
    );
}

#[test]
fn roi_align_outside_map_keeps_sentinels() {
    let dev: Cpu = Default::default();
    let x = dev.tensor_from_vec(vec![1.0 as TestDtype, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
    let rois = dev.tensor_from_vec(vec![-9.0 as TestDtype, -9.0, -5.0, -5.0], [1, 4]);
    let roi_indices = dev.tensor_from_vec(vec![0usize], [1]);
    let cfg = RoiAlign2DConfig::new([2, 2]);
    assert_eq!(
        x.roi_max_align2d(&rois, &roi_indices, &cfg).as_vec(),
        vec![TestDtype::MIN; 4]
    );
    assert_eq!(
        x.roi_average_align2d(&rois, &roi_indices, &cfg).as_vec(),
        vec![0.0; 4]
    );
}

#[test]
fn roi_pool_outside_map_is_zero() {
    let dev: Cpu = Default::default();
    let x = dev.tensor_from_vec(vec![1.0 as TestDtype, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
    let rois = dev.tensor_from_vec(vec![5.0 as TestDtype, 5.0, 9.0, 9.0], [1, 4]);
    let roi_indices = dev.tensor_from_vec(vec![0usize], [1]);
    let cfg = RoiPool2DConfig::new([2, 2]);
    assert_eq!(
        x.roi_max_pool2d(&rois, &roi_indices, &cfg).as_vec(),
        vec![0.0; 4]
    );
}

#[test]
fn roi_ops_refuse_accelerator_devices() {
    let dev = Accelerator;
    let x = dev.tensor_from_vec(vec![1.0 as TestDtype, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
    let rois = dev.tensor_from_vec(vec![0.0 as TestDtype, 0.0, 1.0, 1.0], [1, 4]);
    let roi_indices = dev.tensor_from_vec(vec![0usize], [1]);
    let pool = RoiPool2DConfig::new([1, 1]);
    let align = RoiAlign2DConfig::new([1, 1]);

    let err = x.try_roi_max_pool2d(&rois, &roi_indices, &pool).unwrap_err();
    assert_eq!(
        err,
        Error::NotImplemented {
            op: "roi_max_pool2d",
            device: DeviceKind::Accelerator
        }
    );
    assert_eq!(
        err.to_string(),
        "roi_max_pool2d is not implemented for device accelerator"
    );

    for r in [
        x.try_roi_average_pool2d(&rois, &roi_indices, &pool),
        x.try_roi_max_align2d(&rois, &roi_indices, &align),
        x.try_roi_average_align2d(&rois, &roi_indices, &align),
    ] {
        assert!(matches!(r, Err(Error::NotImplemented { .. })));
    }
}

#[test]
fn roi_ops_check_device_before_shapes() {
    let dev = Accelerator;
    let x = dev.tensor_from_vec(vec![1.0 as TestDtype; 4], [2, 2]);
    let rois = dev.tensor_from_vec(vec![0.0 as TestDtype; 4], [1, 4]);
    let roi_indices = dev.tensor_from_vec(vec![0usize], [1]);
    let r = x.try_roi_max_align2d(&rois, &roi_indices, &RoiAlign2DConfig::new([1, 1]));
    assert!(matches!(r, Err(Error::NotImplemented { .. })));
}
