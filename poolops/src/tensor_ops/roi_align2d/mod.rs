//! ROI align: like ROI pooling, but bins keep their fractional extent and
//! each one is sampled on a regular grid with bilinear interpolation.
//!
//! ```rust
//! # use poolops::prelude::*;
//! let dev: Cpu = Default::default();
//! let x = dev.tensor_from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
//! // from the first cell center to the last one
//! let rois = dev.tensor_from_vec(vec![0.0f32, 0.0, 1.0, 1.0], [1, 4]);
//! let roi_indices = dev.tensor_from_vec(vec![0usize], [1]);
//! let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([1, 1]);
//! let y = x.roi_average_align2d(&rois, &roi_indices, &cfg);
//! assert_eq!(y.as_vec(), vec![2.5]);
//! ```

mod cpu_kernel;

use poolops_core::{
    dtypes::FloatDtype,
    tensor::{Error, Storage, Tensor},
};

use crate::tensor_ops::utilities::{
    try_roi_output, AverageReducer, MaxReducer, Reducer, RoiInputs,
};

/// Attributes of the ROI align ops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiAlign2DConfig {
    /// `(pooled_h, pooled_w)` bins per ROI.
    pub output_shape: [usize; 2],
    pub spatial_scale: f32,
    /// Sample points per bin along `(h, w)`.
    pub sampling_ratio: [usize; 2],
}

impl Default for RoiAlign2DConfig {
    fn default() -> Self {
        Self {
            output_shape: [1, 1],
            spatial_scale: 1.0,
            sampling_ratio: [2, 2],
        }
    }
}

impl RoiAlign2DConfig {
    pub fn new(output_shape: [usize; 2]) -> Self {
        Self {
            output_shape,
            ..Default::default()
        }
    }

    pub fn with_spatial_scale(mut self, spatial_scale: f32) -> Self {
        self.spatial_scale = spatial_scale;
        self
    }

    pub fn with_sampling_ratio(mut self, sampling_ratio: [usize; 2]) -> Self {
        self.sampling_ratio = sampling_ratio;
        self
    }
}

/// ROI max and average align over `(N, C, H, W)` feature maps.
///
/// Inputs are laid out as for [crate::tensor_ops::TryRoiPool2D]. Sample
/// points further than one cell outside the feature map are dropped. A bin
/// left without any sample comes out as [FloatDtype]'s lowest finite value
/// for max, and 0 for average.
pub trait TryRoiAlign2D<E, D: Storage<E> + Storage<usize>> {
    fn roi_max_align2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiAlign2DConfig,
    ) -> Tensor<E, D> {
        self.try_roi_max_align2d(rois, roi_indices, cfg).unwrap()
    }

    fn try_roi_max_align2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiAlign2DConfig,
    ) -> Result<Tensor<E, D>, Error>;

    fn roi_average_align2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiAlign2DConfig,
    ) -> Tensor<E, D> {
        self.try_roi_average_align2d(rois, roi_indices, cfg).unwrap()
    }

    fn try_roi_average_align2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiAlign2DConfig,
    ) -> Result<Tensor<E, D>, Error>;
}

fn try_roi_align2d<E: FloatDtype, D: Storage<E> + Storage<usize>, R: Reducer<E>>(
    op: &'static str,
    x: &Tensor<E, D>,
    rois: &Tensor<E, D>,
    roi_indices: &Tensor<usize, D>,
    cfg: &RoiAlign2DConfig,
) -> Result<Tensor<E, D>, Error> {
    let inputs = RoiInputs::try_new(op, x, rois, roi_indices, cfg.output_shape)?;
    if cfg.sampling_ratio.contains(&0) {
        return Err(Error::InvalidConfig {
            op,
            reason: "sampling_ratio must be non-zero",
        });
    }
    log::debug!(
        "{op}: x={} n_rois={} output_shape={:?} spatial_scale={} sampling_ratio={:?}",
        x.shape(),
        inputs.n_rois(),
        cfg.output_shape,
        cfg.spatial_scale,
        cfg.sampling_ratio
    );
    let out = cpu_kernel::try_roi_align2d_host::<E, R>(op, &inputs, cfg)?;
    try_roi_output(x, out, inputs.n_rois(), inputs.channels, cfg.output_shape)
}

impl<E: FloatDtype, D: Storage<E> + Storage<usize>> TryRoiAlign2D<E, D> for Tensor<E, D> {
    fn try_roi_max_align2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiAlign2DConfig,
    ) -> Result<Tensor<E, D>, Error> {
        try_roi_align2d::<E, D, MaxReducer<E>>("roi_max_align2d", self, rois, roi_indices, cfg)
    }

    fn try_roi_average_align2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiAlign2DConfig,
    ) -> Result<Tensor<E, D>, Error> {
        try_roi_align2d::<E, D, AverageReducer<E>>(
            "roi_average_align2d",
            self,
            rois,
            roi_indices,
            cfg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn single_roi(
        dev: &TestDevice,
        roi: &[f64],
    ) -> (Tensor<TestDtype, TestDevice>, Tensor<usize, TestDevice>) {
        (
            test_tensor(dev, roi, [1, 4]),
            dev.tensor_from_vec(vec![0usize], [1]),
        )
    }

    #[test]
    fn test_roi_align2d_bin_center_sample() {
        let dev: TestDevice = Default::default();
        let x = test_tensor(&dev, &[1., 2., 3., 4.], [1, 1, 2, 2]);
        let (rois, idx) = single_roi(&dev, &[0., 0., 1., 1.]);
        let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([1, 1]);
        assert_close_to_literal!(x.roi_average_align2d(&rois, &idx, &cfg), [2.5]);
        assert_close_to_literal!(x.roi_max_align2d(&rois, &idx, &cfg), [2.5]);

        let (rois, idx) = single_roi(&dev, &[0., 0., 2., 2.]);
        let cfg = cfg.with_spatial_scale(0.5);
        assert_close_to_literal!(x.roi_average_align2d(&rois, &idx, &cfg), [2.5]);
    }

    #[test]
    fn test_roi_align2d_grid_samples() {
        let dev: TestDevice = Default::default();
        let data: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let x = test_tensor(&dev, &data, [1, 1, 4, 4]);
        let (rois, idx) = single_roi(&dev, &[0., 0., 4., 4.]);
        // samples land on (1, 1), (1, 3), (3, 1), (3, 3)
        let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([2, 2]);
        assert_close_to_literal!(x.roi_average_align2d(&rois, &idx, &cfg), [10.]);
        assert_close_to_literal!(x.roi_max_align2d(&rois, &idx, &cfg), [15.]);
    }

    #[test]
    fn test_roi_align2d_interpolates_between_cells() {
        let dev: TestDevice = Default::default();
        let x = test_tensor(&dev, &[0., 4., 8., 12.], [1, 1, 2, 2]);
        let (rois, idx) = single_roi(&dev, &[0., 0., 1., 0.5]);
        // roi_width floors to 1, so the sample is at (0.5, 0.5)
        let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([1, 1]);
        assert_close_to_literal!(x.roi_average_align2d(&rois, &idx, &cfg), [6.]);

        // two rows of bins, samples at y = 0.25 and y = 0.75
        let cfg = RoiAlign2DConfig::new([2, 1]).with_sampling_ratio([1, 1]);
        assert_close_to_literal!(x.roi_average_align2d(&rois, &idx, &cfg), [4., 8.]);
    }

    #[test]
    fn test_roi_align2d_average_divides_by_grid_size() {
        let dev: TestDevice = Default::default();
        let x = test_tensor(&dev, &[1., 2., 3., 4.], [1, 1, 2, 2]);
        // samples at y = -2 (dropped) and y = 0, both at x = 1
        let (rois, idx) = single_roi(&dev, &[-3., 0., 1., 2.]);
        let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([2, 1]);
        assert_close_to_literal!(x.roi_average_align2d(&rois, &idx, &cfg), [1.]);
        assert_close_to_literal!(x.roi_max_align2d(&rois, &idx, &cfg), [2.]);
    }

    #[test]
    fn test_roi_align2d_average_converts_once_per_bin() {
        let dev: TestDevice = Default::default();
        let big = 16777216.0;
        let x = test_tensor(&dev, &[big, big, 1., 1., 1., 1., 1., 1.], [1, 1, 1, 8]);
        // roi_height floors to 1, one sample per column at x + 0.5
        let (rois, idx) = single_roi(&dev, &[0., 0., 0., 8.]);
        let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([1, 8]);
        // samples: big, (big + 1) / 2, then six 1s
        let expected = (big + (big + 1.0) / 2.0 + 6.0) / 8.0;
        assert_eq!(
            x.roi_average_align2d(&rois, &idx, &cfg).as_vec(),
            vec![TestDtype::cast_from_f64(expected)]
        );
    }

    #[test]
    fn test_roi_align2d_roi_outside_map() {
        let dev: TestDevice = Default::default();
        let x = test_tensor(&dev, &[1., 2., 3., 4.], [1, 1, 2, 2]);
        let (rois, idx) = single_roi(&dev, &[10., 10., 12., 12.]);
        let cfg = RoiAlign2DConfig::new([1, 2]);
        assert_eq!(
            x.roi_max_align2d(&rois, &idx, &cfg).as_vec(),
            vec![TestDtype::MIN; 2]
        );
        assert_eq!(
            x.roi_average_align2d(&rois, &idx, &cfg).as_vec(),
            vec![0.0; 2]
        );
    }

    #[test]
    fn test_roi_align2d_zero_sampling_ratio() {
        let dev: TestDevice = Default::default();
        let x = test_tensor(&dev, &[1., 2., 3., 4.], [1, 1, 2, 2]);
        let (rois, idx) = single_roi(&dev, &[0., 0., 1., 1.]);
        let cfg = RoiAlign2DConfig::new([1, 1]).with_sampling_ratio([0, 1]);
        assert_eq!(
            x.try_roi_max_align2d(&rois, &idx, &cfg).unwrap_err(),
            Error::InvalidConfig {
                op: "roi_max_align2d",
                reason: "sampling_ratio must be non-zero"
            }
        );
    }
}
