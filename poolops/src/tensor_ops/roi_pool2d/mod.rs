//! ROI pooling: every region of interest is snapped to whole feature map
//! cells and split into `output_shape` bins, each reduced per channel.
//!
//! ```rust
//! # use poolops::prelude::*;
//! let dev: Cpu = Default::default();
//! let x = dev.tensor_from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
//! let rois = dev.tensor_from_vec(vec![0.0f32, 0.0, 2.0, 2.0], [1, 4]);
//! let roi_indices = dev.tensor_from_vec(vec![0usize], [1]);
//! let cfg = RoiPool2DConfig::new([1, 1]);
//! let y = x.roi_average_pool2d(&rois, &roi_indices, &cfg);
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

/// Attributes of the ROI pooling ops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiPool2DConfig {
    /// `(out_h, out_w)` bins per ROI.
    pub output_shape: [usize; 2],
    /// Maps ROI coordinates onto the feature map.
    pub spatial_scale: f32,
}

impl Default for RoiPool2DConfig {
    fn default() -> Self {
        Self {
            output_shape: [1, 1],
            spatial_scale: 1.0,
        }
    }
}

impl RoiPool2DConfig {
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
}

/// ROI max and average pooling over `(N, C, H, W)` feature maps.
///
/// `rois` holds one `(ymin, xmin, ymax, xmax)` row per region and
/// `roi_indices` the image of the batch each region belongs to. The
/// result has shape `(n_rois, C, out_h, out_w)`. Bins that fall entirely
/// outside the feature map are left at zero.
pub trait TryRoiPool2D<E, D: Storage<E> + Storage<usize>> {
    fn roi_max_pool2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiPool2DConfig,
    ) -> Tensor<E, D> {
        self.try_roi_max_pool2d(rois, roi_indices, cfg).unwrap()
    }

    fn try_roi_max_pool2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiPool2DConfig,
    ) -> Result<Tensor<E, D>, Error>;

    fn roi_average_pool2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiPool2DConfig,
    ) -> Tensor<E, D> {
        self.try_roi_average_pool2d(rois, roi_indices, cfg).unwrap()
    }

    fn try_roi_average_pool2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiPool2DConfig,
    ) -> Result<Tensor<E, D>, Error>;
}

fn try_roi_pool2d<E: FloatDtype, D: Storage<E> + Storage<usize>, R: Reducer<E>>(
    op: &'static str,
    x: &Tensor<E, D>,
    rois: &Tensor<E, D>,
    roi_indices: &Tensor<usize, D>,
    cfg: &RoiPool2DConfig,
) -> Result<Tensor<E, D>, Error> {
    let inputs = RoiInputs::try_new(op, x, rois, roi_indices, cfg.output_shape)?;
    log::debug!(
        "{op}: x={} n_rois={} output_shape={:?} spatial_scale={}",
        x.shape(),
        inputs.n_rois(),
        cfg.output_shape,
        cfg.spatial_scale
    );
    let out = cpu_kernel::try_roi_pool2d_host::<E, R>(&inputs, cfg)?;
    try_roi_output(x, out, inputs.n_rois(), inputs.channels, cfg.output_shape)
}

impl<E: FloatDtype, D: Storage<E> + Storage<usize>> TryRoiPool2D<E, D> for Tensor<E, D> {
    fn try_roi_max_pool2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiPool2DConfig,
    ) -> Result<Tensor<E, D>, Error> {
        try_roi_pool2d::<E, D, MaxReducer<E>>("roi_max_pool2d", self, rois, roi_indices, cfg)
    }

    fn try_roi_average_pool2d(
        &self,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        cfg: &RoiPool2DConfig,
    ) -> Result<Tensor<E, D>, Error> {
        try_roi_pool2d::<E, D, AverageReducer<E>>(
            "roi_average_pool2d",
            self,
            rois,
            roi_indices,
            cfg,
        )
    }
}
