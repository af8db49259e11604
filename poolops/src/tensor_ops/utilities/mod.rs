//! Building blocks shared by the ROI kernels: reducer strategies, bin and
//! sample geometry, and input validation.

mod reductions;
mod roi_geometry;

pub use reductions::{AverageReducer, MaxReducer, Reducer};
pub use roi_geometry::{bilinear_weights, roi_pooling_slice, sample_bounds, SampleBounds};

use std::vec::Vec;

use poolops_core::{
    dtypes::FloatDtype,
    shapes::Shape,
    tensor::{Error, Storage, Tensor, TensorFromVec},
};

/// Host copies of the inputs of one ROI op, checked for consistent shapes.
#[derive(Debug, Clone)]
pub(crate) struct RoiInputs<E> {
    pub x: Vec<E>,
    pub rois: Vec<E>,
    pub roi_indices: Vec<usize>,
    pub batch: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl<E: FloatDtype> RoiInputs<E> {
    /// Downloads `x`, `rois` and `roi_indices` after checking that the device
    /// has host kernels, that `x` is `(N, C, H, W)`, `rois` is `(n_rois, 4)`
    /// and `roi_indices` is `(n_rois,)`.
    pub fn try_new<D: Storage<E> + Storage<usize>>(
        op: &'static str,
        x: &Tensor<E, D>,
        rois: &Tensor<E, D>,
        roi_indices: &Tensor<usize, D>,
        output_shape: [usize; 2],
    ) -> Result<Self, Error> {
        let device = <D as Storage<E>>::device_kind(x.device());
        if !device.is_host() {
            return Err(Error::NotImplemented { op, device });
        }
        if output_shape.contains(&0) {
            return Err(Error::InvalidConfig {
                op,
                reason: "output_shape must be non-zero",
            });
        }

        x.check_rank(op, 4)?;
        rois.check_rank(op, 2)?;
        roi_indices.check_rank(op, 1)?;
        let n_rois = rois.shape()[0];
        if rois.shape()[1] != 4 {
            return Err(Error::ShapeMismatch {
                op,
                expected: Shape::from([n_rois, 4]),
                found: rois.shape().clone(),
            });
        }
        if roi_indices.shape()[0] != n_rois {
            return Err(Error::ShapeMismatch {
                op,
                expected: Shape::from([n_rois]),
                found: roi_indices.shape().clone(),
            });
        }

        let dims = x.shape().dims();
        Ok(Self {
            x: x.as_vec(),
            rois: rois.as_vec(),
            roi_indices: roi_indices.as_vec(),
            batch: dims[0],
            channels: dims[1],
            height: dims[2],
            width: dims[3],
        })
    }

    pub fn n_rois(&self) -> usize {
        self.roi_indices.len()
    }

    /// `(ymin, xmin, ymax, xmax)` of ROI `i`, multiplied by `spatial_scale`.
    pub fn scaled_roi(&self, i: usize, spatial_scale: f32) -> [f64; 4] {
        let scale = spatial_scale as f64;
        let row = &self.rois[i * 4..(i + 1) * 4];
        [
            row[0].as_f64() * scale,
            row[1].as_f64() * scale,
            row[2].as_f64() * scale,
            row[3].as_f64() * scale,
        ]
    }

    /// The `(H, W)` plane of channel `c` in the image ROI `i` points at.
    pub fn plane(&self, i: usize, c: usize) -> &[E] {
        let image = self.roi_indices[i];
        debug_assert!(
            image < self.batch,
            "roi {i} points at image {image} of a batch of {}",
            self.batch
        );
        let len = self.height * self.width;
        let start = (image * self.channels + c) * len;
        &self.x[start..start + len]
    }
}

/// Uploads a finished `(n_rois, C, out_h, out_w)` buffer onto `x`'s device.
pub(crate) fn try_roi_output<E: FloatDtype, D: Storage<E>>(
    x: &Tensor<E, D>,
    data: Vec<E>,
    n_rois: usize,
    channels: usize,
    output_shape: [usize; 2],
) -> Result<Tensor<E, D>, Error> {
    TensorFromVec::<E>::try_tensor_from_vec(
        x.device(),
        data,
        [n_rois, channels, output_shape[0], output_shape[1]],
    )
}
