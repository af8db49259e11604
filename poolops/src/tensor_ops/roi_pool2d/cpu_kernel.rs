use std::vec::Vec;

use poolops_core::{
    dtypes::FloatDtype,
    tensor::{try_alloc_host, Error},
};

use super::RoiPool2DConfig;
use crate::tensor_ops::utilities::{roi_pooling_slice, Reducer, RoiInputs};

/// Pools every ROI of `inputs` into a zero-initialized
/// `(n_rois, C, out_h, out_w)` buffer, reducing each bin with `R`.
pub(super) fn try_roi_pool2d_host<E: FloatDtype, R: Reducer<E>>(
    inputs: &RoiInputs<E>,
    cfg: &RoiPool2DConfig,
) -> Result<Vec<E>, Error> {
    let [out_h, out_w] = cfg.output_shape;
    let (channels, height, width) = (inputs.channels, inputs.height, inputs.width);
    let mut out = try_alloc_host(inputs.n_rois() * channels * out_h * out_w, E::zero())?;

    for i_roi in 0..inputs.n_rois() {
        let [ymin, xmin, ymax, xmax] = inputs
            .scaled_roi(i_roi, cfg.spatial_scale)
            .map(|v| v.round() as i64);
        // coordinates far outside the map saturate at the i64 bounds
        let roi_height = ymax.saturating_sub(ymin).max(1);
        let roi_width = xmax.saturating_sub(xmin).max(1);
        let stride_h = roi_height as f64 / out_h as f64;
        let stride_w = roi_width as f64 / out_w as f64;

        for out_y in 0..out_h {
            let rows = roi_pooling_slice(out_y, stride_h, height, ymin);
            if rows.is_empty() {
                log::trace!("roi {i_roi}: row {out_y} is outside the feature map");
                continue;
            }
            for out_x in 0..out_w {
                let cols = roi_pooling_slice(out_x, stride_w, width, xmin);
                if cols.is_empty() {
                    log::trace!("roi {i_roi}: bin ({out_y}, {out_x}) is outside the feature map");
                    continue;
                }
                let count = rows.len() * cols.len();
                for c in 0..channels {
                    let plane = inputs.plane(i_roi, c);
                    let mut reducer = R::default();
                    for y in rows.clone() {
                        for &v in &plane[y * width + cols.start..y * width + cols.end] {
                            reducer.accumulate(v.as_f64());
                        }
                    }
                    out[((i_roi * channels + c) * out_h + out_y) * out_w + out_x] +=
                        reducer.finish(count);
                }
            }
        }
    }
    Ok(out)
}
