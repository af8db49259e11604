use std::vec::Vec;

use poolops_core::{
    dtypes::FloatDtype,
    tensor::{try_alloc_host, Error},
};

use super::RoiAlign2DConfig;
use crate::tensor_ops::utilities::{bilinear_weights, sample_bounds, Reducer, RoiInputs};

pub(super) fn try_roi_align2d_host<E: FloatDtype, R: Reducer<E>>(
    op: &'static str,
    inputs: &RoiInputs<E>,
    cfg: &RoiAlign2DConfig,
) -> Result<Vec<E>, Error> {
    let [pooled_h, pooled_w] = cfg.output_shape;
    let [grid_h, grid_w] = cfg.sampling_ratio;
    let (channels, height, width) = (inputs.channels, inputs.height, inputs.width);
    let mut out = try_alloc_host(inputs.n_rois() * channels * pooled_h * pooled_w, E::zero())?;

    for n in 0..inputs.n_rois() {
        let [start_h, start_w, end_h, end_w] = inputs.scaled_roi(n, cfg.spatial_scale);
        let bin_h = (end_h - start_h).max(1.0) / pooled_h as f64;
        let bin_w = (end_w - start_w).max(1.0) / pooled_w as f64;

        let mut empty_bins = 0;
        for c in 0..channels {
            let plane = inputs.plane(n, c);
            let at = |y: usize, x: usize| plane[y * width + x].as_f64();
            for ph in 0..pooled_h {
                for pw in 0..pooled_w {
                    let mut reducer = R::default();
                    let mut valid = 0;
                    for iy in 0..grid_h {
                        let y = start_h
                            + ph as f64 * bin_h
                            + (iy as f64 + 0.5) * bin_h / grid_h as f64;
                        let Some(yb) = sample_bounds(y, height) else {
                            continue;
                        };
                        for ix in 0..grid_w {
                            let x = start_w
                                + pw as f64 * bin_w
                                + (ix as f64 + 0.5) * bin_w / grid_w as f64;
                            let Some(xb) = sample_bounds(x, width) else {
                                continue;
                            };
                            let [w1, w2, w3, w4] = bilinear_weights(&yb, &xb);
                            let sample = w1 * at(yb.low, xb.low)
                                + w2 * at(yb.low, xb.high)
                                + w3 * at(yb.high, xb.low)
                                + w4 * at(yb.high, xb.high);
                            reducer.accumulate(sample);
                            valid += 1;
                        }
                    }
                    if valid == 0 {
                        empty_bins += 1;
                    }
                    out[((n * channels + c) * pooled_h + ph) * pooled_w + pw] +=
                        reducer.finish(grid_h * grid_w);
                }
            }
        }
        if empty_bins > 0 {
            log::warn!(
                "{op}: roi {n} left {empty_bins} bins without a sample inside the feature map"
            );
        }
    }
    Ok(out)
}
