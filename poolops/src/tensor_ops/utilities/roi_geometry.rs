use std::ops::Range;

/// Rows (or columns) of the feature map covered by output bin `bin` of an ROI.
///
/// The bin spans `[floor(bin * stride), ceil((bin + 1) * stride))` relative
/// to the ROI origin `offset`; both ends are clamped into `[0, limit]`, so
/// the range may come out empty.
pub fn roi_pooling_slice(bin: usize, stride: f64, limit: usize, offset: i64) -> Range<usize> {
    let start = (bin as f64 * stride).floor() as i64;
    let end = ((bin + 1) as f64 * stride).ceil() as i64;
    let clamp = |v: i64| v.saturating_add(offset).clamp(0, limit as i64) as usize;
    clamp(start)..clamp(end)
}

/// A sampling coordinate snapped onto the feature map, with the two grid
/// lines that enclose it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleBounds {
    pub p: f64,
    pub low: usize,
    pub high: usize,
}

/// Locates continuous coordinate `p` on an axis with `limit` cells.
///
/// Returns `None` when `p` lies outside `[-1, limit]`. Otherwise `p` is
/// clamped to be non-negative; on the last cell (and past it) both
/// neighbours collapse onto `limit - 1` and `p` snaps there too.
pub fn sample_bounds(p: f64, limit: usize) -> Option<SampleBounds> {
    if limit == 0 || p < -1.0 || (limit as f64) < p {
        return None;
    }
    let p = p.max(0.0);
    let low = p as usize;
    let last = limit - 1;
    if low >= last {
        Some(SampleBounds {
            p: last as f64,
            low: last,
            high: last,
        })
    } else {
        Some(SampleBounds {
            p,
            low,
            high: low + 1,
        })
    }
}

/// Weights of the `(low, low)`, `(low, high)`, `(high, low)` and
/// `(high, high)` corners for a sample at `(y, x)`.
#[inline]
pub fn bilinear_weights(y: &SampleBounds, x: &SampleBounds) -> [f64; 4] {
    let ly = y.p - y.low as f64;
    let lx = x.p - x.low as f64;
    let hy = 1.0 - ly;
    let hx = 1.0 - lx;
    [hy * hx, hy * lx, ly * hx, ly * lx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_pooling_slice_basic() {
        // roi_height=4 split into 2 bins
        assert_eq!(roi_pooling_slice(0, 2.0, 10, 0), 0..2);
        assert_eq!(roi_pooling_slice(1, 2.0, 10, 0), 2..4);
        assert_eq!(roi_pooling_slice(1, 2.0, 10, 3), 5..7);
    }

    #[test]
    fn test_roi_pooling_slice_fractional_stride_overlaps() {
        // 5 rows over 2 bins
        assert_eq!(roi_pooling_slice(0, 2.5, 10, 0), 0..3);
        assert_eq!(roi_pooling_slice(1, 2.5, 10, 0), 2..5);
        assert_eq!(roi_pooling_slice(1, 2.5, 10, 1), 3..6);
    }

    #[test]
    fn test_roi_pooling_slice_saturates_extreme_offsets() {
        assert_eq!(roi_pooling_slice(0, 2.0, 4, i64::MAX), 4..4);
        assert_eq!(roi_pooling_slice(1, 2.0, 4, i64::MIN), 0..0);
        assert_eq!(roi_pooling_slice(0, 1e300, 4, 1), 1..4);
        assert_eq!(roi_pooling_slice(1, 1e300, 4, i64::MIN), 0..0);
    }

    #[test]
    fn test_roi_pooling_slice_clamps() {
        assert_eq!(roi_pooling_slice(0, 2.0, 4, -3), 0..0);
        assert_eq!(roi_pooling_slice(0, 2.0, 4, -1), 0..1);
        assert_eq!(roi_pooling_slice(1, 2.0, 4, 3), 4..4);
        assert!(roi_pooling_slice(1, 2.0, 4, 3).is_empty());
    }

    #[test]
    fn test_sample_bounds_interior() {
        assert_eq!(
            sample_bounds(1.25, 4),
            Some(SampleBounds {
                p: 1.25,
                low: 1,
                high: 2
            })
        );
        assert_eq!(
            sample_bounds(0.0, 4),
            Some(SampleBounds {
                p: 0.0,
                low: 0,
                high: 1
            })
        );
    }

    #[test]
    fn test_sample_bounds_clamps_negative() {
        assert_eq!(
            sample_bounds(-0.5, 4),
            Some(SampleBounds {
                p: 0.0,
                low: 0,
                high: 1
            })
        );
        assert_eq!(sample_bounds(-1.0, 4).map(|b| b.low), Some(0));
    }

    #[test]
    fn test_sample_bounds_last_cell() {
        let last = SampleBounds {
            p: 3.0,
            low: 3,
            high: 3,
        };
        assert_eq!(sample_bounds(3.0, 4), Some(last));
        assert_eq!(sample_bounds(3.7, 4), Some(last));
        assert_eq!(sample_bounds(4.0, 4), Some(last));
    }

    #[test]
    fn test_sample_bounds_invalid() {
        assert_eq!(sample_bounds(-1.01, 4), None);
        assert_eq!(sample_bounds(4.01, 4), None);
        assert_eq!(sample_bounds(0.5, 0), None);
    }

    #[test]
    fn test_sample_bounds_single_cell() {
        assert_eq!(
            sample_bounds(0.5, 1),
            Some(SampleBounds {
                p: 0.0,
                low: 0,
                high: 0
            })
        );
    }

    #[test]
    fn test_bilinear_weights() {
        let y = sample_bounds(0.5, 2).unwrap();
        let x = sample_bounds(0.5, 2).unwrap();
        assert_eq!(bilinear_weights(&y, &x), [0.25; 4]);

        let y = sample_bounds(1.25, 4).unwrap();
        let x = sample_bounds(2.0, 4).unwrap();
        assert_eq!(bilinear_weights(&y, &x), [0.75, 0.0, 0.25, 0.0]);
    }
}
