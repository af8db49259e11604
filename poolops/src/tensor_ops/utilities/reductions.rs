use std::marker::PhantomData;

use poolops_core::dtypes::FloatDtype;

/// Folds the samples of one output bin into a single value of `E`.
///
/// Samples are accumulated in `f64` and only the finished value is
/// converted to `E`. ROI kernels are generic over the reducer, so picking
/// max or average pooling is a type parameter and not a runtime branch.
pub trait Reducer<E>: Default {
    fn accumulate(&mut self, sample: f64);

    /// The bin's value. `sample_count` is the number of samples the bin
    /// was laid out with, which can be more than were accumulated.
    fn finish(self, sample_count: usize) -> E;
}

/// Running maximum. Starts at the most negative finite value of `E`, which
/// is what a bin without any samples yields.
#[derive(Debug, Clone, Copy)]
pub struct MaxReducer<E> {
    max: f64,
    marker: PhantomData<E>,
}

impl<E: FloatDtype> Default for MaxReducer<E> {
    fn default() -> Self {
        Self {
            max: E::min_value().as_f64(),
            marker: PhantomData,
        }
    }
}

impl<E: FloatDtype> Reducer<E> for MaxReducer<E> {
    #[inline(always)]
    fn accumulate(&mut self, sample: f64) {
        if self.max < sample {
            self.max = sample;
        }
    }

    #[inline(always)]
    fn finish(self, _sample_count: usize) -> E {
        E::cast_from_f64(self.max)
    }
}

/// Running sum divided by the laid out sample count.
#[derive(Debug, Clone, Copy)]
pub struct AverageReducer<E> {
    sum: f64,
    marker: PhantomData<E>,
}

impl<E: FloatDtype> Default for AverageReducer<E> {
    fn default() -> Self {
        Self {
            sum: 0.0,
            marker: PhantomData,
        }
    }
}

impl<E: FloatDtype> Reducer<E> for AverageReducer<E> {
    #[inline(always)]
    fn accumulate(&mut self, sample: f64) {
        self.sum += sample;
    }

    #[inline(always)]
    fn finish(self, sample_count: usize) -> E {
        if sample_count == 0 {
            return E::zero();
        }
        E::cast_from_f64(self.sum / sample_count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn test_max_reducer() {
        let mut r = MaxReducer::<TestDtype>::default();
        for v in [1.0, -3.0, 7.5, 2.0] {
            r.accumulate(v);
        }
        assert_eq!(r.finish(4), 7.5);
    }

    #[test]
    fn test_max_reducer_empty_is_lowest() {
        let r = MaxReducer::<TestDtype>::default();
        assert_eq!(r.finish(4), TestDtype::MIN);
    }

    #[test]
    fn test_average_reducer_divides_by_laid_out_count() {
        let mut r = AverageReducer::<TestDtype>::default();
        r.accumulate(2.0);
        r.accumulate(4.0);
        assert_eq!(r.finish(4), 1.5);
    }

    #[test]
    fn test_average_reducer_sums_before_converting() {
        // each 1.0 is lost when added to 2^24 in f32
        let mut r = AverageReducer::<TestDtype>::default();
        for v in [16777216.0, 1.0, 1.0, 0.0] {
            r.accumulate(v);
        }
        assert_eq!(r.finish(4), 4194304.5);
    }

    #[test]
    fn test_average_reducer_empty_is_zero() {
        assert_eq!(AverageReducer::<TestDtype>::default().finish(4), 0.0);
        assert_eq!(AverageReducer::<TestDtype>::default().finish(0), 0.0);
    }
}
