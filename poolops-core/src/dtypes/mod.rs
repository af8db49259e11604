//! Module for data type related traits. Contains things like [Unit], [Dtype], and [FloatDtype].

/// Represents a unit type, but no arithmetic.
pub trait Unit:
    'static
    + Copy
    + Clone
    + Default
    + std::fmt::Debug
    + PartialEq
    + PartialOrd
    + Send
    + Sync
    + std::marker::Unpin
{
}

macro_rules! unit {
    ($($type:ty),*) => {
        $(impl Unit for $type {})*
    };
}

// `usize` is the element of index tensors such as `roi_indices`.
unit!(f32, f64, usize);

/// Represents a data type or element of an array that can have
/// arithmatic operations applied to it. The main difference
/// between [Dtype] and [Unit] is that index types like [`usize`] are
/// [Unit], but not [Dtype].
pub trait Dtype:
    Unit
    + std::ops::Add<Self, Output = Self>
    + std::ops::Sub<Self, Output = Self>
    + std::ops::Mul<Self, Output = Self>
    + std::ops::Div<Self, Output = Self>
    + std::ops::AddAssign
    + std::ops::SubAssign
    + std::ops::MulAssign
    + std::ops::DivAssign
    + num_traits::FromPrimitive
    + num_traits::ToPrimitive
{
}
impl Dtype for f32 {}
impl Dtype for f64 {}

/// Floating point [Dtype]s that pooling and ROI kernels can run on.
///
/// Geometry (ROI coordinates, bin sizes, interpolation weights) is always
/// computed in `f64`; these conversions move values in and out of that
/// domain without going through a fallible cast.
pub trait FloatDtype: Dtype + num_traits::Float {
    fn as_f64(self) -> f64;
    fn cast_from_f64(v: f64) -> Self;
}

impl FloatDtype for f32 {
    #[inline(always)]
    fn as_f64(self) -> f64 {
        self as f64
    }
    #[inline(always)]
    fn cast_from_f64(v: f64) -> Self {
        v as f32
    }
}

impl FloatDtype for f64 {
    #[inline(always)]
    fn as_f64(self) -> f64 {
        self
    }
    #[inline(always)]
    fn cast_from_f64(v: f64) -> Self {
        v
    }
}
