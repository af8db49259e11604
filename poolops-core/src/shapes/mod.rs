//! Runtime shapes.
//!
//! Pooling ops take their window geometry as integer vectors whose length
//! is only known once an input arrives, so a [Shape] is a plain list of
//! dimensions rather than a compile time tuple.
//!
//! ```rust
//! # use poolops_core::shapes::Shape;
//! let s = Shape::from([2, 3, 4, 5]);
//! assert_eq!(s.ndim(), 4);
//! assert_eq!(s.num_elements(), 120);
//! assert_eq!(s.strides(), vec![60, 20, 5, 1]);
//! assert_eq!(s.spatial_dims(), &[4, 5]);
//! ```

use std::vec::Vec;

/// A row-major, contiguous layout description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// The number of dimensions the shape has
    #[inline(always)]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline(always)]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// The number of elements in this shape; the product of all dimensions
    /// (1 for a rank 0 shape).
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// The strides of how this shape is laid out in memory.
    #[inline]
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.dims.len()];
        for i in (0..self.dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Dimensions following `(batch, channels)`. Empty for rank < 2.
    #[inline]
    pub fn spatial_dims(&self) -> &[usize] {
        self.dims.get(2..).unwrap_or(&[])
    }
}

impl std::ops::Index<usize> for Shape {
    type Output = usize;
    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.dims[index]
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self { dims }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str(")")
    }
}
