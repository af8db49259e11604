//! Per-device pooling solvers.
//!
//! A solver runs one pooling forward pass and keeps whatever it needs
//! (arg-max positions, window divisors) to later turn an output gradient
//! into an input gradient. Devices hand out solvers through
//! [PoolSolverFactory].
//!
//! ```rust
//! # use poolops_core::prelude::*;
//! let dev: Cpu = Default::default();
//! let x = dev.tensor_from_vec(vec![1.0f32, 5.0, 3.0, 2.0], [1, 1, 2, 2]);
//! let geometry = PoolGeometry::try_new("max_pool", vec![2, 2], vec![2, 2], vec![0, 0], false).unwrap();
//! let mut solver: CpuMaxPool<f32> = dev.try_max_pool_solver(geometry).unwrap();
//! let y = solver.forward(&x).unwrap();
//! assert_eq!(y.as_vec(), vec![5.0]);
//! let gy = dev.tensor_from_vec(vec![1.0f32], [1, 1, 1, 1]);
//! assert_eq!(solver.backward(&gy).unwrap().as_vec(), vec![0.0, 1.0, 0.0, 0.0]);
//! ```

mod cpu_kernel;

pub use cpu_kernel::{CpuAveragePool, CpuMaxPool};

use std::vec::Vec;

use crate::{
    shapes::Shape,
    tensor::{Error, Storage, Tensor},
};

/// How average pooling treats padded positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragePoolPadMode {
    /// Padding counts as zeros: every window divides by its full volume.
    Zero,
    /// Padding is ignored: every window divides by its in-bounds element count.
    Ignore,
}

/// Window geometry of a pooling solver, one entry per spatial axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolGeometry {
    pub kernel_shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub pads: Vec<usize>,
    pub cover_all: bool,
}

impl PoolGeometry {
    pub fn try_new(
        op: &'static str,
        kernel_shape: Vec<usize>,
        strides: Vec<usize>,
        pads: Vec<usize>,
        cover_all: bool,
    ) -> Result<Self, Error> {
        for attr in [&strides, &pads] {
            if attr.len() != kernel_shape.len() {
                return Err(Error::RankMismatch {
                    op,
                    expected: kernel_shape.len(),
                    found: attr.len(),
                });
            }
        }
        if kernel_shape.is_empty() {
            return Err(Error::InvalidConfig {
                op,
                reason: "kernel_shape must name at least one spatial axis",
            });
        }
        if kernel_shape.contains(&0) {
            return Err(Error::InvalidConfig {
                op,
                reason: "kernel_shape entries must be positive",
            });
        }
        if strides.contains(&0) {
            return Err(Error::InvalidConfig {
                op,
                reason: "strides must be positive",
            });
        }
        Ok(Self {
            kernel_shape,
            strides,
            pads,
            cover_all,
        })
    }

    /// Number of spatial axes this geometry pools over.
    pub fn spatial_rank(&self) -> usize {
        self.kernel_shape.len()
    }

    /// The pooled shape of an input `(batch, channels, spatial...)`.
    pub fn try_output_shape(&self, op: &'static str, input: &Shape) -> Result<Shape, Error> {
        if input.ndim() != self.spatial_rank() + 2 {
            return Err(Error::RankMismatch {
                op,
                expected: self.spatial_rank() + 2,
                found: input.ndim(),
            });
        }
        let mut dims = input.dims()[..2].to_vec();
        for (axis, &size) in input.spatial_dims().iter().enumerate() {
            let out = pool_output_dim(
                size,
                self.kernel_shape[axis],
                self.strides[axis],
                self.pads[axis],
                self.cover_all,
            )
            .ok_or(Error::InvalidConfig {
                op,
                reason: "pooling window is larger than the padded input",
            })?;
            dims.push(out);
        }
        Ok(Shape::new(dims))
    }
}

/// Output extent of one pooled axis. `None` when the window does not fit
/// into the padded input even once.
///
/// With `cover_all` the last window may run past the padded input so that
/// every input position is covered, and a window wider than the padded
/// input still yields one output as long as it overhangs by less than a
/// stride.
pub fn pool_output_dim(
    size: usize,
    kernel: usize,
    stride: usize,
    pad: usize,
    cover_all: bool,
) -> Option<usize> {
    if cover_all {
        let span = (size + 2 * pad + stride - 1).checked_sub(kernel)?;
        Some(span / stride + 1)
    } else {
        let span = (size + 2 * pad).checked_sub(kernel)?;
        Some(span / stride + 1)
    }
}

/// A solver for one forward/backward pooling pair.
pub trait PoolForwardBackward<E, D: Storage<E>>: 'static + std::fmt::Debug + Send + Sync {
    /// Pools `x` and records what [PoolForwardBackward::backward] needs.
    fn forward(&mut self, x: &Tensor<E, D>) -> Result<Tensor<E, D>, Error>;

    /// Gradient w.r.t. the input of the last forward call.
    fn backward(&mut self, gy: &Tensor<E, D>) -> Result<Tensor<E, D>, Error>;
}

/// A device that can build pooling solvers.
pub trait PoolSolverFactory<E>: Storage<E> {
    type MaxPool: PoolForwardBackward<E, Self>;
    type AveragePool: PoolForwardBackward<E, Self>;

    fn try_max_pool_solver(&self, geometry: PoolGeometry) -> Result<Self::MaxPool, Error>;

    fn try_average_pool_solver(
        &self,
        geometry: PoolGeometry,
        pad_mode: AveragePoolPadMode,
    ) -> Result<Self::AveragePool, Error>;
}
