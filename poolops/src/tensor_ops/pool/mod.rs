//! Max and average pooling over any number of spatial axes.
//!
//! Forward returns the pooled tensor together with a [BackwardContext]
//! that owns the device solver. The gradient can then be computed either
//! from that context, or from scratch with the `*_no_ctx` variants, which
//! rebuild the solver and replay the forward pass instead of keeping it
//! alive between the two calls. Both routes give identical gradients.
//!
//! ```rust
//! # use poolops::prelude::*;
//! let dev: Cpu = Default::default();
//! let x = dev.tensor_from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
//! let cfg = MaxPoolConfig::new(vec![2, 2]);
//! let (y, ctx) = x.max_pool(&cfg);
//! assert_eq!(y.as_vec(), vec![4.0]);
//! let gy = dev.tensor_from_vec(vec![1.0f32], [1, 1, 1, 1]);
//! assert_eq!(gy.max_pool_grad(ctx).as_vec(), vec![0.0, 0.0, 0.0, 1.0]);
//! ```

use std::vec::Vec;

use poolops_core::{
    shapes::Shape,
    tensor::{Error, Tensor},
    tensor_ops::{AveragePoolPadMode, PoolForwardBackward, PoolGeometry, PoolSolverFactory},
};

use crate::context::BackwardContext;

/// Attributes of a max pooling op.
///
/// `strides` and `pads` may be left empty: strides then default to
/// `kernel_shape` and pads to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxPoolConfig {
    pub kernel_shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub pads: Vec<usize>,
    pub cover_all: bool,
}

impl MaxPoolConfig {
    pub fn new(kernel_shape: Vec<usize>) -> Self {
        Self {
            kernel_shape,
            ..Default::default()
        }
    }

    pub fn with_strides(mut self, strides: Vec<usize>) -> Self {
        self.strides = strides;
        self
    }

    pub fn with_pads(mut self, pads: Vec<usize>) -> Self {
        self.pads = pads;
        self
    }

    pub fn with_cover_all(mut self, cover_all: bool) -> Self {
        self.cover_all = cover_all;
        self
    }

    fn try_geometry(&self, op: &'static str, x: &Shape) -> Result<PoolGeometry, Error> {
        try_complete_geometry(op, x, &self.kernel_shape, &self.strides, &self.pads, self.cover_all)
    }
}

/// Attributes of an average pooling op. See [MaxPoolConfig] for how empty
/// `strides` and `pads` are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AveragePoolConfig {
    pub kernel_shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub pads: Vec<usize>,
    /// Whether padded zeros count towards each window's divisor.
    pub count_include_pad: bool,
}

impl AveragePoolConfig {
    pub fn new(kernel_shape: Vec<usize>) -> Self {
        Self {
            kernel_shape,
            ..Default::default()
        }
    }

    pub fn with_strides(mut self, strides: Vec<usize>) -> Self {
        self.strides = strides;
        self
    }

    pub fn with_pads(mut self, pads: Vec<usize>) -> Self {
        self.pads = pads;
        self
    }

    pub fn with_count_include_pad(mut self, count_include_pad: bool) -> Self {
        self.count_include_pad = count_include_pad;
        self
    }

    pub fn pad_mode(&self) -> AveragePoolPadMode {
        if self.count_include_pad {
            AveragePoolPadMode::Zero
        } else {
            AveragePoolPadMode::Ignore
        }
    }

    fn try_geometry(&self, op: &'static str, x: &Shape) -> Result<PoolGeometry, Error> {
        try_complete_geometry(op, x, &self.kernel_shape, &self.strides, &self.pads, false)
    }
}

/// Fills in empty strides/pads and checks every attribute matches the
/// spatial rank of `x`.
fn try_complete_geometry(
    op: &'static str,
    x: &Shape,
    kernel_shape: &[usize],
    strides: &[usize],
    pads: &[usize],
    cover_all: bool,
) -> Result<PoolGeometry, Error> {
    let spatial_rank = x.ndim().checked_sub(2).filter(|&r| r > 0).ok_or(Error::RankMismatch {
        op,
        expected: kernel_shape.len() + 2,
        found: x.ndim(),
    })?;
    if kernel_shape.len() != spatial_rank {
        return Err(Error::RankMismatch {
            op,
            expected: spatial_rank,
            found: kernel_shape.len(),
        });
    }
    let strides = if strides.is_empty() {
        kernel_shape.to_vec()
    } else {
        strides.to_vec()
    };
    let pads = if pads.is_empty() {
        vec![0; spatial_rank]
    } else {
        pads.to_vec()
    };
    PoolGeometry::try_new(op, kernel_shape.to_vec(), strides, pads, cover_all)
}

/// Pooling forward ops, and the gradient ops that recompute the forward
/// state instead of taking a [BackwardContext].
pub trait TryPool<E, D: PoolSolverFactory<E>>: Sized {
    /// Max pools `self`. See [TryPool::try_max_pool].
    fn max_pool(&self, cfg: &MaxPoolConfig) -> (Tensor<E, D>, BackwardContext<E, D>) {
        self.try_max_pool(cfg).unwrap()
    }

    /// Max pools `self` of shape `(batch, channels, spatial...)`, returning
    /// the pooled tensor and a context for [TryPoolGrad::try_max_pool_grad].
    fn try_max_pool(
        &self,
        cfg: &MaxPoolConfig,
    ) -> Result<(Tensor<E, D>, BackwardContext<E, D>), Error>;

    /// Average pools `self`. See [TryPool::try_average_pool].
    fn average_pool(&self, cfg: &AveragePoolConfig) -> (Tensor<E, D>, BackwardContext<E, D>) {
        self.try_average_pool(cfg).unwrap()
    }

    /// Average pools `self` of shape `(batch, channels, spatial...)`,
    /// returning the pooled tensor and a context for
    /// [TryPoolGrad::try_average_pool_grad].
    fn try_average_pool(
        &self,
        cfg: &AveragePoolConfig,
    ) -> Result<(Tensor<E, D>, BackwardContext<E, D>), Error>;

    fn max_pool_grad_no_ctx(
        &self,
        y: &Tensor<E, D>,
        gy: &Tensor<E, D>,
        cfg: &MaxPoolConfig,
    ) -> Tensor<E, D> {
        self.try_max_pool_grad_no_ctx(y, gy, cfg).unwrap()
    }

    /// Gradient of max pooling w.r.t. `self`, given the forward output `y`
    /// and its gradient `gy`. Replays the forward pass to find the arg-max
    /// positions.
    fn try_max_pool_grad_no_ctx(
        &self,
        y: &Tensor<E, D>,
        gy: &Tensor<E, D>,
        cfg: &MaxPoolConfig,
    ) -> Result<Tensor<E, D>, Error>;

    fn average_pool_grad_no_ctx(
        &self,
        y: &Tensor<E, D>,
        gy: &Tensor<E, D>,
        cfg: &AveragePoolConfig,
    ) -> Tensor<E, D> {
        self.try_average_pool_grad_no_ctx(y, gy, cfg).unwrap()
    }

    /// Gradient of average pooling w.r.t. `self`, given the forward output
    /// `y` and its gradient `gy`.
    fn try_average_pool_grad_no_ctx(
        &self,
        y: &Tensor<E, D>,
        gy: &Tensor<E, D>,
        cfg: &AveragePoolConfig,
    ) -> Result<Tensor<E, D>, Error>;
}

fn check_same_shape<E, D: PoolSolverFactory<E>>(
    op: &'static str,
    y: &Tensor<E, D>,
    gy: &Tensor<E, D>,
) -> Result<(), Error> {
    if y.shape() != gy.shape() {
        return Err(Error::ShapeMismatch {
            op,
            expected: y.shape().clone(),
            found: gy.shape().clone(),
        });
    }
    Ok(())
}

impl<E, D: PoolSolverFactory<E>> TryPool<E, D> for Tensor<E, D> {
    fn try_max_pool(
        &self,
        cfg: &MaxPoolConfig,
    ) -> Result<(Tensor<E, D>, BackwardContext<E, D>), Error> {
        let geometry = cfg.try_geometry("max_pool", self.shape())?;
        let mut fb = self.device().try_max_pool_solver(geometry)?;
        let out = fb.forward(self)?;
        Ok((out, BackwardContext::MaxPool(fb)))
    }

    fn try_average_pool(
        &self,
        cfg: &AveragePoolConfig,
    ) -> Result<(Tensor<E, D>, BackwardContext<E, D>), Error> {
        let geometry = cfg.try_geometry("average_pool", self.shape())?;
        let mut fb = self
            .device()
            .try_average_pool_solver(geometry, cfg.pad_mode())?;
        let out = fb.forward(self)?;
        Ok((out, BackwardContext::AveragePool(fb)))
    }

    fn try_max_pool_grad_no_ctx(
        &self,
        y: &Tensor<E, D>,
        gy: &Tensor<E, D>,
        cfg: &MaxPoolConfig,
    ) -> Result<Tensor<E, D>, Error> {
        check_same_shape("max_pool_grad_no_ctx", y, gy)?;
        let geometry = cfg.try_geometry("max_pool_grad_no_ctx", self.shape())?;
        let mut fb = self.device().try_max_pool_solver(geometry)?;
        fb.forward(self)?;
        fb.backward(gy)
    }

    fn try_average_pool_grad_no_ctx(
        &self,
        y: &Tensor<E, D>,
        gy: &Tensor<E, D>,
        cfg: &AveragePoolConfig,
    ) -> Result<Tensor<E, D>, Error> {
        check_same_shape("average_pool_grad_no_ctx", y, gy)?;
        let geometry = cfg.try_geometry("average_pool_grad_no_ctx", self.shape())?;
        let mut fb = self
            .device()
            .try_average_pool_solver(geometry, cfg.pad_mode())?;
        fb.forward(self)?;
        fb.backward(gy)
    }
}

/// Pooling gradient ops driven by the [BackwardContext] of the forward call.
pub trait TryPoolGrad<E, D: PoolSolverFactory<E>>: Sized {
    fn max_pool_grad(&self, ctx: BackwardContext<E, D>) -> Tensor<E, D> {
        self.try_max_pool_grad(ctx).unwrap()
    }

    /// Gradient w.r.t. the input of the max pooling call that produced
    /// `ctx`, where `self` is the gradient of its output.
    fn try_max_pool_grad(&self, ctx: BackwardContext<E, D>) -> Result<Tensor<E, D>, Error>;

    fn average_pool_grad(&self, ctx: BackwardContext<E, D>) -> Tensor<E, D> {
        self.try_average_pool_grad(ctx).unwrap()
    }

    /// Gradient w.r.t. the input of the average pooling call that produced
    /// `ctx`, where `self` is the gradient of its output.
    fn try_average_pool_grad(&self, ctx: BackwardContext<E, D>) -> Result<Tensor<E, D>, Error>;
}

impl<E, D: PoolSolverFactory<E>> TryPoolGrad<E, D> for Tensor<E, D> {
    fn try_max_pool_grad(&self, ctx: BackwardContext<E, D>) -> Result<Tensor<E, D>, Error> {
        let mut fb = ctx.try_into_max_pool()?;
        fb.backward(self)
    }

    fn try_average_pool_grad(&self, ctx: BackwardContext<E, D>) -> Result<Tensor<E, D>, Error> {
        let mut fb = ctx.try_into_average_pool()?;
        fb.backward(self)
    }
}
