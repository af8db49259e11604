//! The operator kernels, implemented as traits on [poolops_core::tensor::Tensor].
//!
//! | op | forward | backward |
//! | --- | --- | --- |
//! | max pooling | [TryPool::try_max_pool] | [TryPoolGrad::try_max_pool_grad], [TryPool::try_max_pool_grad_no_ctx] |
//! | average pooling | [TryPool::try_average_pool] | [TryPoolGrad::try_average_pool_grad], [TryPool::try_average_pool_grad_no_ctx] |
//! | ROI max/average pooling | [TryRoiPool2D] | - |
//! | ROI max/average align | [TryRoiAlign2D] | - |
//!
//! Every op has a `try_*` form returning [poolops_core::tensor::Error], and a
//! plain form that panics on error.

mod pool;
mod roi_align2d;
mod roi_pool2d;
pub mod utilities;

pub use pool::{AveragePoolConfig, MaxPoolConfig, TryPool, TryPoolGrad};
pub use roi_align2d::{RoiAlign2DConfig, TryRoiAlign2D};
pub use roi_pool2d::{RoiPool2DConfig, TryRoiPool2D};
