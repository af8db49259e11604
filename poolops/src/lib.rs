//! # poolops
//!
//! Forward and gradient kernels for pooling, ROI pooling and ROI align,
//! built on the tensors and devices of [poolops_core].
//!
//! Pooling forward ops return, next to their output, a
//! [context::BackwardContext] that owns the device solver of that call.
//! Moving it into the matching gradient op reuses the solver's recorded
//! state:
//!
//! ```rust
//! # use poolops::prelude::*;
//! let dev = Cpu::seed_from_u64(0);
//! let x: Tensor<f32, _> = dev.sample_normal_like([2, 3, 8, 8]);
//! let cfg = AveragePoolConfig::new(vec![2, 2]);
//! let (y, ctx) = x.average_pool(&cfg);
//! assert_eq!(y.shape(), &Shape::from([2, 3, 4, 4]));
//!
//! let gy: Tensor<f32, _> = dev.sample_normal_like([2, 3, 4, 4]);
//! let gx = gy.average_pool_grad(ctx);
//! assert_eq!(gx.shape(), x.shape());
//! assert_eq!(gx.as_vec(), x.average_pool_grad_no_ctx(&y, &gy, &cfg).as_vec());
//! ```
//!
//! ROI ops take the regions as an `(n_rois, 4)` tensor of
//! `(ymin, xmin, ymax, xmax)` rows plus the batch index of each region.
//! They only have host kernels; other devices get
//! [poolops_core::tensor::Error::NotImplemented].
//!
//! # Logging
//!
//! Ops report through the [log] facade. Nothing is printed unless the
//! application installs a logger.

pub mod context;
pub mod tensor_ops;

/// Contains subset of all public exports.
pub mod prelude {
    pub use crate::context::*;
    pub use crate::tensor_ops::*;
    pub use poolops_core::prelude::*;
}
