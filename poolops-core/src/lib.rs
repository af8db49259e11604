//! # poolops-core
//!
//! The array and device layer the `poolops` kernels run on.
//!
//! - [shapes] - runtime ranked [shapes::Shape]s
//! - [dtypes] - element traits, [dtypes::FloatDtype] for the numeric kernels
//! - [tensor] - the [tensor::Tensor] struct, the [tensor::Storage] device seam,
//!   the host [tensor::Cpu] device and the crate wide [tensor::Error]
//! - [tensor_ops] - per-device pooling solvers
//!
//! ```rust
//! # use poolops_core::prelude::*;
//! let dev: Cpu = Default::default();
//! let x: Tensor<f32, _> = dev.zeros_like([1, 3, 4, 4]);
//! assert_eq!(x.shape().spatial_dims(), &[4, 4]);
//! ```

pub mod dtypes;
pub mod shapes;
pub mod tensor;
pub mod tensor_ops;

/// Contains subset of all public exports.
pub mod prelude {
    pub use crate::dtypes::*;
    pub use crate::shapes::*;
    pub use crate::tensor::*;
    pub use crate::tensor_ops::*;
}
