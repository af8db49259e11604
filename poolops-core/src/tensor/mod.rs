//! The [Tensor] struct, the [Storage] device seam, and the [Cpu] device.
//!
//! # Creating tensors
//!
//! Tensors are created through a device. Every [Storage] gets
//! [TensorFromVec] and [ZerosTensor] for free:
//!
//! ```rust
//! # use poolops_core::prelude::*;
//! let dev: Cpu = Default::default();
//! let x = dev.tensor_from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [1, 1, 2, 2]);
//! let z: Tensor<f32, Cpu> = dev.zeros_like([3, 3]);
//! assert_eq!(x.ndim(), 4);
//! assert_eq!(z.as_vec(), vec![0.0; 9]);
//! ```
//!
//! Host devices can also sample random tensors, see [SampleTensor]:
//!
//! ```rust
//! # use poolops_core::prelude::*;
//! let dev = Cpu::seed_from_u64(0);
//! let x: Tensor<f32, _> = dev.sample_normal_like([2, 3, 4, 4]);
//! ```
//!
//! # Devices
//!
//! A device only has to describe how to allocate, upload and download
//! buffers, and which [DeviceKind] it is. Ops that only have host kernels
//! refuse non-host devices with [Error::NotImplemented].

pub(crate) mod cpu;
mod error;
pub(crate) mod storage_traits;

pub use cpu::{try_alloc_host, Cpu};
pub use error::Error;
pub use storage_traits::{
    DeviceKind, SampleTensor, Storage, TensorFromVec, ZerosTensor,
};

use std::{sync::Arc, vec::Vec};

use crate::shapes::Shape;

/// The single tensor struct that stores nd arrays.
///
/// Data is always contiguous and row-major. Cloning a tensor shares the
/// underlying buffer; ops never write into their inputs.
pub struct Tensor<E, D: Storage<E>> {
    pub(crate) data: Arc<D::Vec>,
    pub(crate) shape: Shape,
    pub(crate) device: D,
}

impl<E, D: Storage<E>> Clone for Tensor<E, D> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            shape: self.shape.clone(),
            device: self.device.clone(),
        }
    }
}

impl<E, D: Storage<E>> std::fmt::Debug for Tensor<E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("device", &self.device)
            .field("data", &self.data)
            .finish()
    }
}

impl<E, D: Storage<E>> Tensor<E, D> {
    #[inline(always)]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline(always)]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    #[inline(always)]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Copies the elements back to the host in row-major order.
    pub fn as_vec(&self) -> Vec<E> {
        self.device.download(self.data.as_ref())
    }

    /// Asserts this tensor has `expected` dimensions.
    pub fn check_rank(&self, op: &'static str, expected: usize) -> Result<(), Error> {
        if self.ndim() != expected {
            return Err(Error::RankMismatch {
                op,
                expected,
                found: self.ndim(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn test_tensor_from_vec_wrong_num_elements() {
        let dev: TestDevice = Default::default();
        let r = dev.try_tensor_from_vec(vec![1.0 as TestDtype; 5], [2, 3]);
        assert_eq!(r.unwrap_err(), Error::WrongNumElements);
    }

    #[test]
    fn test_clone_shares_data() {
        let dev: TestDevice = Default::default();
        let a = dev.tensor_from_vec(vec![1.0 as TestDtype, 2.0], [2]);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.data, &b.data));
        assert_eq!(b.as_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_check_rank() {
        let dev: TestDevice = Default::default();
        let a: Tensor<TestDtype, _> = dev.zeros_like([1, 2, 3]);
        assert!(a.check_rank("op", 3).is_ok());
        assert_eq!(
            a.check_rank("op", 4).unwrap_err(),
            Error::RankMismatch {
                op: "op",
                expected: 4,
                found: 3
            }
        );
    }
}
