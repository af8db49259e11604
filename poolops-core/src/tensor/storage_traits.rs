use rand::distributions::Distribution;
use rand_distr::{StandardNormal, Uniform};
use std::{sync::Arc, vec::Vec};

use crate::{dtypes::Unit, shapes::Shape};

use super::{Error, Tensor};

/// The class of hardware a [Storage] places its buffers on.
///
/// Kernels that only have a host implementation check this before touching
/// any data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Host,
    Accelerator,
}

impl DeviceKind {
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host)
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Accelerator => f.write_str("accelerator"),
        }
    }
}

/// Something that can store nd arrays for a given [Unit].
pub trait Storage<E>: 'static + std::fmt::Debug + Default + Clone + Send + Sync {
    /// Generic Storage type
    type Vec: 'static + std::fmt::Debug + Clone + Send + Sync;

    fn device_kind(&self) -> DeviceKind;

    /// Allocates `len` zeroed elements.
    fn try_alloc_len(&self, len: usize) -> Result<Self::Vec, Error>;

    /// Moves host data onto the device.
    fn try_upload(&self, src: Vec<E>) -> Result<Self::Vec, Error>;

    /// Copies device data back to the host.
    fn download(&self, v: &Self::Vec) -> Vec<E>;
}

/// Construct tensors from host data.
pub trait TensorFromVec<E>: Storage<E> {
    /// Creates a tensor with `shape` from row-major `src`.
    /// ```rust
    /// # use poolops_core::prelude::*;
    /// # let dev: Cpu = Default::default();
    /// let t = dev.tensor_from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]);
    /// assert_eq!(t.shape(), &Shape::from([2, 3]));
    /// ```
    fn tensor_from_vec<S: Into<Shape>>(&self, src: Vec<E>, shape: S) -> Tensor<E, Self> {
        self.try_tensor_from_vec(src, shape).unwrap()
    }

    /// Fallible version of [TensorFromVec::tensor_from_vec]
    fn try_tensor_from_vec<S: Into<Shape>>(
        &self,
        src: Vec<E>,
        shape: S,
    ) -> Result<Tensor<E, Self>, Error>;
}

impl<E: Unit, D: Storage<E>> TensorFromVec<E> for D {
    fn try_tensor_from_vec<S: Into<Shape>>(
        &self,
        src: Vec<E>,
        shape: S,
    ) -> Result<Tensor<E, Self>, Error> {
        let shape = shape.into();
        if src.len() != shape.num_elements() {
            return Err(Error::WrongNumElements);
        }
        let data = self.try_upload(src)?;
        Ok(Tensor {
            data: Arc::new(data),
            shape,
            device: self.clone(),
        })
    }
}

/// Construct tensors filled with zeros.
pub trait ZerosTensor<E>: Storage<E> {
    /// Creates a tensor filled with zeros.
    /// ```rust
    /// # use poolops_core::prelude::*;
    /// # let dev: Cpu = Default::default();
    /// let a: Tensor<f32, _> = dev.zeros_like([2, 3]);
    /// assert_eq!(a.as_vec(), vec![0.0; 6]);
    /// ```
    fn zeros_like<S: Into<Shape>>(&self, shape: S) -> Tensor<E, Self> {
        self.try_zeros_like(shape).unwrap()
    }

    /// Fallible version of [ZerosTensor::zeros_like]
    fn try_zeros_like<S: Into<Shape>>(&self, shape: S) -> Result<Tensor<E, Self>, Error>;
}

impl<E: Unit, D: Storage<E>> ZerosTensor<E> for D {
    fn try_zeros_like<S: Into<Shape>>(&self, shape: S) -> Result<Tensor<E, Self>, Error> {
        let shape = shape.into();
        let data = self.try_alloc_len(shape.num_elements())?;
        Ok(Tensor {
            data: Arc::new(data),
            shape,
            device: self.clone(),
        })
    }
}

/// Constructs tensors filled with random values from a given distribution.
pub trait SampleTensor<E: Unit>: Storage<E> {
    /// Samples a tensor with a given shape from a given distribution.
    fn sample_like<S: Into<Shape>, Dist: Distribution<E>>(
        &self,
        shape: S,
        distr: Dist,
    ) -> Tensor<E, Self> {
        self.try_sample_like(shape, distr).unwrap()
    }

    /// Fallible version of [SampleTensor::sample_like]
    fn try_sample_like<S: Into<Shape>, Dist: Distribution<E>>(
        &self,
        shape: S,
        distr: Dist,
    ) -> Result<Tensor<E, Self>, Error>;

    /// Samples a tensor with a given shape from a standard normal distribution.
    fn sample_normal_like<S: Into<Shape>>(&self, shape: S) -> Tensor<E, Self>
    where
        StandardNormal: Distribution<E>,
    {
        self.sample_like(shape, StandardNormal)
    }

    /// Samples a tensor with a given shape from a uniform distribution over `[low, high)`.
    fn sample_range_like<S: Into<Shape>>(&self, shape: S, low: E, high: E) -> Tensor<E, Self>
    where
        E: rand_distr::uniform::SampleUniform,
    {
        self.sample_like(shape, Uniform::new(low, high))
    }
}
