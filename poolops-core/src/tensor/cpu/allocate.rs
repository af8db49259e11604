use rand::distributions::Distribution;
use std::{sync::Arc, vec::Vec};

use crate::{
    dtypes::Unit,
    shapes::Shape,
    tensor::{storage_traits::*, Error, Tensor},
};

use super::Cpu;

/// Host buffer of `numel` copies of `elem`. A failed reservation is
/// [Error::OutOfMemory] instead of an abort.
///
/// This is the allocation behind every [Cpu] buffer, and host kernels that
/// build their output outside of a device go through it as well.
#[inline]
pub fn try_alloc_host<E: Clone>(numel: usize, elem: E) -> Result<Vec<E>, Error> {
    let mut data: Vec<E> = Vec::new();
    data.try_reserve(numel).map_err(|_| Error::OutOfMemory)?;
    data.resize(numel, elem);
    Ok(data)
}

impl Cpu {
    #[inline]
    pub(crate) fn try_alloc_elem<E: Unit>(&self, numel: usize, elem: E) -> Result<Vec<E>, Error> {
        try_alloc_host(numel, elem)
    }
}

impl<E: Unit> Storage<E> for Cpu {
    type Vec = Vec<E>;

    fn device_kind(&self) -> DeviceKind {
        DeviceKind::Host
    }

    fn try_alloc_len(&self, len: usize) -> Result<Self::Vec, Error> {
        self.try_alloc_elem(len, Default::default())
    }

    fn try_upload(&self, src: Vec<E>) -> Result<Self::Vec, Error> {
        Ok(src)
    }

    fn download(&self, v: &Self::Vec) -> Vec<E> {
        v.clone()
    }
}

impl<E: Unit> SampleTensor<E> for Cpu {
    fn try_sample_like<S: Into<Shape>, Dist: Distribution<E>>(
        &self,
        shape: S,
        distr: Dist,
    ) -> Result<Tensor<E, Self>, Error> {
        let shape = shape.into();
        let mut data = self.try_alloc_elem(shape.num_elements(), Default::default())?;
        {
            let mut rng = self.rng.lock().unwrap();
            data.iter_mut().for_each(|x| *x = distr.sample(&mut *rng));
        }
        Ok(Tensor {
            data: Arc::new(data),
            shape,
            device: self.clone(),
        })
    }
}
