mod allocate;
mod device;

pub use allocate::try_alloc_host;
pub use device::Cpu;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shapes::*, tensor::*};

    #[test]
    fn test_cpu_is_host() {
        let dev: Cpu = Default::default();
        assert_eq!(Storage::<f32>::device_kind(&dev), DeviceKind::Host);
    }

    #[test]
    fn test_try_alloc_host() {
        assert_eq!(try_alloc_host(3, 1.5f32).unwrap(), vec![1.5; 3]);
        assert_eq!(try_alloc_host::<f64>(usize::MAX, 0.0), Err(Error::OutOfMemory));
    }

    #[test]
    fn test_zeros_like() {
        let dev: Cpu = Default::default();
        let t: Tensor<f64, _> = dev.zeros_like([2, 3]);
        assert_eq!(t.shape(), &Shape::from([2, 3]));
        assert_eq!(t.as_vec(), vec![0.0; 6]);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let a: Tensor<f32, _> = Cpu::seed_from_u64(234).sample_normal_like([2, 3]);
        let b: Tensor<f32, _> = Cpu::seed_from_u64(234).sample_normal_like([2, 3]);
        let c: Tensor<f32, _> = Cpu::seed_from_u64(235).sample_normal_like([2, 3]);
        assert_eq!(a.as_vec(), b.as_vec());
        assert_ne!(a.as_vec(), c.as_vec());
    }

    #[test]
    fn test_sample_range() {
        let dev = Cpu::seed_from_u64(0);
        let t: Tensor<f32, _> = dev.sample_range_like([100], -2.0, 3.0);
        assert!(t.as_vec().iter().all(|v| (-2.0..3.0).contains(v)));
    }
}
