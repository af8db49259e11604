//! Device-side operations this crate provides to the kernel layer.
//!
//! Right now that is the per-device pooling solver factory, see [PoolSolverFactory].

pub(crate) mod pool;

pub use pool::{
    pool_output_dim, AveragePoolPadMode, CpuAveragePool, CpuMaxPool, PoolForwardBackward,
    PoolGeometry, PoolSolverFactory,
};
