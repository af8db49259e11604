//! The handle a pooling forward op returns for its backward op.

use poolops_core::{tensor::Error, tensor_ops::PoolSolverFactory};

/// Owns the solver of exactly one pooling forward call.
///
/// Returned by [crate::tensor_ops::TryPool::try_max_pool] and
/// [crate::tensor_ops::TryPool::try_average_pool], and moved into the
/// matching backward op. Handing it to the other kind of backward op is
/// an [Error::ContextMismatch].
pub enum BackwardContext<E, D: PoolSolverFactory<E>> {
    MaxPool(D::MaxPool),
    AveragePool(D::AveragePool),
}

impl<E, D: PoolSolverFactory<E>> BackwardContext<E, D> {
    /// Name of the forward op that produced this context.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MaxPool(_) => "max_pool",
            Self::AveragePool(_) => "average_pool",
        }
    }

    pub fn try_into_max_pool(self) -> Result<D::MaxPool, Error> {
        match self {
            Self::MaxPool(fb) => Ok(fb),
            other => Err(Error::ContextMismatch {
                expected: "max_pool",
                found: other.kind(),
            }),
        }
    }

    pub fn try_into_average_pool(self) -> Result<D::AveragePool, Error> {
        match self {
            Self::AveragePool(fb) => Ok(fb),
            other => Err(Error::ContextMismatch {
                expected: "average_pool",
                found: other.kind(),
            }),
        }
    }
}

impl<E, D: PoolSolverFactory<E>> std::fmt::Debug for BackwardContext<E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxPool(fb) => f.debug_tuple("MaxPool").field(fb).finish(),
            Self::AveragePool(fb) => f.debug_tuple("AveragePool").field(fb).finish(),
        }
    }
}
