use crate::shapes::Shape;

use super::DeviceKind;

/// Represents a number of different errors that can occur from creating tensors
/// or launching pooling operations.
///
/// Every op in this workspace has a `try_*` form that returns these and a plain
/// form that panics on them, so a precondition failure either propagates or
/// aborts the call.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Device is out of memory
    OutOfMemory,
    /// Not enough elements were provided when creating a tensor
    WrongNumElements,
    /// An input or attribute had the wrong number of dimensions.
    RankMismatch {
        op: &'static str,
        expected: usize,
        found: usize,
    },
    /// An input had the right rank but the wrong extents.
    ShapeMismatch {
        op: &'static str,
        expected: Shape,
        found: Shape,
    },
    /// Window geometry that cannot produce an output.
    InvalidConfig {
        op: &'static str,
        reason: &'static str,
    },
    /// A backward op was handed the context of a different forward op.
    ContextMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The op has no kernel for the device its inputs live on.
    NotImplemented {
        op: &'static str,
        device: DeviceKind,
    },
    /// A solver was asked for gradients before it ran forward.
    BackwardBeforeForward,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RankMismatch {
                op,
                expected,
                found,
            } => write!(f, "{op}: expected rank {expected}, found rank {found}"),
            Self::ShapeMismatch {
                op,
                expected,
                found,
            } => write!(f, "{op}: expected shape {expected}, found {found}"),
            Self::InvalidConfig { op, reason } => write!(f, "{op}: {reason}"),
            Self::ContextMismatch { expected, found } => {
                write!(f, "expected a {expected} backward context, found {found}")
            }
            Self::NotImplemented { op, device } => {
                write!(f, "{op} is not implemented for device {device}")
            }
            _ => write!(f, "{self:?}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_message() {
        let err = Error::NotImplemented {
            op: "roi_max_pool2d",
            device: DeviceKind::Accelerator,
        };
        assert_eq!(
            err.to_string(),
            "roi_max_pool2d is not implemented for device accelerator"
        );
    }

    #[test]
    fn test_unit_variants_use_debug() {
        assert_eq!(Error::OutOfMemory.to_string(), "OutOfMemory");
        assert_eq!(
            Error::BackwardBeforeForward.to_string(),
            "BackwardBeforeForward"
        );
    }
}
