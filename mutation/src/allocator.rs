//! The key allocation contract.

use strata_core::{IncompleteKey, Key};
use thiserror::Error;

/// Assigns ids to incomplete keys before commit.
///
/// Implementations must return exactly one key per requested key, in the
/// same order, each one the completion of its request. The batch writer
/// checks this and reports a violation as [`AllocatorError`].
pub trait KeyAllocator {
    fn allocate_ids(&self, keys: &[IncompleteKey]) -> Result<Vec<Key>, AllocatorError>;
}

/// Errors from a key allocation round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocatorError {
    /// The allocation request itself failed.
    #[error("allocation request failed: {message}")]
    Request { message: String, retryable: bool },

    #[error("allocator returned {actual} keys for {expected} requested")]
    LengthMismatch { expected: usize, actual: usize },

    /// A returned key does not complete the key requested in its position.
    #[error("allocator returned {returned} for requested {requested}")]
    Mismatched {
        requested: IncompleteKey,
        returned: Key,
    },
}

impl AllocatorError {
    pub fn request(message: impl Into<String>, retryable: bool) -> Self {
        Self::Request {
            message: message.into(),
            retryable,
        }
    }

    /// Whether repeating the same allocation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AllocatorError::Request { retryable: true, .. })
    }
}

/// Check an allocator response against its request.
pub(crate) fn check_allocation(
    requested: &[IncompleteKey],
    returned: &[Key],
) -> Result<(), AllocatorError> {
    if requested.len() != returned.len() {
        return Err(AllocatorError::LengthMismatch {
            expected: requested.len(),
            actual: returned.len(),
        });
    }
    for (req, ret) in requested.iter().zip(returned) {
        if !ret.is_completion_of(req) {
            return Err(AllocatorError::Mismatched {
                requested: req.clone(),
                returned: ret.clone(),
            });
        }
    }
    Ok(())
}
