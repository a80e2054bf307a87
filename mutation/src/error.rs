//! Mutation error types.

use strata_core::Key;
use thiserror::Error;

use crate::allocator::AllocatorError;
use crate::op::OpKind;

/// Result type for batch writer operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors raised by a batch writer call. Each one aborts only that call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The writer was deactivated (submitted, committed or rolled back).
    #[error("Batch writer is no longer active")]
    SessionInactive,

    /// A second insert for a key that is still pending in this batch.
    #[error("Duplicate key {key}: already inserted in this batch")]
    DuplicateKey { key: Key },

    /// The operation contradicts the key's pending state.
    #[error("Cannot {incoming} {key}: already pending as {existing}")]
    ConflictingOperation {
        key: Key,
        existing: OpKind,
        incoming: OpKind,
    },

    /// The key allocator failed; nothing from the call was applied.
    #[error("Key allocation failed: {0}")]
    AllocatorFailure(#[from] AllocatorError),
}

impl MutationError {
    pub fn duplicate_key(key: Key) -> Self {
        Self::DuplicateKey { key }
    }

    pub fn conflicting_operation(key: Key, existing: OpKind, incoming: OpKind) -> Self {
        Self::ConflictingOperation {
            key,
            existing,
            incoming,
        }
    }
}
