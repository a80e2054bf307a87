//! Common error types for strata.

use thiserror::Error;

/// Errors raised while building keys and entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A key component failed validation.
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    /// A property name failed validation.
    #[error("Invalid property name: {name:?}")]
    InvalidPropertyName { name: String },

    /// A wire timestamp whose nanos fall outside `0..1_000_000_000`.
    #[error("Invalid timestamp: nanos {nanos} out of range")]
    InvalidTimestamp { nanos: i32 },
}

impl CoreError {
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    pub fn invalid_property_name(name: impl Into<String>) -> Self {
        Self::InvalidPropertyName { name: name.into() }
    }

    pub fn invalid_timestamp(nanos: i32) -> Self {
        Self::InvalidTimestamp { nanos }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
