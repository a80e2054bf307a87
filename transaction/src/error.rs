//! Transaction and RPC error types.

use std::fmt;

use strata_mutation::{AllocatorError, MutationError};
use thiserror::Error;

/// Failure categories reported by the datastore service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    Aborted,
    AlreadyExists,
    DeadlineExceeded,
    FailedPrecondition,
    Internal,
    InvalidArgument,
    NotFound,
    PermissionDenied,
    ResourceExhausted,
    Unauthorized,
    Unavailable,
}

impl Reason {
    const ALL: [Reason; 11] = [
        Reason::Aborted,
        Reason::AlreadyExists,
        Reason::DeadlineExceeded,
        Reason::FailedPrecondition,
        Reason::Internal,
        Reason::InvalidArgument,
        Reason::NotFound,
        Reason::PermissionDenied,
        Reason::ResourceExhausted,
        Reason::Unauthorized,
        Reason::Unavailable,
    ];

    /// The reason name used by the service.
    pub fn name(&self) -> &'static str {
        match self {
            Reason::Aborted => "ABORTED",
            Reason::AlreadyExists => "ALREADY_EXISTS",
            Reason::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Reason::FailedPrecondition => "FAILED_PRECONDITION",
            Reason::Internal => "INTERNAL",
            Reason::InvalidArgument => "INVALID_ARGUMENT",
            Reason::NotFound => "NOT_FOUND",
            Reason::PermissionDenied => "PERMISSION_DENIED",
            Reason::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Reason::Unauthorized => "UNAUTHORIZED",
            Reason::Unavailable => "UNAVAILABLE",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Reason::Aborted | Reason::AlreadyExists => 409,
            Reason::DeadlineExceeded | Reason::PermissionDenied => 403,
            Reason::FailedPrecondition => 412,
            Reason::Internal => 500,
            Reason::InvalidArgument => 400,
            Reason::NotFound => 404,
            Reason::ResourceExhausted => 402,
            Reason::Unauthorized => 401,
            Reason::Unavailable => 503,
        }
    }

    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Reason::Aborted | Reason::DeadlineExceeded | Reason::Unavailable
        )
    }

    pub fn from_name(name: &str) -> Option<Reason> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Map an HTTP status to a reason. 403 reads as PERMISSION_DENIED and
    /// 409 as ABORTED.
    pub fn from_http_status(status: u16) -> Option<Reason> {
        match status {
            409 => Some(Reason::Aborted),
            403 => Some(Reason::PermissionDenied),
            other => Self::ALL.into_iter().find(|r| r.http_status() == other),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error returned by a datastore RPC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// A failure the service classified.
    #[error("{reason} ({status}): {message}", status = .reason.http_status())]
    Service { reason: Reason, message: String },

    /// A failure with no known reason.
    #[error("unknown error (http {status}): {message}")]
    Unknown { status: u16, message: String },
}

impl RpcError {
    pub fn new(reason: Reason, message: impl Into<String>) -> Self {
        Self::Service {
            reason,
            message: message.into(),
        }
    }

    /// Classify a raw transport failure: the reason name wins, then the
    /// HTTP status.
    pub fn translate(status: u16, reason: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match reason
            .and_then(Reason::from_name)
            .or_else(|| Reason::from_http_status(status))
        {
            Some(reason) => Self::Service { reason, message },
            None => Self::Unknown { status, message },
        }
    }

    pub fn reason(&self) -> Option<Reason> {
        match self {
            RpcError::Service { reason, .. } => Some(*reason),
            RpcError::Unknown { .. } => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.reason().is_some_and(|r| r.is_retryable())
    }
}

impl From<RpcError> for AllocatorError {
    fn from(e: RpcError) -> Self {
        let retryable = e.is_retryable();
        AllocatorError::request(e.to_string(), retryable)
    }
}

/// Result type for datastore RPCs.
pub type RpcResult<T> = Result<T, RpcError>;

/// Transaction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The transaction was already committed or rolled back.
    #[error("no transaction is active")]
    NoActiveTransaction,

    /// A write call was rejected by the batch writer.
    #[error("mutation error: {0}")]
    MutationError(#[from] MutationError),

    /// The datastore rejected a request.
    #[error("rpc error: {0}")]
    RpcError(#[from] RpcError),

    /// The commit response does not match the server-allocated inserts sent.
    #[error("commit returned {actual} generated keys for {expected} server-allocated inserts")]
    GeneratedKeyMismatch { expected: usize, actual: usize },
}

impl TransactionError {
    pub fn generated_key_mismatch(expected: usize, actual: usize) -> Self {
        Self::GeneratedKeyMismatch { expected, actual }
    }
}

/// Result type for batch and transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
