//! The datastore RPC contract consumed by batches and transactions.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_mutation::KeyAllocator;

use crate::error::RpcResult;
use crate::request::{CommitRequest, CommitResponse};

/// Opaque handle of a server-side transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Vec<u8>);

impl TransactionId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for TransactionId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// The write side of a datastore service.
///
/// Transport, authentication and retries live behind this trait. Lookups and
/// queries are not part of it.
pub trait Datastore: KeyAllocator {
    fn begin_transaction(&self) -> RpcResult<TransactionId>;

    fn commit(&self, request: CommitRequest) -> RpcResult<CommitResponse>;

    fn rollback(&self, transaction: &TransactionId) -> RpcResult<()>;
}
