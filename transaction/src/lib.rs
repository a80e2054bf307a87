//! Strata Transaction
//!
//! Batches and transactions on top of the batch writer.
//!
//! Responsibilities:
//! - Own one batch writer per batch or transaction
//! - Build commit requests from the coalesced mutation list
//! - Implement SUBMIT for batches and BEGIN/COMMIT/ROLLBACK for transactions
//! - Define the datastore RPC contract and its error taxonomy
//! - Provide an in-memory datastore for tests and offline use

mod batch;
mod datastore;
mod error;
mod local;
mod options;
mod request;
mod transaction;

pub use batch::Batch;
pub use datastore::{Datastore, TransactionId};
pub use error::{Reason, RpcError, RpcResult, TransactionError, TransactionResult};
pub use local::{LocalConfig, LocalDatastore};
pub use options::WriteOptions;
pub use request::{CommitMode, CommitRequest, CommitResponse};
pub use transaction::{Transaction, TransactionState};
