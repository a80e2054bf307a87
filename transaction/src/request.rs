//! Commit request and response shapes.

use serde::{Deserialize, Serialize};
use strata_core::Key;
use strata_mutation::Mutation;

use crate::datastore::TransactionId;

/// Whether a commit belongs to a server transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitMode {
    Transactional(TransactionId),
    NonTransactional,
}

/// A commit sent to the datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub mode: CommitMode,
    pub mutations: Vec<Mutation>,
    /// Apply the writes even where the service would otherwise refuse them.
    #[serde(default)]
    pub force_writes: bool,
}

impl CommitRequest {
    pub fn non_transactional(mutations: Vec<Mutation>) -> Self {
        Self {
            mode: CommitMode::NonTransactional,
            mutations,
            force_writes: false,
        }
    }

    pub fn transactional(transaction: TransactionId, mutations: Vec<Mutation>) -> Self {
        Self {
            mode: CommitMode::Transactional(transaction),
            mutations,
            force_writes: false,
        }
    }

    pub fn with_force_writes(mut self, force: bool) -> Self {
        self.force_writes = force;
        self
    }

    /// Number of inserts the server assigns ids to.
    pub fn auto_id_count(&self) -> usize {
        self.mutations.iter().filter(|m| m.is_auto_id()).count()
    }
}

/// The datastore's answer to a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// One key per server-allocated insert, in request order.
    #[serde(default)]
    pub generated_keys: Vec<Key>,
}
