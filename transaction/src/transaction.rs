//! Server-side transactions.

use strata_core::{Entity, Key, Record};
use strata_mutation::{BatchWriter, Mutation};
use tracing::{debug, info, warn};

use crate::batch::check_generated_keys;
use crate::datastore::{Datastore, TransactionId};
use crate::error::{TransactionError, TransactionResult};
use crate::options::WriteOptions;
use crate::request::{CommitRequest, CommitResponse};

/// Lifecycle of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// Writes applied atomically under a server transaction.
///
/// A transaction that is dropped while still active is not rolled back on
/// the server. It expires there on its own.
pub struct Transaction<'d, D: Datastore> {
    datastore: &'d D,
    id: TransactionId,
    writer: BatchWriter<'d>,
    options: WriteOptions,
    state: TransactionState,
}

impl<'d, D: Datastore> Transaction<'d, D> {
    /// Open a transaction on the server.
    pub fn begin(datastore: &'d D, options: WriteOptions) -> TransactionResult<Self> {
        let id = datastore.begin_transaction()?;
        debug!(transaction = %id, "transaction started");
        Ok(Self {
            datastore,
            id,
            writer: BatchWriter::new(datastore).with_layout(options.layout),
            options,
            state: TransactionState::Active,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    pub fn add<I, R>(&mut self, records: I) -> TransactionResult<Vec<Entity>>
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        Ok(self.writer.add(records)?)
    }

    pub fn add_with_deferred_allocation<I, R>(&mut self, records: I) -> TransactionResult<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        Ok(self.writer.add_with_deferred_allocation(records)?)
    }

    pub fn put<I>(&mut self, entities: I) -> TransactionResult<()>
    where
        I: IntoIterator<Item = Entity>,
    {
        Ok(self.writer.put(entities)?)
    }

    pub fn update<I>(&mut self, entities: I) -> TransactionResult<()>
    where
        I: IntoIterator<Item = Entity>,
    {
        Ok(self.writer.update(entities)?)
    }

    pub fn delete<I>(&mut self, keys: I) -> TransactionResult<()>
    where
        I: IntoIterator<Item = Key>,
    {
        Ok(self.writer.delete(keys)?)
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.writer.to_mutations()
    }

    pub fn writer(&self) -> &BatchWriter<'d> {
        &self.writer
    }

    /// Commit the pending writes under this transaction.
    ///
    /// A failed commit leaves the transaction active so it can be rolled back.
    pub fn commit(&mut self) -> TransactionResult<CommitResponse> {
        self.ensure_active()?;

        let request = CommitRequest::transactional(self.id.clone(), self.writer.to_mutations())
            .with_force_writes(self.options.force_writes);
        let expected = request.auto_id_count();
        debug!(
            transaction = %self.id,
            mutations = request.mutations.len(),
            "committing transaction"
        );

        let response = self.datastore.commit(request).map_err(|e| {
            warn!(transaction = %self.id, error = %e, "transaction commit failed");
            TransactionError::from(e)
        })?;
        check_generated_keys(expected, &response)?;

        self.finish(TransactionState::Committed);
        Ok(response)
    }

    /// Abandon the pending writes and release the server transaction.
    pub fn rollback(&mut self) -> TransactionResult<()> {
        self.ensure_active()?;
        self.datastore.rollback(&self.id)?;
        self.finish(TransactionState::RolledBack);
        Ok(())
    }

    fn ensure_active(&self) -> TransactionResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(TransactionError::NoActiveTransaction)
        }
    }

    fn finish(&mut self, state: TransactionState) {
        self.writer.deactivate();
        self.state = state;
        info!(transaction = %self.id, ?state, "transaction finished");
    }
}

impl<D: Datastore> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if self.is_active() {
            warn!(
                transaction = %self.id,
                pending = self.writer.len(),
                "transaction dropped while active"
            );
        }
    }
}
