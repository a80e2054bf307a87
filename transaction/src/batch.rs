//! Non-transactional batches.

use strata_core::{Entity, Key, Record};
use strata_mutation::{BatchWriter, Mutation, MutationError};
use tracing::{debug, warn};

use crate::datastore::Datastore;
use crate::error::{TransactionError, TransactionResult};
use crate::options::WriteOptions;
use crate::request::{CommitRequest, CommitResponse};

/// A group of writes sent to the datastore in a single commit, outside any
/// transaction.
pub struct Batch<'d, D: Datastore> {
    datastore: &'d D,
    writer: BatchWriter<'d>,
    options: WriteOptions,
}

impl<'d, D: Datastore> Batch<'d, D> {
    pub fn new(datastore: &'d D, options: WriteOptions) -> Self {
        Self {
            datastore,
            writer: BatchWriter::new(datastore).with_layout(options.layout),
            options,
        }
    }

    pub fn options(&self) -> WriteOptions {
        self.options
    }

    pub fn is_active(&self) -> bool {
        self.writer.is_active()
    }

    /// Insert entities, allocating ids for incomplete keys now.
    pub fn add<I, R>(&mut self, records: I) -> TransactionResult<Vec<Entity>>
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        Ok(self.writer.add(records)?)
    }

    /// Insert entities, letting the server assign ids at commit.
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

    /// The mutation list `submit` would send.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.writer.to_mutations()
    }

    pub fn writer(&self) -> &BatchWriter<'d> {
        &self.writer
    }

    /// Send every pending write in one non-transactional commit.
    ///
    /// The batch stops accepting writes once the commit succeeds. On failure
    /// it stays active and may be submitted again.
    pub fn submit(&mut self) -> TransactionResult<CommitResponse> {
        if !self.writer.is_active() {
            return Err(MutationError::SessionInactive.into());
        }

        let request = CommitRequest::non_transactional(self.writer.to_mutations())
            .with_force_writes(self.options.force_writes);
        let expected = request.auto_id_count();
        debug!(
            mutations = request.mutations.len(),
            force_writes = request.force_writes,
            "submitting batch"
        );

        let response = self.datastore.commit(request).map_err(|e| {
            warn!(error = %e, "batch commit failed");
            TransactionError::from(e)
        })?;
        check_generated_keys(expected, &response)?;

        self.writer.deactivate();
        Ok(response)
    }
}

pub(crate) fn check_generated_keys(
    expected: usize,
    response: &CommitResponse,
) -> TransactionResult<()> {
    let actual = response.generated_keys.len();
    if actual != expected {
        warn!(expected, actual, "commit response has the wrong number of generated keys");
        return Err(TransactionError::generated_key_mismatch(expected, actual));
    }
    Ok(())
}
