//! The batch writer: per-key pending state for one batch or transaction.

use indexmap::IndexMap;
use strata_core::{Entity, IncompleteEntity, IncompleteKey, Key, Record};
use tracing::{debug, trace, warn};

use crate::allocator::{check_allocation, AllocatorError, KeyAllocator};
use crate::error::{MutationError, MutationResult};
use crate::op::{MergeRejection, PendingOp};
use crate::wire::{Mutation, MutationLayout};

/// Lifecycle of a batch writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Accepting operations.
    Active,
    /// Handed off to commit or rollback; rejects every write.
    Inactive,
}

/// Accumulates write calls for one batch or transaction and coalesces them
/// into a mutation list.
///
/// Each key holds at most one pending operation. A later operation on the
/// same key is merged into the existing entry in place, so the key keeps the
/// position of its first operation. Entities left for server-side id
/// allocation are queued separately, in call order.
///
/// Every call is all or nothing: when it fails, the writer is exactly as it
/// was before the call.
pub struct BatchWriter<'a> {
    allocator: &'a dyn KeyAllocator,
    state: WriterState,
    pending: IndexMap<Key, PendingOp>,
    deferred: Vec<IncompleteEntity>,
    layout: MutationLayout,
}

impl<'a> BatchWriter<'a> {
    /// Create an active writer that resolves incomplete keys through `allocator`.
    pub fn new(allocator: &'a dyn KeyAllocator) -> Self {
        Self {
            allocator,
            state: WriterState::Active,
            pending: IndexMap::new(),
            deferred: Vec::new(),
            layout: MutationLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: MutationLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == WriterState::Active
    }

    pub fn layout(&self) -> MutationLayout {
        self.layout
    }

    // ========== Write Operations ==========

    /// Insert entities that must not already exist.
    ///
    /// Incomplete keys from this call are sent to the allocator in a single
    /// request. Entities that arrived with complete keys are staged first, then
    /// the allocated ones. Returns the entities in call order, with allocated
    /// keys filled in.
    pub fn add<I, R>(&mut self, records: I) -> MutationResult<Vec<Entity>>
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        self.ensure_active()?;
        let records: Vec<Record> = records.into_iter().map(Into::into).collect();
        debug!(count = records.len(), "batch add");

        let was_complete: Vec<bool> = records.iter().map(Record::is_complete).collect();
        let entities = self.resolve_keys(records)?;

        // Complete keys take their slots before the freshly allocated ones.
        let tagged = || entities.iter().zip(was_complete.iter().copied());
        let ops = tagged()
            .filter(|(_, complete)| *complete)
            .chain(tagged().filter(|(_, complete)| !*complete))
            .map(|(entity, _)| PendingOp::Insert(entity.clone()));
        let staged = self.stage(ops)?;
        self.apply(staged);
        Ok(entities)
    }

    /// Insert entities, leaving ids of incomplete keys to the server.
    ///
    /// Complete keys go through the same merge rule as [`add`](Self::add).
    pub fn add_with_deferred_allocation<I, R>(&mut self, records: I) -> MutationResult<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        self.ensure_active()?;
        let mut complete = Vec::new();
        let mut incomplete = Vec::new();
        for record in records.into_iter().map(Into::into) {
            match record {
                Record::Complete(entity) => complete.push(PendingOp::Insert(entity)),
                Record::Incomplete(entity) => incomplete.push(entity),
            }
        }
        debug!(
            complete = complete.len(),
            deferred = incomplete.len(),
            "batch add with deferred allocation"
        );

        let staged = self.stage(complete)?;
        self.apply(staged);
        self.deferred.extend(incomplete);
        Ok(())
    }

    /// Write entities whether or not they exist.
    pub fn put<I>(&mut self, entities: I) -> MutationResult<()>
    where
        I: IntoIterator<Item = Entity>,
    {
        self.ensure_active()?;
        let ops: Vec<_> = entities.into_iter().map(PendingOp::Upsert).collect();
        debug!(count = ops.len(), "batch put");
        let staged = self.stage(ops)?;
        self.apply(staged);
        Ok(())
    }

    /// Write entities that must already exist.
    pub fn update<I>(&mut self, entities: I) -> MutationResult<()>
    where
        I: IntoIterator<Item = Entity>,
    {
        self.ensure_active()?;
        let ops: Vec<_> = entities.into_iter().map(PendingOp::Update).collect();
        debug!(count = ops.len(), "batch update");
        let staged = self.stage(ops)?;
        self.apply(staged);
        Ok(())
    }

    pub fn delete<I>(&mut self, keys: I) -> MutationResult<()>
    where
        I: IntoIterator<Item = Key>,
    {
        self.ensure_active()?;
        let ops: Vec<_> = keys.into_iter().map(PendingOp::Delete).collect();
        debug!(count = ops.len(), "batch delete");
        let staged = self.stage(ops)?;
        self.apply(staged);
        Ok(())
    }

    /// Stop accepting writes. Idempotent.
    pub fn deactivate(&mut self) {
        if self.state == WriterState::Active {
            trace!(pending = self.len(), "batch writer deactivated");
        }
        self.state = WriterState::Inactive;
    }

    // ========== Reads ==========

    /// The mutation list for commit. Readable in any state.
    pub fn to_mutations(&self) -> Vec<Mutation> {
        let mut mutations: Vec<Mutation> = self
            .pending
            .values()
            .map(PendingOp::to_mutation)
            .chain(self.deferred.iter().cloned().map(Mutation::InsertAutoId))
            .collect();
        self.layout.arrange(&mut mutations);
        mutations
    }

    /// The pending operation for `key`, if any.
    pub fn pending(&self, key: &Key) -> Option<&PendingOp> {
        self.pending.get(key)
    }

    /// Entities queued for server-side allocation, in call order.
    pub fn deferred(&self) -> &[IncompleteEntity] {
        &self.deferred
    }

    /// Number of mutations [`to_mutations`](Self::to_mutations) would return.
    pub fn len(&self) -> usize {
        self.pending.len() + self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.deferred.is_empty()
    }

    // ========== Internals ==========

    fn ensure_active(&self) -> MutationResult<()> {
        match self.state {
            WriterState::Active => Ok(()),
            WriterState::Inactive => Err(MutationError::SessionInactive),
        }
    }

    /// Complete every incomplete key with one allocator round trip.
    fn resolve_keys(&self, records: Vec<Record>) -> MutationResult<Vec<Entity>> {
        let requested: Vec<IncompleteKey> = records
            .iter()
            .filter_map(|record| match record {
                Record::Incomplete(entity) => Some(entity.key().clone()),
                Record::Complete(_) => None,
            })
            .collect();
        let allocated = if requested.is_empty() {
            Vec::new()
        } else {
            self.allocate(&requested)?
        };

        let mut allocated = allocated.into_iter();
        records
            .into_iter()
            .map(|record| match record {
                Record::Complete(entity) => Ok(entity),
                Record::Incomplete(entity) => allocated
                    .next()
                    .map(|key| entity.complete(key))
                    .ok_or(MutationError::AllocatorFailure(AllocatorError::LengthMismatch {
                        expected: requested.len(),
                        actual: 0,
                    })),
            })
            .collect()
    }

    fn allocate(&self, requested: &[IncompleteKey]) -> MutationResult<Vec<Key>> {
        let keys = self
            .allocator
            .allocate_ids(requested)
            .and_then(|keys| check_allocation(requested, &keys).map(|()| keys))
            .map_err(|e| {
                warn!(requested = requested.len(), error = %e, "key allocation failed");
                MutationError::AllocatorFailure(e)
            })?;
        trace!(allocated = keys.len(), "keys allocated");
        Ok(keys)
    }

    /// Merge `ops` against the pending state without touching it.
    ///
    /// Keys appear in the result in the order this call first touched them.
    fn stage<I>(&self, ops: I) -> MutationResult<IndexMap<Key, PendingOp>>
    where
        I: IntoIterator<Item = PendingOp>,
    {
        let mut staged: IndexMap<Key, PendingOp> = IndexMap::new();
        for op in ops {
            let key = op.key().clone();
            let existing = staged.get(&key).or_else(|| self.pending.get(&key));
            let existing_kind = existing.map(PendingOp::kind);
            let incoming_kind = op.kind();
            let merged = op.merge_onto(existing).map_err(|rejection| {
                debug!(key = %key, ?existing_kind, %incoming_kind, ?rejection, "operation rejected");
                match (rejection, existing_kind) {
                    (MergeRejection::Conflict, Some(existing_kind)) => {
                        MutationError::conflicting_operation(key.clone(), existing_kind, incoming_kind)
                    }
                    _ => MutationError::duplicate_key(key.clone()),
                }
            })?;
            staged.insert(key, merged);
        }
        Ok(staged)
    }

    /// Commit staged entries. Existing keys keep their slot.
    fn apply(&mut self, staged: IndexMap<Key, PendingOp>) {
        for (key, op) in staged {
            self.pending.insert(key, op);
        }
    }
}
