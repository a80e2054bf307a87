//! In-memory datastore for tests and offline use.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_core::{Entity, IncompleteKey, Key};
use strata_mutation::{AllocatorError, KeyAllocator, Mutation};
use tracing::{debug, trace};

use crate::datastore::{Datastore, TransactionId};
use crate::error::{Reason, RpcError, RpcResult};
use crate::request::{CommitMode, CommitRequest, CommitResponse};

/// Ids are drawn below this bound, as the remote service does for
/// scattered ids.
const MAX_ALLOCATED_ID: i64 = 1 << 52;

/// Configuration for [`LocalDatastore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalConfig {
    /// Seed for id allocation. The same seed and call sequence yield the
    /// same ids.
    pub seed: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl LocalConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

struct LocalState {
    entities: HashMap<Key, Entity>,
    allocated: HashSet<Key>,
    rng: StdRng,
    open: HashSet<TransactionId>,
    next_transaction: u64,
    fail_next_allocation: Option<RpcError>,
    fail_next_commit: Option<RpcError>,
    last_commit: Option<CommitRequest>,
}

impl LocalState {
    fn allocate(&mut self, incomplete: &IncompleteKey) -> RpcResult<Key> {
        loop {
            let id = self.rng.gen_range(1..MAX_ALLOCATED_ID);
            let key = incomplete
                .complete(id)
                .map_err(|e| RpcError::new(Reason::InvalidArgument, e.to_string()))?;
            if !self.allocated.contains(&key) && !self.entities.contains_key(&key) {
                self.allocated.insert(key.clone());
                return Ok(key);
            }
        }
    }
}

/// A [`Datastore`] that keeps entities in memory.
///
/// Commits follow the remote service: an insert fails if the key exists, an
/// update fails if it does not, and a commit applies all of its mutations or
/// none of them.
pub struct LocalDatastore {
    state: Mutex<LocalState>,
}

impl Default for LocalDatastore {
    fn default() -> Self {
        Self::new(LocalConfig::default())
    }
}

impl LocalDatastore {
    pub fn new(config: LocalConfig) -> Self {
        Self {
            state: Mutex::new(LocalState {
                entities: HashMap::new(),
                allocated: HashSet::new(),
                rng: StdRng::seed_from_u64(config.seed),
                open: HashSet::new(),
                next_transaction: 1,
                fail_next_allocation: None,
                fail_next_commit: None,
                last_commit: None,
            }),
        }
    }

    pub fn get(&self, key: &Key) -> Option<Entity> {
        self.state.lock().entities.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entities.is_empty()
    }

    /// The last request that was applied.
    pub fn last_commit(&self) -> Option<CommitRequest> {
        self.state.lock().last_commit.clone()
    }

    /// Fail the next `allocate_ids` call with `error`.
    pub fn fail_next_allocation(&self, error: RpcError) {
        self.state.lock().fail_next_allocation = Some(error);
    }

    /// Fail the next `commit` call with `error`, without applying anything.
    pub fn fail_next_commit(&self, error: RpcError) {
        self.state.lock().fail_next_commit = Some(error);
    }
}

impl KeyAllocator for LocalDatastore {
    fn allocate_ids(&self, keys: &[IncompleteKey]) -> Result<Vec<Key>, AllocatorError> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next_allocation.take() {
            debug!(error = %error, "injected allocation failure");
            return Err(error.into());
        }
        let keys = keys
            .iter()
            .map(|key| state.allocate(key))
            .collect::<RpcResult<Vec<_>>>()?;
        trace!(count = keys.len(), "ids allocated");
        Ok(keys)
    }
}

impl Datastore for LocalDatastore {
    fn begin_transaction(&self) -> RpcResult<TransactionId> {
        let mut state = self.state.lock();
        let id = TransactionId::from(state.next_transaction.to_be_bytes().to_vec());
        state.next_transaction += 1;
        state.open.insert(id.clone());
        trace!(transaction = %id, "transaction opened");
        Ok(id)
    }

    fn commit(&self, request: CommitRequest) -> RpcResult<CommitResponse> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next_commit.take() {
            debug!(error = %error, "injected commit failure");
            return Err(error);
        }
        if let CommitMode::Transactional(id) = &request.mode {
            if !state.open.contains(id) {
                return Err(RpcError::new(
                    Reason::InvalidArgument,
                    format!("unknown transaction {}", id),
                ));
            }
        }

        let mut entities = state.entities.clone();
        let mut generated_keys = Vec::new();
        for mutation in &request.mutations {
            match mutation {
                Mutation::Insert(entity) => {
                    if entities.contains_key(entity.key()) {
                        return Err(RpcError::new(
                            Reason::AlreadyExists,
                            format!("entity already exists: {}", entity.key()),
                        ));
                    }
                    entities.insert(entity.key().clone(), entity.clone());
                }
                Mutation::Update(entity) => {
                    if !entities.contains_key(entity.key()) {
                        return Err(RpcError::new(
                            Reason::NotFound,
                            format!("no entity to update: {}", entity.key()),
                        ));
                    }
                    entities.insert(entity.key().clone(), entity.clone());
                }
                Mutation::Upsert(entity) => {
                    entities.insert(entity.key().clone(), entity.clone());
                }
                Mutation::Delete(key) => {
                    entities.remove(key);
                }
                Mutation::InsertAutoId(incomplete) => {
                    let key = state.allocate(incomplete.key())?;
                    entities.insert(key.clone(), incomplete.clone().complete(key.clone()));
                    generated_keys.push(key);
                }
            }
        }

        if let CommitMode::Transactional(id) = &request.mode {
            state.open.remove(id);
        }
        debug!(
            mutations = request.mutations.len(),
            generated = generated_keys.len(),
            "commit applied"
        );
        state.entities = entities;
        state.last_commit = Some(request);
        Ok(CommitResponse { generated_keys })
    }

    fn rollback(&self, transaction: &TransactionId) -> RpcResult<()> {
        let mut state = self.state.lock();
        if !state.open.remove(transaction) {
            return Err(RpcError::new(
                Reason::InvalidArgument,
                format!("unknown transaction {}", transaction),
            ));
        }
        trace!(transaction = %transaction, "transaction rolled back");
        Ok(())
    }
}
