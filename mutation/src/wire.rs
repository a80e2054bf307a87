//! Mutation shapes sent to the server at commit.

use serde::{Deserialize, Serialize};
use strata_core::{Entity, IncompleteEntity, Key};

/// One entry of a commit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    Insert(Entity),
    Upsert(Entity),
    Update(Entity),
    Delete(Key),
    /// Insert whose id the server assigns at commit.
    InsertAutoId(IncompleteEntity),
}

impl Mutation {
    /// The targeted key, when it is already known.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Mutation::Insert(e) | Mutation::Upsert(e) | Mutation::Update(e) => Some(e.key()),
            Mutation::Delete(key) => Some(key),
            Mutation::InsertAutoId(_) => None,
        }
    }

    pub fn is_auto_id(&self) -> bool {
        matches!(self, Mutation::InsertAutoId(_))
    }

    // Position in the grouped layout.
    fn group(&self) -> u8 {
        match self {
            Mutation::Insert(_) => 0,
            Mutation::InsertAutoId(_) => 1,
            Mutation::Update(_) => 2,
            Mutation::Upsert(_) => 3,
            Mutation::Delete(_) => 4,
        }
    }
}

/// Order of the mutation list produced by a batch writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationLayout {
    /// Keyed entries in the order each key was first touched, then
    /// server-allocated inserts in call order. A key deleted after an earlier
    /// insert therefore precedes later server-allocated inserts; use
    /// [`GroupedByKind`](Self::GroupedByKind) for the per-kind order the
    /// legacy client sent.
    #[default]
    SlotOrder,
    /// Inserts, server-allocated inserts, updates, upserts, deletes. Slot
    /// order is kept inside each group. This is the per-kind layout of the
    /// legacy commit API.
    GroupedByKind,
}

impl MutationLayout {
    pub(crate) fn arrange(self, mutations: &mut [Mutation]) {
        match self {
            MutationLayout::SlotOrder => {}
            // sort_by_key is stable, so slot order survives within a group.
            MutationLayout::GroupedByKind => mutations.sort_by_key(Mutation::group),
        }
    }
}
