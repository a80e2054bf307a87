//! Pending operations and the merge table.

use std::fmt;

use strata_core::{Entity, Key};

use crate::wire::Mutation;

/// The kind of a pending write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Write; the key must not exist.
    Insert,
    /// Write regardless of existence.
    Upsert,
    /// Write; the key must exist.
    Update,
    Delete,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Insert => "insert",
            OpKind::Upsert => "upsert",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Why the merge table refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRejection {
    /// Insert on a key that already has a pending insert.
    Duplicate,
    /// The operation contradicts the pending one.
    Conflict,
}

/// Resolve the kind left pending after `incoming` is applied on top of `existing`.
///
/// | existing \ incoming | Insert    | Upsert | Update   | Delete |
/// |---------------------|-----------|--------|----------|--------|
/// | none                | Insert    | Upsert | Update   | Delete |
/// | Insert              | Duplicate | Upsert | Upsert   | Delete |
/// | Upsert              | Conflict  | Upsert | Upsert   | Delete |
/// | Update              | Conflict  | Upsert | Update   | Delete |
/// | Delete              | Upsert    | Upsert | Conflict | Delete |
///
/// Insert after delete becomes an upsert: the wire cannot tell that the key
/// will be gone by the time the insert applies.
pub fn merge(existing: Option<OpKind>, incoming: OpKind) -> Result<OpKind, MergeRejection> {
    use OpKind::*;

    let Some(existing) = existing else {
        return Ok(incoming);
    };
    match (existing, incoming) {
        (_, Delete) => Ok(Delete),
        (Insert, Insert) => Err(MergeRejection::Duplicate),
        (Upsert | Update, Insert) => Err(MergeRejection::Conflict),
        (Delete, Update) => Err(MergeRejection::Conflict),
        (Update, Update) => Ok(Update),
        (Insert | Upsert, Update) => Ok(Upsert),
        (Delete, Insert) => Ok(Upsert),
        (_, Upsert) => Ok(Upsert),
    }
}

/// The latest pending write for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    Insert(Entity),
    Upsert(Entity),
    Update(Entity),
    Delete(Key),
}

impl PendingOp {
    pub fn kind(&self) -> OpKind {
        match self {
            PendingOp::Insert(_) => OpKind::Insert,
            PendingOp::Upsert(_) => OpKind::Upsert,
            PendingOp::Update(_) => OpKind::Update,
            PendingOp::Delete(_) => OpKind::Delete,
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            PendingOp::Insert(e) | PendingOp::Upsert(e) | PendingOp::Update(e) => e.key(),
            PendingOp::Delete(key) => key,
        }
    }

    /// The entity payload, absent for deletes.
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            PendingOp::Insert(e) | PendingOp::Upsert(e) | PendingOp::Update(e) => Some(e),
            PendingOp::Delete(_) => None,
        }
    }

    /// Apply this operation on top of `existing`, per the merge table.
    pub fn merge_onto(self, existing: Option<&PendingOp>) -> Result<PendingOp, MergeRejection> {
        let kind = merge(existing.map(PendingOp::kind), self.kind())?;
        Ok(self.retag(kind))
    }

    // The latest payload always wins; only the tag changes.
    fn retag(self, kind: OpKind) -> PendingOp {
        match self {
            PendingOp::Insert(e) | PendingOp::Upsert(e) | PendingOp::Update(e) => match kind {
                OpKind::Insert => PendingOp::Insert(e),
                OpKind::Upsert => PendingOp::Upsert(e),
                OpKind::Update => PendingOp::Update(e),
                OpKind::Delete => PendingOp::Delete(e.into_parts().0),
            },
            PendingOp::Delete(key) => PendingOp::Delete(key),
        }
    }

    pub fn to_mutation(&self) -> Mutation {
        match self {
            PendingOp::Insert(e) => Mutation::Insert(e.clone()),
            PendingOp::Upsert(e) => Mutation::Upsert(e.clone()),
            PendingOp::Update(e) => Mutation::Update(e.clone()),
            PendingOp::Delete(key) => Mutation::Delete(key.clone()),
        }
    }
}
