//! Strata Mutation
//!
//! Coalesce a batch's write calls into the mutation list sent at commit.
//!
//! Responsibilities:
//! - Apply the merge table when one key receives several operations
//! - Keep each key in the position of its first operation
//! - Resolve incomplete keys through an injected allocator, all or nothing
//! - Queue entities for server-side id allocation
//! - Render the pending state as wire mutations
//!
//! # Module Structure
//!
//! - `writer` - The BatchWriter session that callers drive
//! - `op` - Pending operations and the merge table
//! - `allocator` - The KeyAllocator contract
//! - `wire` - Mutation shapes sent to the server
//! - `error` - Error types for rejected calls

mod allocator;
mod error;
mod op;
mod wire;
mod writer;

pub use allocator::{AllocatorError, KeyAllocator};
pub use error::{MutationError, MutationResult};
pub use op::{merge, MergeRejection, OpKind, PendingOp};
pub use wire::{Mutation, MutationLayout};
pub use writer::{BatchWriter, WriterState};
