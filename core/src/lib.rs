//! Strata Core Types
//!
//! This crate provides the foundational types shared by the strata client:
//! - Key types (Key, IncompleteKey, PathElement)
//! - Value types (the Value enum and DateTime)
//! - Entity structures (Entity, IncompleteEntity, Record)
//! - Common error types

mod datetime;
mod entity;
mod error;
mod key;
mod validation;
mod value;

pub use datetime::*;
pub use entity::*;
pub use error::*;
pub use key::*;
pub use value::*;
