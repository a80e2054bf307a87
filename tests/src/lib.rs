//! Shared fixtures for the strata integration tests.
//!
//! The fixture keys form a small hierarchy under `dataset1`: `key1()` is a
//! root named key, `key2()` and `key3()` are its id-keyed children, and
//! `incomplete_key()` is an incomplete child of `key1()`.

use std::cell::{Cell, RefCell};

use strata_core::{props, Entity, IncompleteEntity, IncompleteKey, Key};
use strata_mutation::{AllocatorError, KeyAllocator};

pub mod prelude {
    pub use crate::{
        assert_error_matches, entity1, entity2, entity3, incomplete_entity_1,
        incomplete_entity_2, incomplete_key, init_tracing, key1, key2, key3, with_foo,
        ScriptedAllocator,
    };
    pub use strata_core::{props, Entity, IncompleteEntity, IncompleteKey, Key, Record, Value};
    pub use strata_mutation::{BatchWriter, Mutation, MutationError, MutationLayout, OpKind};
}

// ========== Fixtures ==========

pub fn key1() -> Key {
    fixture(Key::builder("dataset1", "kind1").name("name1").build())
}

pub fn key2() -> Key {
    fixture(Key::child_of(&key1(), "kind1").id(1).build())
}

pub fn key3() -> Key {
    fixture(Key::child_of(&key1(), "kind1").id(2).build())
}

pub fn incomplete_key() -> IncompleteKey {
    fixture(IncompleteKey::child_of(&key1(), "kind1").build())
}

pub fn entity1() -> Entity {
    fixture(Entity::new(key1(), props!()))
}

pub fn entity2() -> Entity {
    fixture(Entity::new(key2(), props!("bak" => true)))
}

pub fn entity3() -> Entity {
    fixture(Entity::new(key3(), props!("bak" => true)))
}

pub fn incomplete_entity_1() -> IncompleteEntity {
    fixture(IncompleteEntity::new(incomplete_key(), props!()))
}

pub fn incomplete_entity_2() -> IncompleteEntity {
    fixture(IncompleteEntity::new(incomplete_key(), props!("name" => "dan")))
}

/// `entity` with `foo = "bar"` added.
pub fn with_foo(entity: &Entity) -> Entity {
    fixture(Entity::builder_from(entity).set("foo", "bar").build())
}

fn fixture<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("invalid fixture: {}", e),
    }
}

// ========== Allocator Mock ==========

/// A key allocator that answers one expected request with scripted keys.
///
/// Any other request, or a second call, fails the test.
pub struct ScriptedAllocator {
    expected: Vec<IncompleteKey>,
    response: RefCell<Option<Result<Vec<Key>, AllocatorError>>>,
    calls: Cell<usize>,
}

impl ScriptedAllocator {
    pub fn new(expected: Vec<IncompleteKey>, response: Result<Vec<Key>, AllocatorError>) -> Self {
        Self {
            expected,
            response: RefCell::new(Some(response)),
            calls: Cell::new(0),
        }
    }

    /// Expects `[incomplete_key(), incomplete_key()]` and answers
    /// `[key2(), key3()]`.
    pub fn standard() -> Self {
        Self::new(vec![incomplete_key(), incomplete_key()], Ok(vec![key2(), key3()]))
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl KeyAllocator for ScriptedAllocator {
    fn allocate_ids(&self, keys: &[IncompleteKey]) -> Result<Vec<Key>, AllocatorError> {
        self.calls.set(self.calls.get() + 1);
        assert_eq!(keys, self.expected.as_slice(), "unexpected allocation request");
        match self.response.borrow_mut().take() {
            Some(response) => response,
            None => panic!("allocator called more than once"),
        }
    }
}

// ========== Helpers ==========

/// Route `tracing` output through the test harness. Safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Assert that the error message of `result` matches the regex `pattern`.
pub fn assert_error_matches<T: std::fmt::Debug, E: std::fmt::Display>(
    result: Result<T, E>,
    pattern: &str,
) {
    let re = match regex_lite::Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid regex pattern {:?}: {}", pattern, e),
    };
    match result {
        Ok(value) => panic!("expected an error matching {:?}, got Ok({:?})", pattern, value),
        Err(e) => {
            let message = e.to_string();
            assert!(
                re.is_match(&message),
                "error {:?} does not match {:?}",
                message,
                pattern
            );
        }
    }
}
