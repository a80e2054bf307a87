//! Entity structures for strata.
//!
//! An entity is a key plus its properties. [`Entity`] carries a complete key;
//! [`IncompleteEntity`] carries a key still waiting for its id. Both are
//! immutable once built: changes go through a builder and yield a new value.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_property_name;
use crate::{IncompleteKey, Key, Properties, Value};

fn validate_properties(properties: &Properties) -> CoreResult<()> {
    for name in properties.keys() {
        validate_property_name(name)?;
    }
    Ok(())
}

/// An entity with a complete key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EntityRepr")]
pub struct Entity {
    key: Key,
    #[serde(default)]
    properties: Properties,
}

impl Entity {
    pub fn new(key: Key, properties: Properties) -> CoreResult<Self> {
        validate_properties(&properties)?;
        Ok(Self { key, properties })
    }

    pub fn builder(key: Key) -> EntityBuilder {
        EntityBuilder {
            key,
            properties: Properties::new(),
        }
    }

    /// Start building a modified copy of `entity`.
    pub fn builder_from(entity: &Entity) -> EntityBuilder {
        EntityBuilder {
            key: entity.key.clone(),
            properties: entity.properties.clone(),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Get a property value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn into_parts(self) -> (Key, Properties) {
        (self.key, self.properties)
    }
}

/// Builder for [`Entity`].
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    key: Key,
    properties: Properties,
}

impl EntityBuilder {
    /// Replace the key.
    pub fn key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    /// Set a property, keeping its position if it already exists.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn remove(mut self, name: &str) -> Self {
        self.properties.shift_remove(name);
        self
    }

    pub fn build(self) -> CoreResult<Entity> {
        Entity::new(self.key, self.properties)
    }
}

/// An entity whose key has no id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IncompleteEntityRepr")]
pub struct IncompleteEntity {
    key: IncompleteKey,
    #[serde(default)]
    properties: Properties,
}

impl IncompleteEntity {
    pub fn new(key: IncompleteKey, properties: Properties) -> CoreResult<Self> {
        validate_properties(&properties)?;
        Ok(Self { key, properties })
    }

    pub fn key(&self) -> &IncompleteKey {
        &self.key
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Attach an assigned key, keeping the properties.
    pub fn complete(self, key: Key) -> Entity {
        Entity {
            key,
            properties: self.properties,
        }
    }
}

// Deserialization goes through these so property names are validated.

#[derive(Deserialize)]
struct EntityRepr {
    key: Key,
    #[serde(default)]
    properties: Properties,
}

impl TryFrom<EntityRepr> for Entity {
    type Error = CoreError;

    fn try_from(repr: EntityRepr) -> CoreResult<Self> {
        Entity::new(repr.key, repr.properties)
    }
}

#[derive(Deserialize)]
struct IncompleteEntityRepr {
    key: IncompleteKey,
    #[serde(default)]
    properties: Properties,
}

impl TryFrom<IncompleteEntityRepr> for IncompleteEntity {
    type Error = CoreError;

    fn try_from(repr: IncompleteEntityRepr) -> CoreResult<Self> {
        IncompleteEntity::new(repr.key, repr.properties)
    }
}

/// Either kind of entity, as accepted by insert calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Complete(Entity),
    Incomplete(IncompleteEntity),
}

impl Record {
    /// The key, if it is complete.
    pub fn complete_key(&self) -> Option<&Key> {
        match self {
            Record::Complete(entity) => Some(entity.key()),
            Record::Incomplete(_) => None,
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Record::Complete(entity) => entity.properties(),
            Record::Incomplete(entity) => entity.properties(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Record::Complete(_))
    }
}

impl From<Entity> for Record {
    fn from(entity: Entity) -> Self {
        Record::Complete(entity)
    }
}

impl From<IncompleteEntity> for Record {
    fn from(entity: IncompleteEntity) -> Self {
        Record::Incomplete(entity)
    }
}
