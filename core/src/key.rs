//! Key types for strata entities.
//!
//! A key is a path of `(kind, id-or-name)` elements scoped to a project and an
//! optional namespace. A [`Key`] has every element assigned. An
//! [`IncompleteKey`] has a terminal kind still waiting for an id, either from
//! a client-side allocation or from the server at commit time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::{
    validate_id, validate_kind, validate_name, validate_namespace, validate_project_id,
};

/// The assigned part of a path element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementId {
    /// Numeric id, usually allocated by the server.
    Id(i64),
    /// Caller-chosen name.
    Name(String),
}

impl ElementId {
    fn validate(&self) -> CoreResult<()> {
        match self {
            ElementId::Id(id) => validate_id(*id),
            ElementId::Name(name) => validate_name(name),
        }
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId::Id(id)
    }
}

impl From<&str> for ElementId {
    fn from(name: &str) -> Self {
        ElementId::Name(name.to_string())
    }
}

impl From<String> for ElementId {
    fn from(name: String) -> Self {
        ElementId::Name(name)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Id(id) => write!(f, "{}", id),
            ElementId::Name(name) => write!(f, "{:?}", name),
        }
    }
}

/// One `(kind, id-or-name)` step of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElement {
    pub kind: String,
    #[serde(flatten)]
    pub id: ElementId,
}

impl PathElement {
    pub fn new(kind: impl Into<String>, id: impl Into<ElementId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        validate_kind(&self.kind)?;
        self.id.validate()
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

/// A complete key: every path element carries an id or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "KeyRepr", try_from = "KeyRepr")]
pub struct Key {
    project_id: String,
    namespace: Option<String>,
    ancestors: Vec<PathElement>,
    leaf: PathElement,
}

impl Key {
    /// Start building a root key of the given kind.
    pub fn builder(project_id: impl Into<String>, kind: impl Into<String>) -> KeyBuilder {
        KeyBuilder {
            project_id: project_id.into(),
            namespace: None,
            ancestors: Vec::new(),
            kind: kind.into(),
            id: None,
        }
    }

    /// Start building a key whose parent is `parent`.
    pub fn child_of(parent: &Key, kind: impl Into<String>) -> KeyBuilder {
        KeyBuilder {
            project_id: parent.project_id.clone(),
            namespace: parent.namespace.clone(),
            ancestors: parent.path().cloned().collect(),
            kind: kind.into(),
            id: None,
        }
    }

    /// Start building a copy of `key`.
    pub fn builder_from(key: &Key) -> KeyBuilder {
        KeyBuilder {
            project_id: key.project_id.clone(),
            namespace: key.namespace.clone(),
            ancestors: key.ancestors.clone(),
            kind: key.leaf.kind.clone(),
            id: Some(key.leaf.id.clone()),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Every path element, root first.
    pub fn path(&self) -> impl Iterator<Item = &PathElement> {
        self.ancestors.iter().chain(std::iter::once(&self.leaf))
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len() + 1
    }

    /// The ancestor elements, excluding the terminal one.
    pub fn ancestors(&self) -> &[PathElement] {
        &self.ancestors
    }

    pub fn kind(&self) -> &str {
        &self.leaf.kind
    }

    pub fn element_id(&self) -> &ElementId {
        &self.leaf.id
    }

    pub fn id(&self) -> Option<i64> {
        match &self.leaf.id {
            ElementId::Id(id) => Some(*id),
            ElementId::Name(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.leaf.id {
            ElementId::Id(_) => None,
            ElementId::Name(name) => Some(name),
        }
    }

    /// The parent key, if this key is not a root.
    pub fn parent(&self) -> Option<Key> {
        let (leaf, ancestors) = self.ancestors.split_last()?;
        Some(Key {
            project_id: self.project_id.clone(),
            namespace: self.namespace.clone(),
            ancestors: ancestors.to_vec(),
            leaf: leaf.clone(),
        })
    }

    /// This key with its terminal id removed.
    pub fn to_incomplete(&self) -> IncompleteKey {
        IncompleteKey {
            project_id: self.project_id.clone(),
            namespace: self.namespace.clone(),
            ancestors: self.ancestors.clone(),
            kind: self.leaf.kind.clone(),
        }
    }

    /// Returns true if this key is `incomplete` with an id assigned.
    pub fn is_completion_of(&self, incomplete: &IncompleteKey) -> bool {
        self.project_id == incomplete.project_id
            && self.namespace == incomplete.namespace
            && self.ancestors == incomplete.ancestors
            && self.leaf.kind == incomplete.kind
    }
}

/// Wire form of [`Key`]: the full path as one list.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRepr {
    project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    path: Vec<PathElement>,
}

impl From<Key> for KeyRepr {
    fn from(key: Key) -> Self {
        let mut path = key.ancestors;
        path.push(key.leaf);
        Self {
            project_id: key.project_id,
            namespace: key.namespace,
            path,
        }
    }
}

impl TryFrom<KeyRepr> for Key {
    type Error = CoreError;

    fn try_from(repr: KeyRepr) -> CoreResult<Self> {
        let mut path = repr.path;
        let leaf = path
            .pop()
            .ok_or_else(|| CoreError::invalid_key("key path is empty"))?;
        KeyBuilder {
            project_id: repr.project_id,
            namespace: repr.namespace,
            ancestors: path,
            kind: leaf.kind,
            id: Some(leaf.id),
        }
        .build()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_scope(f, &self.project_id, self.namespace.as_deref())?;
        for element in &self.ancestors {
            write!(f, "{}/", element)?;
        }
        write!(f, "{}", self.leaf)
    }
}

/// A key whose terminal element has a kind but no id yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "IncompleteKeyRepr")]
pub struct IncompleteKey {
    project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ancestors: Vec<PathElement>,
    kind: String,
}

impl IncompleteKey {
    /// Start building a root incomplete key of the given kind.
    pub fn builder(
        project_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> IncompleteKeyBuilder {
        IncompleteKeyBuilder {
            project_id: project_id.into(),
            namespace: None,
            ancestors: Vec::new(),
            kind: kind.into(),
        }
    }

    /// Start building an incomplete key whose parent is `parent`.
    pub fn child_of(parent: &Key, kind: impl Into<String>) -> IncompleteKeyBuilder {
        IncompleteKeyBuilder {
            project_id: parent.project_id.clone(),
            namespace: parent.namespace.clone(),
            ancestors: parent.path().cloned().collect(),
            kind: kind.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn ancestors(&self) -> &[PathElement] {
        &self.ancestors
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn parent(&self) -> Option<Key> {
        let (leaf, ancestors) = self.ancestors.split_last()?;
        Some(Key {
            project_id: self.project_id.clone(),
            namespace: self.namespace.clone(),
            ancestors: ancestors.to_vec(),
            leaf: leaf.clone(),
        })
    }

    /// Assign the terminal id, producing a complete key.
    pub fn complete(&self, id: impl Into<ElementId>) -> CoreResult<Key> {
        let id = id.into();
        id.validate()?;
        Ok(Key {
            project_id: self.project_id.clone(),
            namespace: self.namespace.clone(),
            ancestors: self.ancestors.clone(),
            leaf: PathElement {
                kind: self.kind.clone(),
                id,
            },
        })
    }
}

/// Wire form of [`IncompleteKey`], validated through the builder.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncompleteKeyRepr {
    project_id: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    ancestors: Vec<PathElement>,
    kind: String,
}

impl TryFrom<IncompleteKeyRepr> for IncompleteKey {
    type Error = CoreError;

    fn try_from(repr: IncompleteKeyRepr) -> CoreResult<Self> {
        IncompleteKeyBuilder {
            project_id: repr.project_id,
            namespace: repr.namespace,
            ancestors: repr.ancestors,
            kind: repr.kind,
        }
        .build()
    }
}

impl fmt::Display for IncompleteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_scope(f, &self.project_id, self.namespace.as_deref())?;
        for element in &self.ancestors {
            write!(f, "{}/", element)?;
        }
        write!(f, "{}(?)", self.kind)
    }
}

fn write_scope(f: &mut fmt::Formatter<'_>, project_id: &str, namespace: Option<&str>) -> fmt::Result {
    match namespace {
        Some(ns) => write!(f, "{}/{}:", project_id, ns),
        None => write!(f, "{}:", project_id),
    }
}

fn validate_scope(project_id: &str, namespace: Option<&str>, ancestors: &[PathElement]) -> CoreResult<()> {
    validate_project_id(project_id)?;
    if let Some(ns) = namespace {
        validate_namespace(ns)?;
    }
    for element in ancestors {
        element.validate()?;
    }
    Ok(())
}

/// Builder for [`Key`].
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    project_id: String,
    namespace: Option<String>,
    ancestors: Vec<PathElement>,
    kind: String,
    id: Option<ElementId>,
}

impl KeyBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn ancestor(mut self, element: PathElement) -> Self {
        self.ancestors.push(element);
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(ElementId::Id(id));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.id = Some(ElementId::Name(name.into()));
        self
    }

    pub fn build(self) -> CoreResult<Key> {
        validate_scope(&self.project_id, self.namespace.as_deref(), &self.ancestors)?;
        validate_kind(&self.kind)?;
        let id = self
            .id
            .ok_or_else(|| CoreError::invalid_key(format!("{} has no id or name", self.kind)))?;
        id.validate()?;
        Ok(Key {
            project_id: self.project_id,
            namespace: self.namespace,
            ancestors: self.ancestors,
            leaf: PathElement {
                kind: self.kind,
                id,
            },
        })
    }
}

/// Builder for [`IncompleteKey`].
#[derive(Debug, Clone)]
pub struct IncompleteKeyBuilder {
    project_id: String,
    namespace: Option<String>,
    ancestors: Vec<PathElement>,
    kind: String,
}

impl IncompleteKeyBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn ancestor(mut self, element: PathElement) -> Self {
        self.ancestors.push(element);
        self
    }

    pub fn build(self) -> CoreResult<IncompleteKey> {
        validate_scope(&self.project_id, self.namespace.as_deref(), &self.ancestors)?;
        validate_kind(&self.kind)?;
        Ok(IncompleteKey {
            project_id: self.project_id,
            namespace: self.namespace,
            ancestors: self.ancestors,
            kind: self.kind,
        })
    }
}
