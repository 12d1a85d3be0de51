// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Content tree model and the read/commit interface the orchestrator needs.
//!
//! The orchestrator never owns the tree. It sees it through a [`ResourceGraph`]:
//! a lazy, read-only view for navigation plus a single atomic `commit` for the
//! metadata it stamps before dispatch.
//!
//! # Paths
//!
//! ```text
//! /                      tree root (always exists, never replicated)
//! └── content
//!     └── site
//!         ├── jcr:content    structural content of "site"
//!         └── page
//! ```
//!
//! A [`ResourceGraph`] is scoped to one acting principal (one session). Two
//! sessions may race on overlapping nodes; conflict detection is the storage
//! layer's job and surfaces as [`StoreError::Conflict`] from `commit`.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub use memory::{MemorySession, MemoryTree};

/// Path delimiter.
pub const DELIMITER: char = '/';

/// Property carrying a node's primary type.
pub const PRIMARY_TYPE: &str = "jcr:primaryType";

/// Boxed future returned by storage operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors raised by the storage layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A change targets a node that is not in the tree.
    #[error("node not found: {0}")]
    NodeNotFound(NodePath),

    /// A concurrent session modified the same node.
    #[error("conflicting modification of {path}: {message}")]
    Conflict { path: NodePath, message: String },

    /// The store cannot accept writes.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// NodePath
// ═══════════════════════════════════════════════════════════════════════════════

/// Absolute, normalised path of a node.
///
/// Always starts with `/`, never ends with one (except the root itself) and
/// never contains empty segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// The tree root.
    pub fn root() -> Self {
        Self(DELIMITER.to_string())
    }

    /// Parse an absolute path, collapsing repeated and trailing delimiters.
    ///
    /// Returns `None` for empty or relative input.
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.starts_with(DELIMITER) {
            return None;
        }
        let segments: Vec<&str> = raw.split(DELIMITER).filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Some(Self::root());
        }
        let mut normalised = String::with_capacity(raw.len());
        for segment in segments {
            normalised.push(DELIMITER);
            normalised.push_str(segment);
        }
        Some(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Last segment, empty for the root.
    pub fn name(&self) -> &str {
        match self.0.rfind(DELIMITER) {
            Some(idx) => &self.0[idx + 1..],
            None => "",
        }
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(DELIMITER) {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Ancestors, nearest first, ending with the root.
    pub fn ancestors(&self) -> Vec<NodePath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            out.push(path);
        }
        out
    }

    /// Number of segments (0 for the root).
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches(DELIMITER).count()
        }
    }

    /// Path of the child named `name`.
    ///
    /// `name` must be a single segment; delimiters inside it are collapsed.
    pub fn child(&self, name: &str) -> NodePath {
        let joined = if self.is_root() {
            format!("/{}", name)
        } else {
            format!("{}/{}", self.0, name)
        };
        Self::parse(&joined).unwrap_or_else(|| self.clone())
    }

    /// True if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        if self == other {
            return false;
        }
        if self.is_root() {
            return true;
        }
        other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'/')
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodePath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NodePath::parse(&value).ok_or_else(|| format!("not an absolute path: '{}'", value))
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Node
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity a session acts as. Stamped into `replicated-by`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(pub String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Strings(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

/// Snapshot of one node, detached from the tree.
///
/// Children are not carried; ask the [`ResourceGraph`] for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub path: NodePath,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Outbound references, in declaration order.
    #[serde(default)]
    pub references: Vec<NodePath>,
}

impl Node {
    pub fn new(path: NodePath) -> Self {
        Self {
            path,
            properties: BTreeMap::new(),
            references: Vec::new(),
        }
    }

    pub fn with_type(mut self, primary_type: &str) -> Self {
        self.properties
            .insert(PRIMARY_TYPE.to_string(), PropertyValue::from(primary_type));
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn with_reference(mut self, target: NodePath) -> Self {
        self.references.push(target);
        self
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.properties.get(PRIMARY_TYPE).and_then(PropertyValue::as_str)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ChangeSet
// ═══════════════════════════════════════════════════════════════════════════════

/// One pending property mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    Set {
        path: NodePath,
        name: String,
        value: PropertyValue,
    },
    Remove {
        path: NodePath,
        name: String,
    },
}

impl PropertyChange {
    pub fn path(&self) -> &NodePath {
        match self {
            PropertyChange::Set { path, .. } | PropertyChange::Remove { path, .. } => path,
        }
    }
}

/// In-memory batch of mutations, committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<PropertyChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: &NodePath, name: &str, value: PropertyValue) {
        self.changes.push(PropertyChange::Set {
            path: path.clone(),
            name: name.to_string(),
            value,
        });
    }

    pub fn remove(&mut self, path: &NodePath, name: &str) {
        self.changes.push(PropertyChange::Remove {
            path: path.clone(),
            name: name.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyChange> {
        self.changes.iter()
    }

    pub fn into_changes(self) -> Vec<PropertyChange> {
        self.changes
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ResourceGraph
// ═══════════════════════════════════════════════════════════════════════════════

/// Session-scoped view over the content tree.
///
/// Reads are synchronous and must not mutate anything. `commit` applies a whole
/// [`ChangeSet`] or nothing.
pub trait ResourceGraph: Send + Sync {
    /// Resolve a node. `None` if it does not exist.
    fn get(&self, path: &NodePath) -> Option<Node>;

    /// Child paths in tree order. Empty for missing nodes.
    fn children(&self, path: &NodePath) -> Vec<NodePath>;

    /// Identity this session acts as.
    fn principal(&self) -> &Principal;

    /// Atomically apply `changes`.
    fn commit(&self, changes: ChangeSet) -> StoreFuture<'_, ()>;

    fn exists(&self, path: &NodePath) -> bool {
        self.get(path).is_some()
    }
}
