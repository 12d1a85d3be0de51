// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory content tree.
//!
//! Standalone/testing backend for [`ResourceGraph`]. All sessions share one
//! store; `commit` validates every target first and then applies the whole
//! change set under a single write lock, so readers never observe half a commit.

use super::{
    ChangeSet, Node, NodePath, Principal, PropertyChange, PropertyValue, ResourceGraph,
    StoreError, StoreFuture, PRIMARY_TYPE,
};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct StoredNode {
    node: Node,
    /// Child paths in insertion order.
    children: Vec<NodePath>,
}

#[derive(Debug)]
struct TreeState {
    nodes: BTreeMap<NodePath, StoredNode>,
}

impl TreeState {
    fn new() -> Self {
        let root = NodePath::root();
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root.clone(),
            StoredNode {
                node: Node::new(root),
                children: Vec::new(),
            },
        );
        Self { nodes }
    }

    fn insert(&mut self, node: Node) -> Result<(), StoreError> {
        let path = node.path.clone();
        let Some(parent) = path.parent() else {
            // Replacing the root only swaps its properties.
            if let Some(stored) = self.nodes.get_mut(&path) {
                stored.node = node;
            }
            return Ok(());
        };
        if !self.nodes.contains_key(&parent) {
            return Err(StoreError::NodeNotFound(parent));
        }
        match self.nodes.get_mut(&path) {
            Some(stored) => stored.node = node,
            None => {
                self.nodes.insert(
                    path.clone(),
                    StoredNode {
                        node,
                        children: Vec::new(),
                    },
                );
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.push(path.clone());
                }
            }
        }
        trace!(path = %path, "Inserted node");
        Ok(())
    }
}

/// Shared in-memory tree. Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    state: Arc<RwLock<TreeState>>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TreeState::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a session acting as `principal`.
    pub fn session(&self, principal: impl Into<String>) -> MemorySession {
        MemorySession {
            tree: self.clone(),
            principal: Principal::new(principal),
        }
    }

    /// Insert `node` under its existing parent, replacing a node at the same
    /// path (children are kept).
    pub fn insert(&self, node: Node) -> Result<(), StoreError> {
        let mut state = self.write();
        state.insert(node)
    }

    /// Create every missing node on `path` with `primary_type`; existing nodes
    /// are left untouched. Returns the paths this call created, stopping at the
    /// first insert that fails.
    pub fn ensure_path(&self, path: &NodePath, primary_type: &str) -> Vec<NodePath> {
        let mut state = self.write();
        let mut missing: Vec<NodePath> = Vec::new();
        let mut current = Some(path.clone());
        while let Some(candidate) = current {
            if state.nodes.contains_key(&candidate) {
                break;
            }
            current = candidate.parent();
            missing.push(candidate);
        }

        let mut created = Vec::with_capacity(missing.len());
        for candidate in missing.into_iter().rev() {
            match state.insert(Node::new(candidate.clone()).with_type(primary_type)) {
                Ok(()) => created.push(candidate),
                Err(err) => {
                    debug!(path = %candidate, error = %err, "Stopped creating path");
                    break;
                }
            }
        }
        created
    }

    /// Remove a node and its subtree. Returns the number of nodes removed.
    pub fn remove(&self, path: &NodePath) -> usize {
        if path.is_root() {
            return 0;
        }
        let mut state = self.write();
        if !state.nodes.contains_key(path) {
            return 0;
        }
        let doomed: Vec<NodePath> = state
            .nodes
            .keys()
            .filter(|candidate| *candidate == path || path.is_ancestor_of(candidate))
            .cloned()
            .collect();
        for gone in &doomed {
            state.nodes.remove(gone);
        }
        if let Some(parent) = path.parent() {
            if let Some(parent_node) = state.nodes.get_mut(&parent) {
                parent_node.children.retain(|child| child != path);
            }
        }
        debug!(path = %path, removed = doomed.len(), "Removed subtree");
        doomed.len()
    }

    /// Snapshot a node.
    pub fn node(&self, path: &NodePath) -> Option<Node> {
        self.read().nodes.get(path).map(|stored| stored.node.clone())
    }

    /// Read one property.
    pub fn property(&self, path: &NodePath, name: &str) -> Option<PropertyValue> {
        self.read()
            .nodes
            .get(path)
            .and_then(|stored| stored.node.properties.get(name).cloned())
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn children_of(&self, path: &NodePath) -> Vec<NodePath> {
        self.read()
            .nodes
            .get(path)
            .map(|stored| stored.children.clone())
            .unwrap_or_default()
    }

    fn apply(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut state = self.write();

        // Validate everything before touching anything.
        if let Some(missing) = changes
            .iter()
            .map(PropertyChange::path)
            .find(|path| !state.nodes.contains_key(*path))
        {
            return Err(StoreError::NodeNotFound(missing.clone()));
        }

        let applied = changes.len();
        for change in changes.into_changes() {
            match change {
                PropertyChange::Set { path, name, value } => {
                    if let Some(stored) = state.nodes.get_mut(&path) {
                        stored.node.properties.insert(name, value);
                    }
                }
                PropertyChange::Remove { path, name } => {
                    if name == PRIMARY_TYPE {
                        continue;
                    }
                    if let Some(stored) = state.nodes.get_mut(&path) {
                        stored.node.properties.remove(&name);
                    }
                }
            }
        }
        debug!(changes = applied, "Committed change set");
        Ok(())
    }
}

/// A [`MemoryTree`] session bound to one principal.
#[derive(Debug, Clone)]
pub struct MemorySession {
    tree: MemoryTree,
    principal: Principal,
}

impl MemorySession {
    pub fn tree(&self) -> &MemoryTree {
        &self.tree
    }
}

impl ResourceGraph for MemorySession {
    fn get(&self, path: &NodePath) -> Option<Node> {
        self.tree.node(path)
    }

    fn children(&self, path: &NodePath) -> Vec<NodePath> {
        self.tree.children_of(path)
    }

    fn principal(&self) -> &Principal {
        &self.principal
    }

    fn commit(&self, changes: ChangeSet) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.tree.apply(changes) })
    }
}
