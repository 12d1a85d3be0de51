// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication closure.
//!
//! Given a root node and the nodes it references, compute every node the remote
//! store needs so that it never holds a reference to, or a child of, a node it
//! does not have.
//!
//! # Algorithm
//!
//! ```text
//! references (lister order) ──▶ include(ref, Walk::REFERENCE)
//!                                 │
//!                                 ├─ missing ancestors, top-down (below "/")
//!                                 ├─ the node itself
//!                                 └─ its content subtree (all descendants if deep)
//! root ─────────────────────────▶ include(root, walk)
//! ```
//!
//! Every inserted node brings its own missing ancestors and its structural
//! content with it before anything that depends on it, so the walk reaches its
//! fixed point in one ordered pass. The set only grows and never holds a path
//! twice, so the walk is bounded by tree size.

use crate::tree::{Node, NodePath, ResourceGraph};
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Predicate deciding whether a candidate node may enter a closure.
pub type InclusionPredicate = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// Predicate that admits everything.
pub fn include_all() -> InclusionPredicate {
    Arc::new(|_| true)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ReplicationSet
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered, duplicate-free sequence of node paths.
///
/// Insertion order is submission order: dependencies come first. Two sets
/// are equal only if they hold the same paths in the same order.
#[derive(Debug, Clone, Default)]
pub struct ReplicationSet {
    paths: IndexSet<NodePath>,
}

impl PartialEq for ReplicationSet {
    fn eq(&self, other: &Self) -> bool {
        self.paths.iter().eq(other.paths.iter())
    }
}

impl Eq for ReplicationSet {}

impl ReplicationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless present. Returns true if it was added.
    pub fn insert(&mut self, path: NodePath) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &NodePath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodePath> {
        self.paths.iter()
    }

    /// Position of `path` in submission order.
    pub fn position(&self, path: &NodePath) -> Option<usize> {
        self.paths.get_index_of(path)
    }

    /// Paths as plain strings, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.as_str().to_string()).collect()
    }

    pub fn into_vec(self) -> Vec<NodePath> {
        self.paths.into_iter().collect()
    }
}

impl FromIterator<NodePath> for ReplicationSet {
    fn from_iter<I: IntoIterator<Item = NodePath>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ReplicationSet {
    type Item = NodePath;
    type IntoIter = indexmap::set::IntoIter<NodePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReplicationSet {
    type Item = &'a NodePath;
    type IntoIter = indexmap::set::Iter<'a, NodePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Walk
// ═══════════════════════════════════════════════════════════════════════════════

/// How far the missing-node walk reaches from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    /// Pull in missing ancestors (below the tree root).
    pub ancestors: bool,
    /// Pull in every descendant, not only structural content.
    pub deep: bool,
}

impl Walk {
    /// Walk applied to each referenced node.
    pub const REFERENCE: Walk = Walk {
        ancestors: true,
        deep: false,
    };

    /// Walk applied to the root of a replicate call.
    pub fn activation(deep: bool) -> Self {
        Walk {
            ancestors: true,
            deep,
        }
    }

    /// Walk applied to the root of a deactivate call.
    pub const DEACTIVATION: Walk = Walk {
        ancestors: false,
        deep: true,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// ClosureBuilder
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes replication closures.
#[derive(Clone)]
pub struct ClosureBuilder {
    content_node_name: String,
    predicate: InclusionPredicate,
}

impl fmt::Debug for ClosureBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureBuilder")
            .field("content_node_name", &self.content_node_name)
            .finish_non_exhaustive()
    }
}

impl Default for ClosureBuilder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CONTENT_NODE_NAME)
    }
}

impl ClosureBuilder {
    pub fn new(content_node_name: impl Into<String>) -> Self {
        Self {
            content_node_name: content_node_name.into(),
            predicate: include_all(),
        }
    }

    /// Replace the inclusion predicate.
    pub fn with_predicate(mut self, predicate: InclusionPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn content_node_name(&self) -> &str {
        &self.content_node_name
    }

    /// Closure for activating `root`: its references (with their missing
    /// ancestors and content) first, then the root walk.
    pub fn activation_closure(
        &self,
        graph: &dyn ResourceGraph,
        root: &Node,
        references: &[Node],
        deep: bool,
    ) -> ReplicationSet {
        let mut set = ReplicationSet::new();
        for reference in references {
            self.include(graph, &reference.path, Walk::REFERENCE, &mut set);
        }
        self.include(graph, &root.path, Walk::activation(deep), &mut set);
        trace!(root = %root.path, deep, size = set.len(), "Built activation closure");
        set
    }

    /// Closure for deactivating `root`: the root and all its descendants.
    pub fn deactivation_closure(&self, graph: &dyn ResourceGraph, root: &Node) -> ReplicationSet {
        let mut set = ReplicationSet::new();
        self.include(graph, &root.path, Walk::DEACTIVATION, &mut set);
        trace!(root = %root.path, size = set.len(), "Built deactivation closure");
        set
    }

    /// Add `path` and whatever `walk` says it requires to `set`.
    ///
    /// Paths that do not resolve, and nodes the predicate rejects, are skipped
    /// together with everything that would have been reached through them. A
    /// node whose ancestor chain cannot be completed is skipped as well.
    /// Returns true if `path` is in `set` afterwards.
    ///
    /// Descendants are walked with an explicit stack in pre-order, so the depth
    /// of the tree does not bound the depth of the call stack.
    pub fn include(&self, graph: &dyn ResourceGraph, path: &NodePath, walk: Walk, set: &mut ReplicationSet) -> bool {
        let mut pending = Vec::new();
        let included = self.enter(graph, path, walk, set, &mut pending);
        while let Some(child) = pending.pop() {
            // Inside a content subtree everything is structural.
            self.enter(
                graph,
                &child,
                Walk {
                    ancestors: false,
                    deep: true,
                },
                set,
                &mut pending,
            );
        }
        included
    }

    /// Decide `path` and queue the children its walk reaches on `pending`.
    fn enter(
        &self,
        graph: &dyn ResourceGraph,
        path: &NodePath,
        walk: Walk,
        set: &mut ReplicationSet,
        pending: &mut Vec<NodePath>,
    ) -> bool {
        if path.is_root() {
            return false;
        }
        if set.contains(path) {
            // Already present, possibly as someone's ancestor: a deep walk
            // still has to reach the descendants.
            if walk.deep {
                self.queue_children(graph, path, true, pending);
            }
            return true;
        }
        let Some(node) = graph.get(path) else {
            trace!(path = %path, "Skipping missing node");
            return false;
        };
        if !(self.predicate)(&node) {
            trace!(path = %path, "Excluded by inclusion predicate");
            return false;
        }

        if walk.ancestors {
            for ancestor in path.ancestors().into_iter().rev() {
                if ancestor.is_root() || set.contains(&ancestor) {
                    continue;
                }
                // Each ancestor brings its whole content subtree before the
                // next one down the chain is added.
                let included = self.include(
                    graph,
                    &ancestor,
                    Walk {
                        ancestors: false,
                        deep: false,
                    },
                    set,
                );
                if !included {
                    trace!(path = %path, ancestor = %ancestor, "Ancestor excluded, skipping node");
                    return false;
                }
            }
        }

        set.insert(path.clone());
        self.queue_children(graph, path, walk.deep, pending);
        true
    }

    fn queue_children(&self, graph: &dyn ResourceGraph, path: &NodePath, deep: bool, pending: &mut Vec<NodePath>) {
        // Reversed so the stack pops them in tree order.
        pending.extend(
            graph
                .children(path)
                .into_iter()
                .filter(|child| deep || child.name() == self.content_node_name)
                .rev(),
        );
    }
}
