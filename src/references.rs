// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Reference listing.
//!
//! A [`ReferenceLister`] answers "which nodes does this node point at?". The
//! closure builder seeds its working set from that answer, so the order the
//! lister returns is the order dependencies are shipped in.

use crate::tree::{Node, NodePath, ResourceGraph};
use std::collections::HashSet;
use tracing::trace;

/// Lists the nodes referenced from a root node.
///
/// Implementations must not mutate the tree and must visit each node at most
/// once, so cyclic reference graphs terminate.
pub trait ReferenceLister: Send + Sync {
    /// Ordered list of nodes referenced from `root`; with `transitive`, also the
    /// nodes referenced from those, recursively. `root` itself is never listed.
    fn reference_list(&self, graph: &dyn ResourceGraph, root: &Node, transitive: bool) -> Vec<Node>;
}

/// Lister over the references nodes declare.
///
/// References of a node are the ones declared on the node itself plus the ones
/// declared anywhere inside its structural content subtree (the child named
/// `content_node_name`). Targets that do not resolve are skipped.
#[derive(Debug, Clone)]
pub struct DeclaredReferenceLister {
    content_node_name: String,
}

impl Default for DeclaredReferenceLister {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CONTENT_NODE_NAME)
    }
}

impl DeclaredReferenceLister {
    pub fn new(content_node_name: impl Into<String>) -> Self {
        Self {
            content_node_name: content_node_name.into(),
        }
    }

    /// References declared by `node` and its content subtree, in tree order.
    fn declared(&self, graph: &dyn ResourceGraph, node: &Node) -> Vec<NodePath> {
        let mut out = node.references.clone();
        let mut stack = vec![node.path.child(&self.content_node_name)];
        while let Some(path) = stack.pop() {
            let Some(content_node) = graph.get(&path) else {
                continue;
            };
            out.extend(content_node.references.iter().cloned());
            // Reverse so the stack pops children in tree order.
            stack.extend(graph.children(&path).into_iter().rev());
        }
        out
    }

    /// Depth-first walk from `node`, first-seen order, driven by an explicit
    /// stack of pending targets so long chains stay off the call stack.
    fn visit(
        &self,
        graph: &dyn ResourceGraph,
        node: &Node,
        transitive: bool,
        visited: &mut HashSet<NodePath>,
        out: &mut Vec<Node>,
    ) {
        let mut pending: Vec<NodePath> = self.declared(graph, node).into_iter().rev().collect();
        while let Some(target) = pending.pop() {
            if !visited.insert(target.clone()) {
                continue;
            }
            let Some(resolved) = graph.get(&target) else {
                trace!(target = %target, "Skipping dangling reference");
                continue;
            };
            if transitive {
                pending.extend(self.declared(graph, &resolved).into_iter().rev());
            }
            out.push(resolved);
        }
    }
}

impl ReferenceLister for DeclaredReferenceLister {
    fn reference_list(&self, graph: &dyn ResourceGraph, root: &Node, transitive: bool) -> Vec<Node> {
        let mut visited = HashSet::new();
        visited.insert(root.path.clone());
        let mut out = Vec::new();
        self.visit(graph, root, transitive, &mut visited, &mut out);
        trace!(root = %root.path, count = out.len(), transitive, "Listed references");
        out
    }
}
