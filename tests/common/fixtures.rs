//! Content tree fixtures.
//!
//! Builders for small trees and a graph wrapper whose commits always fail.

use replication_orchestrator::tree::{
    ChangeSet, MemorySession, MemoryTree, Node, NodePath, Principal, ResourceGraph, StoreError, StoreFuture,
};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PAGE: &str = "per:Page";
pub const PAGE_CONTENT: &str = "per:PageContent";

pub fn p(raw: &str) -> NodePath {
    NodePath::parse(raw).expect("absolute path")
}

/// Create a page (and any missing ancestors) with its `jcr:content` child.
pub fn page(tree: &MemoryTree, raw: &str) -> NodePath {
    let path = p(raw);
    tree.ensure_path(&path, PAGE);
    tree.insert(Node::new(path.child("jcr:content")).with_type(PAGE_CONTENT))
        .expect("page exists");
    path
}

/// Create a single node of `primary_type` under an existing parent.
pub fn leaf(tree: &MemoryTree, raw: &str, primary_type: &str) -> NodePath {
    let path = p(raw);
    tree.insert(Node::new(path.clone()).with_type(primary_type))
        .expect("parent exists");
    path
}

/// Declare a reference from `from` to `to`.
pub fn add_reference(tree: &MemoryTree, from: &str, to: &str) {
    let node = tree.node(&p(from)).expect("reference source exists");
    tree.insert(node.with_reference(p(to))).expect("reference source exists");
}

pub fn node(tree: &MemoryTree, raw: &str) -> Node {
    tree.node(&p(raw)).expect("node exists")
}

/// `/a` references `/x/b`.
///
/// ```text
/// /a        (per:Page)
/// /x        (sling:Folder)
/// /x/b      (per:Asset)
/// ```
pub fn reference_example() -> MemoryTree {
    let tree = MemoryTree::new();
    leaf(&tree, "/a", PAGE);
    leaf(&tree, "/x", "sling:Folder");
    leaf(&tree, "/x/b", "per:Asset");
    add_reference(&tree, "/a", "/x/b");
    tree
}

/// Pages `/n0 .. /n{links-1}`, each referencing the next one.
pub fn reference_chain(links: usize) -> MemoryTree {
    let tree = MemoryTree::new();
    for i in (0..links).rev() {
        let mut page = Node::new(p(&format!("/n{}", i))).with_type(PAGE);
        if i + 1 < links {
            page = page.with_reference(p(&format!("/n{}", i + 1)));
        }
        tree.insert(page).expect("parent is the root");
    }
    tree
}

/// A single line of `levels` nested folders `/d/d/..`; returns the deepest path.
pub fn nested_folders(levels: usize) -> (MemoryTree, NodePath) {
    let tree = MemoryTree::new();
    let mut deepest = NodePath::root();
    for _ in 0..levels {
        deepest = deepest.child("d");
    }
    tree.ensure_path(&deepest, "sling:Folder");
    (tree, deepest)
}

/// A small site with nested pages, a DAM asset and cross references.
///
/// ```text
/// /content/site                  page
/// /content/site/en               page, content references /content/dam/logo.png
/// /content/site/en/about         page
/// /content/site/en/about/team    page
/// /content/dam/logo.png          nt:file with jcr:content (nt:resource)
/// ```
pub fn site() -> MemoryTree {
    let tree = MemoryTree::new();
    page(&tree, "/content/site");
    page(&tree, "/content/site/en");
    page(&tree, "/content/site/en/about");
    page(&tree, "/content/site/en/about/team");
    tree.ensure_path(&p("/content/dam"), "sling:Folder");
    leaf(&tree, "/content/dam/logo.png", "nt:file");
    leaf(&tree, "/content/dam/logo.png/jcr:content", "nt:resource");
    add_reference(&tree, "/content/site/en/jcr:content", "/content/dam/logo.png");
    tree
}

// =============================================================================
// Failing commits
// =============================================================================

/// A session whose reads pass through and whose commits always fail.
pub struct FailingCommitGraph {
    inner: MemorySession,
    error: StoreError,
    commits: AtomicUsize,
}

impl FailingCommitGraph {
    pub fn new(inner: MemorySession, error: StoreError) -> Self {
        Self {
            inner,
            error,
            commits: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(inner: MemorySession) -> Self {
        Self::new(inner, StoreError::Unavailable("repository is read-only".to_string()))
    }

    /// Commit attempts seen so far.
    pub fn commit_attempts(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl ResourceGraph for FailingCommitGraph {
    fn get(&self, path: &NodePath) -> Option<Node> {
        self.inner.get(path)
    }

    fn children(&self, path: &NodePath) -> Vec<NodePath> {
        self.inner.children(path)
    }

    fn principal(&self) -> &Principal {
        self.inner.principal()
    }

    fn commit(&self, _changes: ChangeSet) -> StoreFuture<'_, ()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        let error = self.error.clone();
        Box::pin(async move { Err(error) })
    }
}
