//! # Replication Orchestrator
//!
//! Computes replication closures over a hierarchical content tree, stamps
//! replication metadata in one atomic commit, and hands the result to a
//! pluggable distribution backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                        ReplicationOrchestrator                            │
//! │                                                                           │
//! │  ┌─────────────────┐   ┌────────────────┐   ┌─────────────────────────┐   │
//! │  │ ReferenceLister │──►│ ClosureBuilder │──►│ MetadataStamper         │   │
//! │  │ (transitive)    │   │ (ancestors,    │   │ (one atomic commit)     │   │
//! │  └─────────────────┘   │  content, deep)│   └────────────┬────────────┘   │
//! │          ▲             └────────────────┘                │                │
//! │          │                     ▲                         ▼                │
//! │  ┌───────┴─────────────────────┴──────┐      ┌─────────────────────────┐  │
//! │  │ ResourceGraph (session over tree)  │      │ Distributor (ADD/REMOVE)│  │
//! │  └────────────────────────────────────┘      └─────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! 1. **Ordering**: ancestors and referenced nodes precede the nodes that need them
//! 2. **Atomic stamping**: metadata is committed once, before any dispatch
//! 3. **Single shot**: at most one commit and one dispatch per call, no retries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replication_orchestrator::{MemoryTree, NodePath, OrchestratorConfig, ReplicationOrchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tree = MemoryTree::new();
//!     let page = NodePath::parse("/content/site/page").unwrap();
//!     tree.ensure_path(&page, "per:Page");
//!
//!     let config = OrchestratorConfig::for_testing("remote", "publish");
//!     let orchestrator = ReplicationOrchestrator::standalone(config).expect("valid config");
//!
//!     let session = tree.session("admin");
//!     let root = tree.node(&page).unwrap();
//!     let submitted = orchestrator.replicate(&session, &root, true).await.expect("replicated");
//!     println!("submitted {} paths", submitted.len());
//! }
//! ```

pub mod closure;
pub mod config;
pub mod distributor;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod references;
pub mod registry;
pub mod stamp;
pub mod tree;

// Re-exports for convenience
pub use closure::{include_all, ClosureBuilder, InclusionPredicate, ReplicationSet, Walk};
pub use config::{OrchestratorConfig, TrackingConfig};
pub use distributor::{
    DistributionOutcome, DistributionRequest, DistributionState, Distributor, NoOpDistributor, Operation,
};
pub use error::{ReplicationError, Result};
pub use orchestrator::{ReplicationOrchestrator, ReplicationRequest};
pub use references::{DeclaredReferenceLister, ReferenceLister};
pub use registry::ReplicationRegistry;
pub use stamp::{MetadataStamper, StampReport, TrackedNode};
pub use tree::{
    ChangeSet, MemorySession, MemoryTree, Node, NodePath, Principal, PropertyChange, PropertyValue,
    ResourceGraph, StoreError,
};
