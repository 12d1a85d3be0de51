// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication metadata stamping.
//!
//! Before a closure is dispatched every node in it that can carry tracking
//! properties is stamped with the acting principal, and on deactivation its
//! replication reference is cleared. All changes go into one [`ChangeSet`]
//! committed atomically; a failed commit fails the whole operation before
//! anything is dispatched.

use crate::closure::ReplicationSet;
use crate::config::TrackingConfig;
use crate::distributor::Operation;
use crate::error::{ReplicationError, Result};
use crate::tree::{ChangeSet, Node, NodePath, Principal, PropertyValue, ResourceGraph};
use tracing::{debug, trace};

/// A node that supports replication tracking properties.
#[derive(Debug)]
pub struct TrackedNode<'a> {
    path: &'a NodePath,
    tracking: &'a TrackingConfig,
}

impl<'a> TrackedNode<'a> {
    /// Capability query: `Some` if `node` can carry tracking properties.
    pub fn of(node: &'a Node, tracking: &'a TrackingConfig) -> Option<Self> {
        tracking
            .supports_type(node.primary_type())
            .then_some(Self {
                path: &node.path,
                tracking,
            })
    }

    pub fn set_replicated_by(&self, principal: &Principal, changes: &mut ChangeSet) {
        changes.set(
            self.path,
            &self.tracking.replicated_by_property,
            PropertyValue::String(principal.id().to_string()),
        );
    }

    pub fn clear_replication_ref(&self, changes: &mut ChangeSet) {
        changes.remove(self.path, &self.tracking.replication_ref_property);
    }
}

/// Summary of one stamping pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StampReport {
    /// Nodes that received tracking properties.
    pub stamped: usize,
    /// Nodes passed through untouched.
    pub untracked: usize,
}

/// Stamps and commits replication metadata.
#[derive(Debug, Clone, Default)]
pub struct MetadataStamper {
    tracking: TrackingConfig,
}

impl MetadataStamper {
    pub fn new(tracking: TrackingConfig) -> Self {
        Self { tracking }
    }

    /// Build the change set for `set` without committing.
    ///
    /// Fails with [`ReplicationError::MissingNode`] if a path does not resolve.
    pub fn prepare(
        &self,
        graph: &dyn ResourceGraph,
        set: &ReplicationSet,
        operation: Operation,
    ) -> Result<(ChangeSet, StampReport)> {
        let principal = graph.principal();
        let mut changes = ChangeSet::new();
        let mut report = StampReport::default();

        for path in set {
            let node = graph
                .get(path)
                .ok_or_else(|| ReplicationError::MissingNode { path: path.clone() })?;
            match TrackedNode::of(&node, &self.tracking) {
                Some(tracked) => {
                    trace!(path = %path, principal = %principal, "Stamping replicated-by");
                    tracked.set_replicated_by(principal, &mut changes);
                    if operation == Operation::Remove {
                        tracked.clear_replication_ref(&mut changes);
                    }
                    report.stamped += 1;
                }
                None => report.untracked += 1,
            }
        }
        Ok((changes, report))
    }

    /// Stamp every node of `set` and commit in one transaction.
    pub async fn stamp(
        &self,
        graph: &dyn ResourceGraph,
        set: &ReplicationSet,
        operation: Operation,
    ) -> Result<StampReport> {
        let (changes, report) = self.prepare(graph, set, operation)?;
        graph
            .commit(changes)
            .await
            .map_err(ReplicationError::persistence)?;
        debug!(
            stamped = report.stamped,
            untracked = report.untracked,
            operation = %operation,
            "Committed replication metadata"
        );
        Ok(report)
    }
}
