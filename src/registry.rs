// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Registry of configured orchestrator instances.
//!
//! Several orchestrators can run side by side, one per remote channel. Callers
//! pick one by its service name.

use crate::metrics;
use crate::orchestrator::ReplicationOrchestrator;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrators keyed by service name.
#[derive(Debug, Default)]
pub struct ReplicationRegistry {
    services: DashMap<String, Arc<ReplicationOrchestrator>>,
}

impl ReplicationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `orchestrator` under its current name.
    ///
    /// Replaces a same-named instance and returns it.
    pub fn register(&self, orchestrator: Arc<ReplicationOrchestrator>) -> Option<Arc<ReplicationOrchestrator>> {
        let name = orchestrator.name();
        let previous = self.services.insert(name.clone(), orchestrator);
        info!(service = %name, replaced = previous.is_some(), "Registered replication service");
        metrics::set_registered_services(self.services.len());
        previous
    }

    /// Get an orchestrator by service name.
    pub fn get(&self, name: &str) -> Option<Arc<ReplicationOrchestrator>> {
        self.services.get(name).map(|r| r.value().clone())
    }

    /// Remove an orchestrator.
    pub fn remove(&self, name: &str) -> Option<Arc<ReplicationOrchestrator>> {
        let removed = self.services.remove(name).map(|(_, orchestrator)| orchestrator);
        if removed.is_some() {
            debug!(service = %name, "Removed replication service");
            metrics::set_registered_services(self.services.len());
        }
        removed
    }

    /// Registered service names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
