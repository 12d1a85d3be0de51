//! Shared test utilities for integration and failure tests.
//!
//! This module provides:
//! - Mock Distributor for recording dispatches
//! - Content tree fixtures
//! - A graph wrapper that fails commits

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_distributor;

pub use fixtures::*;
pub use mock_distributor::*;

use replication_orchestrator::{Distributor, OrchestratorConfig, ReplicationOrchestrator};
use std::sync::Arc;

/// Orchestrator named `remote` dispatching through agent `publish` to `mock`.
pub fn orchestrator_with(mock: &Arc<MockDistributor>) -> ReplicationOrchestrator {
    orchestrator_with_config(OrchestratorConfig::for_testing("remote", "publish"), mock)
}

pub fn orchestrator_with_config(config: OrchestratorConfig, mock: &Arc<MockDistributor>) -> ReplicationOrchestrator {
    let distributor: Arc<dyn Distributor> = mock.clone();
    ReplicationOrchestrator::new(config, Some(distributor)).expect("valid config")
}
