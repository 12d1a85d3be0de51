// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the replication orchestrator.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `ConfigurationInvalid` | No | Config rejected; the instance never activates |
//! | `NoDistributorConfigured` | No | No backend bound (operator action needed) |
//! | `MissingNode` | No | A caller-supplied set names a node that is gone |
//! | `PersistenceFailure` | Yes | Stamping commit failed; nothing was dispatched |
//! | `DistributionRejected` | Yes | Backend refused or did not accept the request |
//! | `DistributionTimeout` | Yes | Backend did not answer within the configured wait |
//!
//! # Retry Behavior
//!
//! The orchestrator never retries. A caller retrying a failed call re-stamps
//! and re-dispatches the whole set; that is safe because stamping overwrites
//! properties rather than incrementing anything.

use crate::distributor::DistributionState;
use crate::tree::{NodePath, StoreError};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors that can occur during replication.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// Configuration is invalid.
    ///
    /// Raised at construction and on reconfiguration.
    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(String),

    /// No distribution backend is bound to the orchestrator.
    #[error("No distributor available for '{service}': configure distribution first")]
    NoDistributorConfigured { service: String },

    /// A path in a caller-supplied set does not resolve.
    #[error("Node not found: {path}")]
    MissingNode { path: NodePath },

    /// Committing replication metadata failed. No dispatch was attempted.
    #[error("Persistence failure: {message}")]
    PersistenceFailure {
        message: String,
        #[source]
        source: StoreError,
    },

    /// The backend reported failure or a state the orchestrator does not accept.
    #[error("Distribution failed ({state}): {detail}")]
    DistributionRejected {
        state: DistributionState,
        detail: String,
    },

    /// The backend did not answer in time.
    #[error("Distribution via agent '{agent}' timed out after {timeout:?}")]
    DistributionTimeout { agent: String, timeout: Duration },
}

impl ReplicationError {
    /// Wrap a storage error raised while committing stamped metadata.
    pub fn persistence(source: StoreError) -> Self {
        Self::PersistenceFailure {
            message: "could not set replication metadata before distribution".to_string(),
            source,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConfigurationInvalid(_) => false,
            Self::NoDistributorConfigured { .. } => false,
            Self::MissingNode { .. } => false,
            Self::PersistenceFailure { .. } => true, // Commit conflicts are transient
            Self::DistributionRejected { .. } => true,
            Self::DistributionTimeout { .. } => true,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationInvalid(_) => "configuration_invalid",
            Self::NoDistributorConfigured { .. } => "no_distributor",
            Self::MissingNode { .. } => "missing_node",
            Self::PersistenceFailure { .. } => "persistence_failure",
            Self::DistributionRejected { .. } => "distribution_rejected",
            Self::DistributionTimeout { .. } => "distribution_timeout",
        }
    }
}
