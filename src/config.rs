//! Configuration for a replication orchestrator instance.
//!
//! Configuration is passed to [`ReplicationOrchestrator::new()`](crate::ReplicationOrchestrator::new)
//! and can be constructed programmatically or deserialized from YAML/JSON.
//! It is validated on construction and on every
//! [`reconfigure()`](crate::ReplicationOrchestrator::reconfigure).
//!
//! # Quick Start
//!
//! ```rust
//! use replication_orchestrator::config::OrchestratorConfig;
//!
//! let config = OrchestratorConfig {
//!     dispatch_timeout: Some("30s".into()),
//!     ..OrchestratorConfig::for_testing("publish", "forward-publish")
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! OrchestratorConfig
//! ├── name: String                  # Service name, selects this instance
//! ├── agent_name: String            # Distribution agent (remote channel)
//! ├── dispatch_timeout: Option<String>  # Bounded wait for the backend ("30s")
//! └── tracking: TrackingConfig
//!     ├── replicated_by_property    # "per:ReplicatedBy"
//!     ├── replication_ref_property  # "per:ReplicationRef"
//!     ├── content_node_name         # "jcr:content"
//!     └── untracked_types           # types that cannot carry tracking props
//! ```
//!
//! # YAML Example
//!
//! ```yaml
//! name: "remote"
//! agent_name: "publish"
//! dispatch_timeout: "1m"
//! tracking:
//!   untracked_types: ["nt:file", "nt:resource"]
//! ```

use crate::error::{ReplicationError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default name of the structural content child.
pub const DEFAULT_CONTENT_NODE_NAME: &str = "jcr:content";

/// Default property recording who replicated a node.
pub const DEFAULT_REPLICATED_BY_PROPERTY: &str = "per:ReplicatedBy";

/// Default property pointing at a node's last replication state.
pub const DEFAULT_REPLICATION_REF_PROPERTY: &str = "per:ReplicationRef";

// ═══════════════════════════════════════════════════════════════════════════════
// OrchestratorConfig
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration of one orchestrator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Service name. Callers pick an instance by this name.
    pub name: String,

    /// Distribution agent to dispatch through.
    pub agent_name: String,

    /// Optional bounded wait for a dispatch, as a duration string ("30s").
    /// Absent means wait for the backend as long as it takes.
    #[serde(default)]
    pub dispatch_timeout: Option<String>,

    /// Replication tracking properties and structure.
    #[serde(default)]
    pub tracking: TrackingConfig,
}

impl OrchestratorConfig {
    /// Create a minimal valid config.
    pub fn for_testing(name: &str, agent_name: &str) -> Self {
        Self {
            name: name.to_string(),
            agent_name: agent_name.to_string(),
            dispatch_timeout: None,
            tracking: TrackingConfig::default(),
        }
    }

    /// Check every required field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ReplicationError::ConfigurationInvalid(
                "replication name cannot be empty".to_string(),
            ));
        }
        if self.agent_name.trim().is_empty() {
            return Err(ReplicationError::ConfigurationInvalid(
                "agent name must be provided".to_string(),
            ));
        }
        if let Some(raw) = &self.dispatch_timeout {
            let timeout = humantime::parse_duration(raw).map_err(|e| {
                ReplicationError::ConfigurationInvalid(format!(
                    "invalid dispatch_timeout '{}': {}",
                    raw, e
                ))
            })?;
            if timeout.is_zero() {
                return Err(ReplicationError::ConfigurationInvalid(
                    "dispatch_timeout must be greater than zero".to_string(),
                ));
            }
        }
        self.tracking.validate()
    }

    /// Parsed dispatch timeout. `None` when unset or unparseable.
    pub fn dispatch_timeout_duration(&self) -> Option<Duration> {
        self.dispatch_timeout
            .as_deref()
            .and_then(|raw| humantime::parse_duration(raw).ok())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TrackingConfig
// ═══════════════════════════════════════════════════════════════════════════════

/// Replication tracking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Property set to the acting principal on every stamped node.
    #[serde(default = "default_replicated_by_property")]
    pub replicated_by_property: String,

    /// Property cleared on deactivation.
    #[serde(default = "default_replication_ref_property")]
    pub replication_ref_property: String,

    /// Name of the structural content child that always travels with its parent.
    #[serde(default = "default_content_node_name")]
    pub content_node_name: String,

    /// Primary types that cannot carry tracking properties.
    #[serde(default = "default_untracked_types")]
    pub untracked_types: Vec<String>,
}

fn default_replicated_by_property() -> String {
    DEFAULT_REPLICATED_BY_PROPERTY.to_string()
}

fn default_replication_ref_property() -> String {
    DEFAULT_REPLICATION_REF_PROPERTY.to_string()
}

fn default_content_node_name() -> String {
    DEFAULT_CONTENT_NODE_NAME.to_string()
}

fn default_untracked_types() -> Vec<String> {
    vec![
        "nt:file".to_string(),
        "nt:resource".to_string(),
        "nt:folder".to_string(),
    ]
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            replicated_by_property: default_replicated_by_property(),
            replication_ref_property: default_replication_ref_property(),
            content_node_name: default_content_node_name(),
            untracked_types: default_untracked_types(),
        }
    }
}

impl TrackingConfig {
    fn validate(&self) -> Result<()> {
        let required = [
            ("replicated_by_property", &self.replicated_by_property),
            ("replication_ref_property", &self.replication_ref_property),
            ("content_node_name", &self.content_node_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ReplicationError::ConfigurationInvalid(format!(
                    "tracking.{} cannot be empty",
                    field
                )));
            }
        }
        if self.content_node_name.contains(crate::tree::DELIMITER) {
            return Err(ReplicationError::ConfigurationInvalid(format!(
                "tracking.content_node_name must be a single segment, got '{}'",
                self.content_node_name
            )));
        }
        Ok(())
    }

    /// True if nodes of `primary_type` can carry tracking properties.
    pub fn supports_type(&self, primary_type: Option<&str>) -> bool {
        match primary_type {
            Some(t) => !self.untracked_types.iter().any(|u| u == t),
            None => true,
        }
    }
}
