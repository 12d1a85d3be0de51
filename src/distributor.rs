// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Distribution backend interface.
//!
//! The orchestrator hands every closure to a [`Distributor`]: one call per
//! operation, no implicit retry. The backend answers with a
//! [`DistributionOutcome`] whose acceptance the orchestrator decides with
//! [`DistributionOutcome::is_accepted`].
//!
//! # Example
//!
//! ```rust,no_run
//! use replication_orchestrator::distributor::{
//!     DistributionFuture, DistributionOutcome, DistributionRequest, DistributionState, Distributor,
//! };
//! use replication_orchestrator::tree::Principal;
//!
//! struct QueueBackend;
//!
//! impl Distributor for QueueBackend {
//!     fn distribute(
//!         &self,
//!         _agent: &str,
//!         _principal: &Principal,
//!         request: DistributionRequest,
//!     ) -> DistributionFuture<'_> {
//!         Box::pin(async move {
//!             DistributionOutcome::new(
//!                 true,
//!                 DistributionState::Accepted,
//!                 format!("queued {} paths", request.paths.len()),
//!             )
//!         })
//!     }
//! }
//! ```

use crate::tree::Principal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Distributor::distribute`].
pub type DistributionFuture<'a> = Pin<Box<dyn Future<Output = DistributionOutcome> + Send + 'a>>;

/// Replication operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Create or update the paths remotely (activation).
    Add,
    /// Remove the paths remotely (deactivation).
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => write!(f, "ADD"),
            Operation::Remove => write!(f, "REMOVE"),
        }
    }
}

/// Operation and paths handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRequest {
    pub operation: Operation,
    pub paths: Vec<String>,
}

impl DistributionRequest {
    pub fn new(operation: Operation, paths: Vec<String>) -> Self {
        Self { operation, paths }
    }
}

/// State the backend reports for a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionState {
    /// Queued for distribution.
    Accepted,
    /// Delivered to the remote store.
    Distributed,
    /// Discarded by the backend.
    Dropped,
    /// Never run (unknown agent, agent disabled, ...).
    NotExecuted,
}

impl DistributionState {
    /// States after which the orchestrator considers its job done.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, DistributionState::Accepted | DistributionState::Distributed)
    }
}

impl fmt::Display for DistributionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionState::Accepted => write!(f, "ACCEPTED"),
            DistributionState::Distributed => write!(f, "DISTRIBUTED"),
            DistributionState::Dropped => write!(f, "DROPPED"),
            DistributionState::NotExecuted => write!(f, "NOT_EXECUTED"),
        }
    }
}

/// Backend response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionOutcome {
    pub success: bool,
    pub state: DistributionState,
    /// Raw backend detail, kept for diagnostics.
    pub detail: String,
}

impl DistributionOutcome {
    pub fn new(success: bool, state: DistributionState, detail: impl Into<String>) -> Self {
        Self {
            success,
            state,
            detail: detail.into(),
        }
    }

    /// Accepted only if the backend reports success AND the state is
    /// `ACCEPTED` or `DISTRIBUTED`.
    pub fn is_accepted(&self) -> bool {
        self.success && self.state.is_acceptable()
    }
}

impl fmt::Display for DistributionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={} state={} detail={}",
            self.success, self.state, self.detail
        )
    }
}

/// Channel that transmits node paths to a remote store.
pub trait Distributor: Send + Sync + 'static {
    /// Submit `request` through `agent` on behalf of `principal`.
    ///
    /// Called once per orchestrator operation; never retried by the caller.
    fn distribute(
        &self,
        agent: &str,
        principal: &Principal,
        request: DistributionRequest,
    ) -> DistributionFuture<'_>;
}

/// A distributor that transmits nothing and reports every request as
/// distributed. For standalone mode.
#[derive(Debug, Clone, Default)]
pub struct NoOpDistributor;

impl Distributor for NoOpDistributor {
    fn distribute(
        &self,
        agent: &str,
        principal: &Principal,
        request: DistributionRequest,
    ) -> DistributionFuture<'_> {
        let agent = agent.to_string();
        let principal = principal.clone();
        Box::pin(async move {
            tracing::debug!(
                agent = %agent,
                principal = %principal,
                operation = %request.operation,
                paths = request.paths.len(),
                "NoOp: would distribute"
            );
            DistributionOutcome::new(true, DistributionState::Distributed, "no-op")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_rule() {
        let cases = [
            (true, DistributionState::Accepted, true),
            (true, DistributionState::Distributed, true),
            (true, DistributionState::Dropped, false),
            (true, DistributionState::NotExecuted, false),
            (false, DistributionState::Accepted, false),
            (false, DistributionState::Distributed, false),
        ];
        for (success, state, expected) in cases {
            let outcome = DistributionOutcome::new(success, state, "");
            assert_eq!(outcome.is_accepted(), expected, "{}", outcome);
        }
    }

    /// The legacy check (`state == ACCEPTED || state != DISTRIBUTED`) rejected
    /// DISTRIBUTED and accepted DROPPED. The explicit rule does the opposite.
    #[test]
    fn test_acceptance_rule_departs_from_legacy_expression() {
        let legacy = |state: DistributionState| {
            state == DistributionState::Accepted || state != DistributionState::Distributed
        };
        assert!(!legacy(DistributionState::Distributed));
        assert!(DistributionOutcome::new(true, DistributionState::Distributed, "").is_accepted());

        assert!(legacy(DistributionState::Dropped));
        assert!(!DistributionOutcome::new(true, DistributionState::Dropped, "").is_accepted());
    }

    #[test]
    fn test_state_display_and_serde() {
        assert_eq!(DistributionState::NotExecuted.to_string(), "NOT_EXECUTED");
        let json = serde_json::to_string(&DistributionState::NotExecuted).unwrap();
        assert_eq!(json, "\"NOT_EXECUTED\"");
        assert_eq!(Operation::Remove.to_string(), "REMOVE");
        assert_eq!(serde_json::to_string(&Operation::Add).unwrap(), "\"ADD\"");
    }

    #[tokio::test]
    async fn test_noop_distributor_reports_distributed() {
        let outcome = NoOpDistributor
            .distribute(
                "publish",
                &Principal::new("admin"),
                DistributionRequest::new(Operation::Add, vec!["/a".to_string()]),
            )
            .await;
        assert!(outcome.is_accepted());
        assert_eq!(outcome.state, DistributionState::Distributed);
    }
}
