//! Request types for one orchestrator call.
//!
//! A [`ReplicationRequest`] is built once per call, after closure
//! computation and before stamping, and is never modified afterwards.
//!
//! ```text
//! replicate()/deactivate()
//!        │ closure
//!        ↓
//! ReplicationRequest { agent, operation, set, principal }
//!        │ stamp + commit
//!        ↓
//! DistributionRequest { operation, paths } ──→ Distributor
//! ```

use crate::closure::ReplicationSet;
use crate::distributor::{DistributionRequest, Operation};
use crate::tree::Principal;

/// Everything a dispatch needs, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationRequest {
    agent: String,
    operation: Operation,
    set: ReplicationSet,
    principal: Principal,
}

impl ReplicationRequest {
    pub fn new(
        agent: impl Into<String>,
        operation: Operation,
        set: ReplicationSet,
        principal: Principal,
    ) -> Self {
        Self {
            agent: agent.into(),
            operation,
            set,
            principal,
        }
    }

    /// Distribution agent the request goes through.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn set(&self) -> &ReplicationSet {
        &self.set
    }

    /// Identity the request is made on behalf of.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Wire-level request for the backend, paths in set order.
    pub fn to_distribution_request(&self) -> DistributionRequest {
        DistributionRequest::new(self.operation, self.set.to_strings())
    }

    /// Give back the set once the call has succeeded.
    pub fn into_set(self) -> ReplicationSet {
        self.set
    }
}
