//! Mock Distributor for testing.
//!
//! Records every distribute() call for assertions. The outcome it answers
//! with is configurable, and an optional delay simulates a slow backend.

use replication_orchestrator::distributor::{
    DistributionFuture, DistributionOutcome, DistributionRequest, DistributionState, Distributor, Operation,
};
use replication_orchestrator::tree::Principal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// A recorded distribute() call.
#[derive(Debug, Clone)]
pub struct DistributeCall {
    pub agent: String,
    pub principal: Principal,
    pub request: DistributionRequest,
}

impl DistributeCall {
    pub fn operation(&self) -> Operation {
        self.request.operation
    }

    pub fn paths(&self) -> &[String] {
        &self.request.paths
    }
}

/// Mock implementation of Distributor that records all calls.
///
/// # Example
/// ```rust,ignore
/// let mock = Arc::new(MockDistributor::new());
/// mock.set_outcome(DistributionOutcome::new(false, DistributionState::Dropped, "full")).await;
///
/// // Use in tests...
///
/// let calls = mock.calls().await;
/// assert_eq!(calls.len(), 1);
/// ```
pub struct MockDistributor {
    /// Recorded distribute() calls
    calls: RwLock<Vec<DistributeCall>>,
    /// Outcome returned to every call
    outcome: RwLock<DistributionOutcome>,
    /// Time to wait before answering
    delay: RwLock<Option<Duration>>,
    /// Counter for distribute calls (bumped before the delay)
    call_count: AtomicUsize,
}

impl Default for MockDistributor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDistributor {
    /// Create a mock that accepts everything.
    pub fn new() -> Self {
        Self::with_outcome(DistributionOutcome::new(true, DistributionState::Accepted, "queued"))
    }

    pub fn with_outcome(outcome: DistributionOutcome) -> Self {
        Self {
            calls: RwLock::new(Vec::new()),
            outcome: RwLock::new(outcome),
            delay: RwLock::new(None),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that takes `delay` to answer.
    pub fn slow(delay: Duration) -> Self {
        let mut mock = Self::new();
        mock.delay = RwLock::new(Some(delay));
        mock
    }

    pub async fn set_outcome(&self, outcome: DistributionOutcome) {
        *self.outcome.write().await = outcome;
    }

    pub async fn calls(&self) -> Vec<DistributeCall> {
        self.calls.read().await.clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn clear(&self) {
        self.calls.write().await.clear();
        self.call_count.store(0, Ordering::SeqCst);
    }
}

impl Distributor for MockDistributor {
    fn distribute(&self, agent: &str, principal: &Principal, request: DistributionRequest) -> DistributionFuture<'_> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let call = DistributeCall {
            agent: agent.to_string(),
            principal: principal.clone(),
            request,
        };
        Box::pin(async move {
            self.calls.write().await.push(call);
            let delay = *self.delay.read().await;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.read().await.clone()
        })
    }
}
