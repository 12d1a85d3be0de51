// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication orchestrator.
//!
//! The component callers talk to. It ties together:
//! - Reference listing via [`crate::references::ReferenceLister`]
//! - Closure computation via [`crate::closure::ClosureBuilder`]
//! - Metadata stamping via [`crate::stamp::MetadataStamper`]
//! - Dispatch via [`crate::distributor::Distributor`]
//!
//! # Call Flow
//!
//! Every entry point ends in the same sequence:
//! 1. Fail fast if no distributor is bound
//! 2. Return an empty set untouched (no commit, no dispatch)
//! 3. Stamp every node and commit once; a failed commit stops here
//! 4. Dispatch once, optionally bounded by `dispatch_timeout`
//! 5. Accept only `success && state ∈ {ACCEPTED, DISTRIBUTED}`
//!
//! Nothing is retried here. A retried call re-stamps (overwriting) and
//! re-dispatches the whole set.

mod types;

pub use types::ReplicationRequest;

use crate::closure::{ClosureBuilder, ReplicationSet};
use crate::config::OrchestratorConfig;
use crate::distributor::{Distributor, NoOpDistributor, Operation};
use crate::error::{ReplicationError, Result};
use crate::metrics;
use crate::references::{DeclaredReferenceLister, ReferenceLister};
use crate::stamp::MetadataStamper;
use crate::tree::{Node, ResourceGraph};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Computes, stamps and dispatches replication closures.
///
/// Safe to share across tasks: the only state is the active configuration
/// (behind a watch channel) and the bound collaborators. Each call works on
/// its own request and its own commit.
pub struct ReplicationOrchestrator {
    /// Active configuration (broadcast to watchers)
    config_tx: watch::Sender<Arc<OrchestratorConfig>>,

    /// Distribution backend. `None` makes every call fail fast.
    distributor: Option<Arc<dyn Distributor>>,

    /// Custom closure builder. Derived from the active config when unset.
    closure_builder: Option<ClosureBuilder>,

    /// Custom reference lister. Derived from the active config when unset.
    reference_lister: Option<Arc<dyn ReferenceLister>>,
}

impl std::fmt::Debug for ReplicationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationOrchestrator")
            .field("config", &self.config())
            .field("has_distributor", &self.has_distributor())
            .field("closure_builder", &self.closure_builder)
            .finish_non_exhaustive()
    }
}

impl ReplicationOrchestrator {
    /// Create an orchestrator bound to `distributor`.
    ///
    /// Fails with [`ReplicationError::ConfigurationInvalid`] if `config` does
    /// not validate; such an instance never exists.
    pub fn new(config: OrchestratorConfig, distributor: Option<Arc<dyn Distributor>>) -> Result<Self> {
        config.validate()?;
        let (config_tx, _) = watch::channel(Arc::new(config));

        let orchestrator = Self {
            config_tx,
            distributor,
            closure_builder: None,
            reference_lister: None,
        };
        info!(
            service = %orchestrator.name(),
            agent = %orchestrator.agent_name(),
            has_distributor = orchestrator.has_distributor(),
            "Replication orchestrator created"
        );
        Ok(orchestrator)
    }

    /// Create an orchestrator that dispatches to a [`NoOpDistributor`]
    /// (for testing/standalone).
    pub fn standalone(config: OrchestratorConfig) -> Result<Self> {
        Self::new(config, Some(Arc::new(NoOpDistributor)))
    }

    /// Use `builder` instead of one derived from the configuration.
    ///
    /// This is the hook for an inclusion predicate. The builder keeps its own
    /// content node name across reconfiguration.
    pub fn with_closure_builder(mut self, builder: ClosureBuilder) -> Self {
        self.closure_builder = Some(builder);
        self
    }

    /// Use `lister` instead of a [`DeclaredReferenceLister`].
    pub fn with_reference_lister(mut self, lister: Arc<dyn ReferenceLister>) -> Self {
        self.reference_lister = Some(lister);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Configuration
    // ═══════════════════════════════════════════════════════════════════════════

    /// Service name. Callers pick an instance by it.
    pub fn name(&self) -> String {
        self.config_tx.borrow().name.clone()
    }

    /// Distribution agent every request goes through.
    pub fn agent_name(&self) -> String {
        self.config_tx.borrow().agent_name.clone()
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> Arc<OrchestratorConfig> {
        self.config_tx.borrow().clone()
    }

    /// Watch configuration changes.
    pub fn config_receiver(&self) -> watch::Receiver<Arc<OrchestratorConfig>> {
        self.config_tx.subscribe()
    }

    /// Replace the active configuration.
    ///
    /// An invalid config is rejected and the previous one stays active. Calls
    /// already running keep the snapshot they started with.
    pub fn reconfigure(&self, config: OrchestratorConfig) -> Result<()> {
        if let Err(e) = config.validate() {
            warn!(service = %self.name(), error = %e, "Rejected reconfiguration");
            return Err(e);
        }
        info!(
            service = %config.name,
            agent = %config.agent_name,
            "Replication orchestrator reconfigured"
        );
        self.config_tx.send_replace(Arc::new(config));
        Ok(())
    }

    pub fn has_distributor(&self) -> bool {
        self.distributor.is_some()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Closures (dry run)
    // ═══════════════════════════════════════════════════════════════════════════

    /// The set [`replicate()`](Self::replicate) would submit, without side effects.
    pub fn closure_for_replicate(&self, graph: &dyn ResourceGraph, root: &Node, deep: bool) -> ReplicationSet {
        let config = self.config();
        let references = self.reference_lister(&config).reference_list(graph, root, true);
        debug!(root = %root.path, references = references.len(), "Listed references");
        self.closure_builder(&config)
            .activation_closure(graph, root, &references, deep)
    }

    /// The set [`deactivate()`](Self::deactivate) would submit, without side effects.
    pub fn closure_for_deactivate(&self, graph: &dyn ResourceGraph, root: &Node) -> ReplicationSet {
        let config = self.config();
        self.closure_builder(&config).deactivation_closure(graph, root)
    }

    fn closure_builder(&self, config: &OrchestratorConfig) -> ClosureBuilder {
        match &self.closure_builder {
            Some(builder) => builder.clone(),
            None => ClosureBuilder::new(config.tracking.content_node_name.clone()),
        }
    }

    fn reference_lister(&self, config: &OrchestratorConfig) -> Arc<dyn ReferenceLister> {
        match &self.reference_lister {
            Some(lister) => Arc::clone(lister),
            None => Arc::new(DeclaredReferenceLister::new(
                config.tracking.content_node_name.clone(),
            )),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Entry points
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replicate `root` with everything it references and everything
    /// structurally required, as an ADD. With `deep`, also all descendants.
    ///
    /// Returns the set exactly as submitted.
    #[instrument(skip_all, fields(service = %self.name(), root = %root.path, deep = deep))]
    pub async fn replicate(&self, graph: &dyn ResourceGraph, root: &Node, deep: bool) -> Result<ReplicationSet> {
        let set = self.closure_for_replicate(graph, root, deep);
        metrics::record_closure_size(&Operation::Add.to_string(), set.len());
        self.submit(graph, set, Operation::Add).await
    }

    /// Deactivate `root` and all its descendants, as a REMOVE.
    #[instrument(skip_all, fields(service = %self.name(), root = %root.path))]
    pub async fn deactivate(&self, graph: &dyn ResourceGraph, root: &Node) -> Result<ReplicationSet> {
        let set = self.closure_for_deactivate(graph, root);
        metrics::record_closure_size(&Operation::Remove.to_string(), set.len());
        self.submit(graph, set, Operation::Remove).await
    }

    /// Replicate a caller-computed set as-is.
    ///
    /// Every path must resolve; otherwise the call fails with
    /// [`ReplicationError::MissingNode`] before anything is committed.
    #[instrument(skip_all, fields(service = %self.name(), size = set.len()))]
    pub async fn replicate_set(&self, graph: &dyn ResourceGraph, set: ReplicationSet) -> Result<ReplicationSet> {
        self.submit(graph, set, Operation::Add).await
    }

    /// Deactivate a caller-computed set as-is.
    #[instrument(skip_all, fields(service = %self.name(), size = set.len()))]
    pub async fn deactivate_set(&self, graph: &dyn ResourceGraph, set: ReplicationSet) -> Result<ReplicationSet> {
        self.submit(graph, set, Operation::Remove).await
    }

    async fn submit(
        &self,
        graph: &dyn ResourceGraph,
        set: ReplicationSet,
        operation: Operation,
    ) -> Result<ReplicationSet> {
        let config = self.config();
        let result = self.stamp_and_dispatch(&config, graph, set, operation).await;
        if let Err(e) = &result {
            metrics::record_error(&config.name, e.kind());
        }
        result
    }

    async fn stamp_and_dispatch(
        &self,
        config: &OrchestratorConfig,
        graph: &dyn ResourceGraph,
        set: ReplicationSet,
        operation: Operation,
    ) -> Result<ReplicationSet> {
        let Some(distributor) = self.distributor.as_ref() else {
            warn!(service = %config.name, "No distributor bound, refusing to replicate");
            return Err(ReplicationError::NoDistributorConfigured {
                service: config.name.clone(),
            });
        };

        if set.is_empty() {
            debug!(operation = %operation, "Empty set, nothing to replicate");
            return Ok(set);
        }

        let request = ReplicationRequest::new(
            config.agent_name.clone(),
            operation,
            set,
            graph.principal().clone(),
        );

        // Metadata must be durable before anything leaves this process
        let stamper = MetadataStamper::new(config.tracking.clone());
        match stamper.stamp(graph, request.set(), operation).await {
            Ok(report) => {
                metrics::record_commit(&config.name, true);
                metrics::record_stamped_nodes(&config.name, report.stamped);
            }
            Err(e) => {
                if matches!(e, ReplicationError::PersistenceFailure { .. }) {
                    metrics::record_commit(&config.name, false);
                }
                warn!(error = %e, operation = %operation, "Stamping failed, not dispatching");
                return Err(e);
            }
        }

        let start = Instant::now();
        let dispatch = distributor.distribute(
            request.agent(),
            request.principal(),
            request.to_distribution_request(),
        );
        let outcome = match config.dispatch_timeout_duration() {
            Some(timeout) => tokio::time::timeout(timeout, dispatch).await.map_err(|_| {
                warn!(agent = %request.agent(), ?timeout, "Dispatch timed out");
                ReplicationError::DistributionTimeout {
                    agent: request.agent().to_string(),
                    timeout,
                }
            })?,
            None => dispatch.await,
        };
        let accepted = outcome.is_accepted();
        metrics::record_dispatch(
            &config.name,
            request.agent(),
            &outcome.state.to_string(),
            accepted,
            start.elapsed(),
        );

        if !accepted {
            warn!(
                agent = %request.agent(),
                operation = %operation,
                outcome = %outcome,
                "Distribution not accepted"
            );
            return Err(ReplicationError::DistributionRejected {
                state: outcome.state,
                detail: outcome.detail,
            });
        }

        info!(
            agent = %request.agent(),
            operation = %operation,
            principal = %request.principal(),
            paths = request.set().len(),
            state = %outcome.state,
            "Replication submitted"
        );
        Ok(request.into_set())
    }
}
