//! Warden: the assembled node authorizer.
//!
//! Wires one graph store, one policy engine and one set of feature gates
//! into an authorizer and a graph updater that share them. Constructed
//! once at startup and passed to whoever needs it; there is no global.

use std::sync::Arc;

use tokio::sync::watch;

use warden_core::{AuthzRequest, FeatureGates, Verdict};
use warden_graph::GraphStore;
use warden_policy::PolicyEngine;
use warden_updater::{EventSource, GraphUpdater, SnapshotSource};

use crate::authorizer::Authorizer;
use crate::chain::{Authority, AuthorizerChain};
use crate::config::WardenConfig;
use crate::error::Result;

/// The main Warden struct.
///
/// Provides a unified API for:
/// - Authorizing requests against the graph and the policy
/// - Running the graph updater
/// - Reloading the policy and toggling feature gates at runtime
pub struct Warden {
    graph: Arc<GraphStore>,
    policy: Arc<PolicyEngine>,
    gates: Arc<FeatureGates>,
    authorizer: Arc<Authorizer<GraphStore>>,
    updater: Arc<GraphUpdater<GraphStore>>,
    config: WardenConfig,
}

impl Warden {
    /// Assemble a new instance.
    ///
    /// Fails if the feature gate setting or the rule source is unusable;
    /// the caller must not start serving in that case.
    pub fn new(config: WardenConfig, policy_source: &str) -> Result<Self> {
        let gates = Arc::new(FeatureGates::parse(&config.feature_gates)?);
        let policy = Arc::new(PolicyEngine::load(policy_source)?);
        let graph = Arc::new(GraphStore::new());

        let authorizer = Arc::new(Authorizer::new(
            Arc::clone(&graph),
            Arc::clone(&policy),
            Arc::clone(&gates),
            config.authorizer.clone(),
        ));
        let updater = Arc::new(GraphUpdater::new(Arc::clone(&graph), config.updater.clone()));

        tracing::info!("Warden ready ({:?})", gates);

        Ok(Self {
            graph,
            policy,
            gates,
            authorizer,
            updater,
            config,
        })
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    pub fn policy(&self) -> &Arc<PolicyEngine> {
        &self.policy
    }

    pub fn gates(&self) -> &Arc<FeatureGates> {
        &self.gates
    }

    pub fn authorizer(&self) -> &Arc<Authorizer<GraphStore>> {
        &self.authorizer
    }

    pub fn updater(&self) -> &Arc<GraphUpdater<GraphStore>> {
        &self.updater
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// Decide a request with the local authorizer only.
    pub fn authorize(&self, request: &AuthzRequest) -> Result<Verdict> {
        self.authorizer.authorize(request)
    }

    /// A chain with the local authorizer first, followed by `delegates`.
    pub fn chain(&self, delegates: Vec<Arc<dyn Authority>>) -> AuthorizerChain {
        let local: Arc<dyn Authority> = Arc::clone(&self.authorizer) as Arc<dyn Authority>;
        delegates.into_iter().fold(
            AuthorizerChain::new(self.config.chain.clone()).with(local),
            AuthorizerChain::with,
        )
    }

    /// Replace the policy rules. On error the current rules stay active.
    pub fn reload_policy(&self, source: &str) -> Result<()> {
        Ok(self.policy.reload(source)?)
    }

    /// Run the graph updater until shutdown or until `events` closes.
    pub async fn run_updater<E, S>(
        &self,
        events: &E,
        snapshots: &S,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()>
    where
        E: EventSource + ?Sized,
        S: SnapshotSource + ?Sized,
    {
        Ok(self.updater.run(events, snapshots, shutdown).await?)
    }
}
