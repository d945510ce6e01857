//! The authorizer: the composition point between identity, graph and
//! policy.
//!
//! ```text
//! non-resource request                 -> NoOpinion
//! caller is not a node identity        -> policy engine
//! node identity, kind not in the graph -> policy engine
//! node identity, graph kind:
//!     verb other than get, or no name  -> NoOpinion
//!     malformed name or namespace      -> NoOpinion
//!     attachment with the gate off     -> NoOpinion
//!     reachable                        -> Allow
//!     not reachable                    -> NoOpinion
//! ```
//!
//! The graph path never denies. Deny only comes from an explicit policy
//! rule or from another authority in the chain.

use std::sync::Arc;

use async_trait::async_trait;

use warden_core::{
    validate_request, AuthzRequest, Feature, FeatureGates, GraphResource, ResourceAttributes,
    Verdict,
};
use warden_graph::{GraphStore, Reachability};
use warden_policy::PolicyEngine;

use crate::chain::Authority;
use crate::config::AuthorizerConfig;
use crate::error::Result;

/// The only verb the graph answers for.
const GRAPH_VERB: &str = "get";

/// Node-aware authorizer over a relationship graph and a policy engine.
///
/// Holds shared references only; `authorize` is a pure read and may be
/// called from any number of threads at once.
pub struct Authorizer<G: Reachability = GraphStore> {
    graph: Arc<G>,
    policy: Arc<PolicyEngine>,
    gates: Arc<FeatureGates>,
    config: AuthorizerConfig,
}

impl<G: Reachability> Authorizer<G> {
    pub fn new(
        graph: Arc<G>,
        policy: Arc<PolicyEngine>,
        gates: Arc<FeatureGates>,
        config: AuthorizerConfig,
    ) -> Self {
        Self {
            graph,
            policy,
            gates,
            config,
        }
    }

    pub fn graph(&self) -> &Arc<G> {
        &self.graph
    }

    pub fn policy(&self) -> &Arc<PolicyEngine> {
        &self.policy
    }

    pub fn gates(&self) -> &Arc<FeatureGates> {
        &self.gates
    }

    /// Decide a request.
    ///
    /// Fails only if the request is structurally invalid.
    pub fn authorize(&self, request: &AuthzRequest) -> Result<Verdict> {
        validate_request(request)?;
        let user = request.user();

        let verdict = match request.resource() {
            None => Verdict::no_opinion("non-resource requests are not handled here"),
            Some(attrs) => match self.config.node_identity.node_name(user) {
                None => self.policy.evaluate(user, attrs),
                Some(node) => match GraphResource::classify(&attrs.api_group, &attrs.resource) {
                    None => self.policy.evaluate(user, attrs),
                    Some(kind) => self.authorize_node(node, kind, attrs),
                },
            },
        };

        tracing::debug!(
            "{} for {}: {} ({})",
            describe(request),
            user.name,
            verdict.decision,
            verdict.reason
        );
        Ok(verdict)
    }

    fn authorize_node(&self, node: &str, kind: GraphResource, attrs: &ResourceAttributes) -> Verdict {
        if attrs.verb != GRAPH_VERB {
            return Verdict::no_opinion(format!(
                "node {} may only {} individual {}",
                node, GRAPH_VERB, kind
            ));
        }
        if attrs.name.is_empty() {
            return Verdict::no_opinion(format!("node {} must name the {} it reads", node, kind));
        }
        if attrs.name.contains('/') || attrs.namespace.contains('/') {
            return Verdict::no_opinion(format!("malformed {} key requested by node {}", kind, node));
        }
        if kind == GraphResource::Attachment
            && !self.gates.enabled(Feature::VolumeAttachmentAccess)
        {
            return Verdict::no_opinion(format!(
                "{} is disabled",
                Feature::VolumeAttachmentAccess
            ));
        }

        let target = kind.vertex(&attrs.namespace, &attrs.name);
        match self.graph.find_path(node, &target) {
            Some(reach) => Verdict::allow(format!("node {} reaches {}: {}", node, target, reach)),
            None => Verdict::no_opinion(format!(
                "no relationship found between node {} and {}",
                node, target
            )),
        }
    }
}

#[async_trait]
impl<G: Reachability + 'static> Authority for Authorizer<G> {
    fn name(&self) -> &str {
        "node"
    }

    async fn authorize(&self, request: &AuthzRequest) -> Result<Verdict> {
        Authorizer::<G>::authorize(self, request)
    }
}

fn describe(request: &AuthzRequest) -> String {
    match request.resource() {
        Some(a) if a.namespace.is_empty() => format!("{} {}/{}", a.verb, a.resource, a.name),
        Some(a) => format!("{} {}/{}/{}", a.verb, a.resource, a.namespace, a.name),
        None => "non-resource request".to_string(),
    }
}
