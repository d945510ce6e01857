//! Golden authorization scenarios over the canonical cluster.
//!
//! Every scenario is asked by `node0` against
//! [`ClusterFixture::canonical`](crate::fixtures::ClusterFixture::canonical).
//! Any authorizer wired to a graph built from that fixture must reproduce
//! these decisions exactly.

use warden_core::{
    AuthzRequest, Decision, Feature, FeatureGates, UserInfo, ValidationError, STORAGE_GROUP,
};

/// A single golden scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Human-readable name for the scenario.
    pub name: &'static str,
    pub resource: &'static str,
    pub api_group: &'static str,
    pub object: &'static str,
    pub namespace: &'static str,
    /// State of the attachment feature gate while asking.
    pub attachment_gate: bool,
    pub expected: Decision,
}

impl Scenario {
    const fn core(
        name: &'static str,
        resource: &'static str,
        object: &'static str,
        namespace: &'static str,
        expected: Decision,
    ) -> Self {
        Self {
            name,
            resource,
            api_group: "",
            object,
            namespace,
            attachment_gate: false,
            expected,
        }
    }

    const fn attachment(
        name: &'static str,
        object: &'static str,
        attachment_gate: bool,
        expected: Decision,
    ) -> Self {
        Self {
            name,
            resource: "volumeattachments",
            api_group: STORAGE_GROUP,
            object,
            namespace: "",
            attachment_gate,
            expected,
        }
    }

    /// The request node0 sends for this scenario.
    pub fn request(&self) -> Result<AuthzRequest, ValidationError> {
        AuthzRequest::builder(UserInfo::node("node0"))
            .verb("get")
            .api_group(self.api_group)
            .resource(self.resource)
            .name(self.object)
            .namespace(self.namespace)
            .build()
    }
}

/// Get all golden scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    use Decision::{Allow, NoOpinion};

    vec![
        Scenario::core("allowed configmap", "configmaps", "configmap0-pod0-node0", "ns0", Allow),
        Scenario::core("allowed secret via pod", "secrets", "secret0-pod0-node0", "ns0", Allow),
        Scenario::core("allowed shared secret", "secrets", "secret0-shared", "ns0", Allow),
        Scenario::core(
            "allowed secret via pvc",
            "secrets",
            "secret-pv0-pod0-node0-ns0",
            "ns0",
            Allow,
        ),
        Scenario::core("allowed pvc", "persistentvolumeclaims", "pvc0-pod0-node0", "ns0", Allow),
        Scenario::core("allowed pv", "persistentvolumes", "pv0-pod0-node0-ns0", "", Allow),
        Scenario::core(
            "disallowed configmap",
            "configmaps",
            "configmap0-pod0-node1",
            "ns0",
            NoOpinion,
        ),
        Scenario::core(
            "disallowed secret via pod",
            "secrets",
            "secret0-pod0-node1",
            "ns0",
            NoOpinion,
        ),
        Scenario::core(
            "disallowed secret via pvc",
            "secrets",
            "secret-pv0-pod0-node1-ns0",
            "ns0",
            NoOpinion,
        ),
        Scenario::core(
            "disallowed pvc",
            "persistentvolumeclaims",
            "pvc0-pod0-node1",
            "ns0",
            NoOpinion,
        ),
        Scenario::core("disallowed pv", "persistentvolumes", "pv0-pod0-node1-ns0", "", NoOpinion),
        Scenario::core(
            "disallowed secret in another namespace",
            "secrets",
            "secret0-pod0-node0",
            "ns1",
            NoOpinion,
        ),
        Scenario::attachment(
            "disallowed attachment - no relationship",
            "attachment0-node1",
            true,
            NoOpinion,
        ),
        Scenario::attachment(
            "disallowed attachment - feature disabled",
            "attachment0-node0",
            false,
            NoOpinion,
        ),
        Scenario::attachment(
            "allowed attachment - feature enabled",
            "attachment0-node0",
            true,
            Allow,
        ),
    ]
}

/// Outcome of one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub expected: Decision,
    /// `None` if the request could not be built.
    pub actual: Option<Decision>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.actual == Some(self.expected)
    }
}

/// Run every scenario through `authorize`, setting the attachment gate on
/// `gates` before each one.
///
/// The gate is left disabled afterwards.
pub fn verify_all_scenarios(
    gates: &FeatureGates,
    mut authorize: impl FnMut(&AuthzRequest) -> Decision,
) -> Vec<ScenarioResult> {
    let results = all_scenarios()
        .into_iter()
        .map(|s| {
            gates.set(Feature::VolumeAttachmentAccess, s.attachment_gate);
            ScenarioResult {
                name: s.name,
                expected: s.expected,
                actual: s.request().ok().map(|req| authorize(&req)),
            }
        })
        .collect();
    gates.set(Feature::VolumeAttachmentAccess, false);
    results
}
