//! Test fixtures and helpers.
//!
//! The canonical cluster: every node `nodeN` runs workloads `podP-nodeN`
//! in one namespace. Each workload references its own config map and
//! secret, the shared secret, and a claim bound to its own volume, which
//! in turn consumes its own secret. Each node carries one attachment.
//!
//! ```text
//! node0 -> pod0-node0 -> configmap0-pod0-node0
//!                     -> secret0-pod0-node0
//!                     -> secret0-shared            (shared)
//!                     -> pvc0-pod0-node0 -> pv0-pod0-node0-ns0 -> secret-pv0-pod0-node0-ns0
//!       -> attachment0-node0
//! ```

use warden_core::{AuthzRequest, UserInfo, ValidationError, CORE_GROUP, STORAGE_GROUP};
use warden_updater::{
    AttachmentObject, ClaimObject, ClusterObject, ClusterSnapshot, NodeObject, PodObject,
    SharedObject, VolumeObject, WatchEvent,
};

/// Name of the secret every workload may read.
pub const SHARED_SECRET: &str = "secret0-shared";

/// Name of the config map every workload may read.
pub const SHARED_CONFIG_MAP: &str = "configmap0-shared";

/// A generated cluster of nodes and workloads.
#[derive(Debug, Clone)]
pub struct ClusterFixture {
    pub nodes: usize,
    pub pods_per_node: usize,
    pub namespace: String,
}

impl ClusterFixture {
    /// Create a fixture with `nodes` nodes and `pods_per_node` workloads each.
    pub fn new(nodes: usize, pods_per_node: usize) -> Self {
        Self {
            nodes,
            pods_per_node,
            namespace: "ns0".to_string(),
        }
    }

    /// Two nodes with one workload each.
    pub fn canonical() -> Self {
        Self::new(2, 1)
    }

    pub fn node_name(n: usize) -> String {
        format!("node{}", n)
    }

    pub fn pod_name(n: usize, p: usize) -> String {
        format!("pod{}-node{}", p, n)
    }

    pub fn config_map_name(n: usize, p: usize) -> String {
        format!("configmap0-pod{}-node{}", p, n)
    }

    pub fn secret_name(n: usize, p: usize) -> String {
        format!("secret0-pod{}-node{}", p, n)
    }

    pub fn claim_name(n: usize, p: usize) -> String {
        format!("pvc0-pod{}-node{}", p, n)
    }

    pub fn volume_name(&self, n: usize, p: usize) -> String {
        format!("pv0-pod{}-node{}-{}", p, n, self.namespace)
    }

    pub fn volume_secret_name(&self, n: usize, p: usize) -> String {
        format!("secret-pv0-pod{}-node{}-{}", p, n, self.namespace)
    }

    pub fn attachment_name(n: usize) -> String {
        format!("attachment0-node{}", n)
    }

    fn shared_objects(&self) -> Vec<ClusterObject> {
        vec![
            ClusterObject::Secret(SharedObject::new(&self.namespace, SHARED_SECRET).shared()),
            ClusterObject::ConfigMap(
                SharedObject::new(&self.namespace, SHARED_CONFIG_MAP).shared(),
            ),
        ]
    }

    /// Every object of node `n`, dependencies before dependents.
    fn node_objects(&self, n: usize) -> Vec<ClusterObject> {
        let ns = &self.namespace;
        let mut objects = vec![NodeObject::new(Self::node_name(n)).into()];

        for p in 0..self.pods_per_node {
            objects.push(ClusterObject::Secret(SharedObject::new(ns, Self::secret_name(n, p))));
            objects.push(ClusterObject::Secret(SharedObject::new(
                ns,
                self.volume_secret_name(n, p),
            )));
            objects.push(ClusterObject::ConfigMap(SharedObject::new(
                ns,
                Self::config_map_name(n, p),
            )));
            objects.push(
                VolumeObject::new(self.volume_name(n, p))
                    .with_secret(ns, self.volume_secret_name(n, p))
                    .into(),
            );
            objects.push(
                ClaimObject::new(ns, Self::claim_name(n, p))
                    .bound_to(self.volume_name(n, p))
                    .into(),
            );
        }

        // Linked to the node through the attachment object, not the node's
        // own attachment list.
        objects.push(
            AttachmentObject::new(
                Self::attachment_name(n),
                Self::node_name(n),
                self.volume_name(n, 0),
            )
            .into(),
        );

        for p in 0..self.pods_per_node {
            objects.push(
                PodObject::new(ns, Self::pod_name(n, p))
                    .on_node(Self::node_name(n))
                    .with_config_map(Self::config_map_name(n, p))
                    .with_config_map(SHARED_CONFIG_MAP)
                    .with_secret(Self::secret_name(n, p))
                    .with_secret(SHARED_SECRET)
                    .with_claim(Self::claim_name(n, p))
                    .into(),
            );
        }
        objects
    }

    /// Every object, in an order that never references an unseen object.
    pub fn objects(&self) -> Vec<ClusterObject> {
        let mut objects = self.shared_objects();
        for n in 0..self.nodes {
            objects.extend(self.node_objects(n));
        }
        objects
    }

    pub fn snapshot(&self) -> ClusterSnapshot {
        self.objects().into_iter().collect()
    }

    /// `Added` events for every object, in dependency order.
    pub fn events(&self) -> Vec<WatchEvent> {
        self.objects().into_iter().map(WatchEvent::Added).collect()
    }
}

impl Default for ClusterFixture {
    fn default() -> Self {
        Self::canonical()
    }
}

/// A `get` request for a named object in the core group.
pub fn get_request(
    user: UserInfo,
    resource: &str,
    name: &str,
    namespace: &str,
) -> Result<AuthzRequest, ValidationError> {
    AuthzRequest::builder(user)
        .verb("get")
        .api_group(CORE_GROUP)
        .resource(resource)
        .name(name)
        .namespace(namespace)
        .build()
}

/// A `get` request for a volume attachment.
pub fn get_attachment(user: UserInfo, name: &str) -> Result<AuthzRequest, ValidationError> {
    AuthzRequest::builder(user)
        .verb("get")
        .api_group(STORAGE_GROUP)
        .resource("volumeattachments")
        .name(name)
        .build()
}
