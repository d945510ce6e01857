//! Caller identity and node-identity classification.

use serde::{Deserialize, Serialize};

/// User name prefix carried by node credentials.
pub const NODE_USER_PREFIX: &str = "system:node:";

/// Group every node credential belongs to.
pub const NODES_GROUP: &str = "system:nodes";

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// A node credential for `node_name` with the default identity shape.
    pub fn node(node_name: &str) -> Self {
        Self::new(format!("{NODE_USER_PREFIX}{node_name}")).with_group(NODES_GROUP)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// The shape a caller must have to be treated as a node identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentityShape {
    /// Required prefix of the user name; the remainder is the node name.
    pub user_prefix: String,
    /// Group the caller must belong to.
    pub group: String,
}

impl Default for NodeIdentityShape {
    fn default() -> Self {
        Self {
            user_prefix: NODE_USER_PREFIX.to_string(),
            group: NODES_GROUP.to_string(),
        }
    }
}

impl NodeIdentityShape {
    /// Returns the node name if `user` is a node identity.
    ///
    /// Both conditions must hold: membership in the node group, and a user
    /// name of the form `<prefix><nodeName>` with a non-empty node name.
    pub fn node_name<'a>(&self, user: &'a UserInfo) -> Option<&'a str> {
        if !user.in_group(&self.group) {
            return None;
        }
        match user.name.strip_prefix(self.user_prefix.as_str()) {
            Some(node) if !node.is_empty() => Some(node),
            _ => None,
        }
    }
}
