//! Configuration for the authorizer, the chain and the assembled service.

use std::time::Duration;

use warden_core::NodeIdentityShape;
use warden_updater::UpdaterConfig;

/// Configuration for the [`crate::Authorizer`].
#[derive(Debug, Clone, Default)]
pub struct AuthorizerConfig {
    /// Which callers count as node identities.
    pub node_identity: NodeIdentityShape,
}

/// Configuration for the [`crate::AuthorizerChain`].
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Upper bound on any single authority's answer.
    pub delegate_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            delegate_timeout: Duration::from_secs(5),
        }
    }
}

/// Configuration for [`crate::Warden`].
#[derive(Debug, Clone, Default)]
pub struct WardenConfig {
    pub authorizer: AuthorizerConfig,
    pub updater: UpdaterConfig,
    pub chain: ChainConfig,
    /// Feature gate settings, `Name=bool,Name=bool`. Empty means defaults.
    pub feature_gates: String,
}
