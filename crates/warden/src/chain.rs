//! Ordered chains of authorities.
//!
//! The node authorizer is advisory: it answers NoOpinion whenever it has
//! nothing to say, and the chain moves on. Delegated authorities (an
//! external policy service, say) run under a timeout; a timeout or a
//! failure is NoOpinion, never a hang and never a Deny.

use std::sync::Arc;

use async_trait::async_trait;

use warden_core::{AuthzRequest, Decision, Verdict};

use crate::config::ChainConfig;
use crate::error::Result;

/// Anything that can decide an authorization request.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Authority: Send + Sync {
    /// Short name used in logs and reasons.
    fn name(&self) -> &str;

    async fn authorize(&self, request: &AuthzRequest) -> Result<Verdict>;
}

/// Evaluates authorities in order; the first Allow or Deny wins.
pub struct AuthorizerChain {
    authorities: Vec<Arc<dyn Authority>>,
    config: ChainConfig,
}

impl AuthorizerChain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            authorities: Vec::new(),
            config,
        }
    }

    /// Append an authority to the end of the chain.
    pub fn with(mut self, authority: Arc<dyn Authority>) -> Self {
        self.authorities.push(authority);
        self
    }

    pub fn len(&self) -> usize {
        self.authorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty()
    }

    /// If nobody has an opinion, the reason lists every authority's own
    /// reason in chain order.
    pub async fn authorize(&self, request: &AuthzRequest) -> Verdict {
        let mut reasons = Vec::with_capacity(self.authorities.len());
        for authority in &self.authorities {
            let verdict = self.consult(authority.as_ref(), request).await;
            if verdict.decision != Decision::NoOpinion {
                return verdict;
            }
            reasons.push(format!("{}: {}", authority.name(), verdict.reason));
        }

        if reasons.is_empty() {
            Verdict::no_opinion("no authority had an opinion")
        } else {
            Verdict::no_opinion(reasons.join("; "))
        }
    }

    async fn consult(&self, authority: &dyn Authority, request: &AuthzRequest) -> Verdict {
        let timeout = self.config.delegate_timeout;
        match tokio::time::timeout(timeout, authority.authorize(request)).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                tracing::warn!("Authority {} failed: {}", authority.name(), e);
                Verdict::no_opinion(format!("authority {} failed", authority.name()))
            }
            Err(_) => {
                tracing::warn!(
                    "Authority {} timed out after {:?}",
                    authority.name(),
                    timeout
                );
                Verdict::no_opinion(format!("authority {} timed out", authority.name()))
            }
        }
    }
}

impl Default for AuthorizerChain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}
