//! The reloadable policy engine.
//!
//! Readers load the current rule set without locking. A reload validates
//! the new source completely before publishing it with one pointer swap,
//! so a bad reload leaves the previous rules in force.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use warden_core::{ResourceAttributes, UserInfo, Verdict};

use crate::error::Result;
use crate::ruleset::RuleSet;

pub struct PolicyEngine {
    current: ArcSwap<RuleSet>,
    generation: AtomicU64,
}

impl PolicyEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: ArcSwap::from_pointee(rules),
            generation: AtomicU64::new(1),
        }
    }

    /// An engine with no rules; every request gets NoOpinion.
    pub fn empty() -> Self {
        Self::new(RuleSet::default())
    }

    /// Load the initial rule source. Failure here is fatal to startup.
    pub fn load(source: &str) -> Result<Self> {
        let rules = RuleSet::from_json(source)?;
        tracing::info!("Policy engine loaded {} rules", rules.len());
        Ok(Self::new(rules))
    }

    /// Replace the rule set from a new source.
    ///
    /// On error the current rules stay active.
    pub fn reload(&self, source: &str) -> Result<()> {
        match RuleSet::from_json(source) {
            Ok(rules) => {
                self.replace(rules);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Policy reload rejected, keeping current rules: {}", e);
                Err(e)
            }
        }
    }

    /// Swap in an already validated rule set.
    pub fn replace(&self, rules: RuleSet) {
        let count = rules.len();
        self.current.store(Arc::new(rules));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            "Policy engine reloaded {} rules (generation {})",
            count,
            generation
        );
    }

    /// The rule set in force right now.
    pub fn rules(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Incremented on every successful reload.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn evaluate(&self, user: &UserInfo, attrs: &ResourceAttributes) -> Verdict {
        self.current.load().evaluate(user, attrs)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("rules", &self.current.load().len())
            .field("generation", &self.generation())
            .finish()
    }
}
