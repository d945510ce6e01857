//! # Warden Policy
//!
//! Declarative, ordered allow/deny rules for requests the graph does not
//! cover.
//!
//! ## Overview
//!
//! A rule source is a JSON list of records, each matching on `user`,
//! `group`, `resource`, `namespace` and `verb` (`"*"` matches anything)
//! and carrying a decision of `Allow` or `Deny`. Rules are scanned in
//! order; the first match decides; no match is NoOpinion.
//!
//! ```json
//! [
//!   {"user": "*", "group": "system:masters", "resource": "*",
//!    "namespace": "*", "verb": "*", "decision": "Allow"}
//! ]
//! ```
//!
//! ## Loading
//!
//! Loading is fail-closed: a malformed source, a missing field or an empty
//! pattern is an error, and [`PolicyEngine::load`] failing at startup must
//! stop the process. [`PolicyEngine::reload`] applies the same validation
//! and keeps the previous rules when it fails.

pub mod engine;
pub mod error;
pub mod rule;
pub mod ruleset;

pub use engine::PolicyEngine;
pub use error::{PolicyError, Result};
pub use rule::{Pattern, Rule, RuleDecision, WILDCARD};
pub use ruleset::RuleSet;
