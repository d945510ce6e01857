//! # Warden Testkit
//!
//! Testing utilities for Warden.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a generated cluster of nodes and workloads, as a
//!   snapshot or as a stream of watch events
//! - **Scenarios**: known authorization requests with expected decisions
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Scenarios
//!
//! Scenarios run against any authorizer that maps a request to a decision:
//!
//! ```rust
//! use warden_core::{Decision, FeatureGates};
//! use warden_testkit::scenarios::verify_all_scenarios;
//!
//! let gates = FeatureGates::new();
//! let results = verify_all_scenarios(&gates, |_| Decision::NoOpinion);
//! assert!(results.iter().any(|r| !r.passed()));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use warden_graph::compute_digest;
//! use warden_testkit::generators::{edge, graph};
//!
//! proptest! {
//!     #[test]
//!     fn add_is_idempotent(g in graph(40), e in edge()) {
//!         let mut once = g.clone();
//!         once.add_edge(&e).unwrap();
//!         let mut twice = once.clone();
//!         twice.add_edge(&e).unwrap();
//!         prop_assert_eq!(compute_digest(&once), compute_digest(&twice));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use warden_testkit::fixtures::ClusterFixture;
//!
//! let fixture = ClusterFixture::canonical();
//! let snapshot = fixture.snapshot();
//! assert!(!snapshot.is_empty());
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{get_attachment, get_request, ClusterFixture, SHARED_CONFIG_MAP, SHARED_SECRET};
pub use generators::{graph_from_ops, GraphOp};
pub use scenarios::{all_scenarios, verify_all_scenarios, Scenario, ScenarioResult};
