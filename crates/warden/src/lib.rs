//! # Warden
//!
//! Node authorization by relationship graph: a node may read a secret,
//! config map, claim, volume or volume attachment only if one of its own
//! workloads actually uses it.
//!
//! ## Overview
//!
//! - **Graph store**: typed adjacency maps answering bounded reachability
//! - **Graph updater**: watch events plus periodic atomic resync
//! - **Policy engine**: ordered allow/deny rules for everyone else
//! - **Authorizer**: routes node identities to the graph, the rest to policy
//! - **Feature gates**: runtime toggles for gated relation patterns
//!
//! ## Usage
//!
//! ```rust,no_run
//! use warden::{AuthzRequest, UserInfo, Warden, WardenConfig};
//! use warden::updater::memory;
//!
//! async fn example() {
//!     let warden = Warden::new(WardenConfig::default(), "[]").unwrap();
//!
//!     // Keep the graph current in the background
//!     // let (sink, events) = memory::channel(1024);
//!     // let snapshots = memory::MemorySnapshotSource::default();
//!     // warden.run_updater(&events, &snapshots, shutdown_rx).await?;
//!
//!     let request = AuthzRequest::builder(UserInfo::node("node0"))
//!         .verb("get")
//!         .resource("secrets")
//!         .namespace("ns0")
//!         .name("secret0")
//!         .build()
//!         .unwrap();
//!     let verdict = warden.authorize(&request).unwrap();
//!     println!("{}: {}", verdict.decision, verdict.reason);
//! }
//! ```
//!
//! ## Decisions
//!
//! The graph only ever grants. A node without a relationship to the object
//! gets NoOpinion so the rest of the authorization chain can decide; an
//! explicit Deny comes only from a policy rule or another authority.
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `warden::core` - Vertices, relations, requests, decisions, feature gates
//! - `warden::graph` - Graph store and reachability
//! - `warden::updater` - Graph updater and event sources
//! - `warden::policy` - Rule sets and the policy engine

pub mod authorizer;
pub mod chain;
pub mod config;
pub mod error;
pub mod warden;

// Re-export component crates
pub use warden_core as core;
pub use warden_graph as graph;
pub use warden_policy as policy;
pub use warden_updater as updater;

// Re-export main types for convenience
pub use authorizer::Authorizer;
pub use chain::{Authority, AuthorizerChain};
pub use config::{AuthorizerConfig, ChainConfig, WardenConfig};
pub use error::{AuthzError, Result};
pub use warden::Warden;

// Re-export commonly used core types
pub use warden_core::{
    AuthzRequest, Decision, Feature, FeatureGates, NodeIdentityShape, UserInfo, Verdict, Vertex,
};
