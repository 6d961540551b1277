//! Coordination agent: orchestrates a planning cycle end to end.
//!
//! Fans grid and compute RPCs out concurrently, invokes the scheduling
//! engine, and owns the only cross-request mutable state in the
//! planner — the last schedule and flex-offer list, replaced atomically
//! after each successful cycle.

pub mod agent;
pub mod config;
pub mod error;
pub mod oracle;
pub mod snapshot;

pub use agent::CoordinationAgent;
pub use config::CacoConfig;
pub use error::{CoordinationError, CoordinationResult};
pub use oracle::{NullOracle, WeightOracle, WeightSuggestion};
pub use snapshot::PlanningSnapshot;

/// Initialize structured logging for a process hosting one or more CACO
/// agents. Mirrors `knhk-swarm::init_tracing` / `knhk-sidecar`'s `main.rs`:
/// env-filter driven, target and level on, no OpenTelemetry export (that
/// pipeline is an external collaborator per spec.md §1).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .init();
}
