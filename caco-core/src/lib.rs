//! Shared time model, domain entities, and error types for the Carbon-Aware
//! Compute Orchestrator (CACO) planning core.
//!
//! This crate has no async dependency and no I/O: it is the vocabulary that
//! the grid provider, compute ledger, scheduling engine, and coordination
//! agent all share.

pub mod error;
pub mod time;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use time::{ensure_utc, isoformat, parse_datetime};
pub use types::{CarbonPoint, FlexOffer, Job, PricePoint, ScheduledJob};
