//! Compute ledger: holds ingested `Job` specs and projects their
//! flexibility profile for a planning window.

pub mod agent;
pub mod error;
pub mod ledger;

pub use agent::ComputeAgent;
pub use error::{ComputeError, ComputeResult};
pub use ledger::{ComputeLedger, FlexibilityEntry};
