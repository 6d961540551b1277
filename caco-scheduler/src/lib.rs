//! Constrained multi-objective greedy scheduling engine.
//!
//! Synchronous and deterministic by design: given the same jobs, grid
//! series, and weights, [`optimize_schedule`] always produces the same
//! schedule and flex offers. No I/O, no clocks, no randomness.

pub mod engine;
pub mod timeline;
pub mod weights;

pub use engine::optimize_schedule;
pub use timeline::Timeline;
pub use weights::SchedulingWeights;
