//! The optional weight oracle: an external advisor consulted for
//! `(carbon_penalty_weight, sla_penalty_weight, max_power_kw)`. Orthogonal
//! to scheduler correctness — any failure falls back to static weights,
//! and all suggestions are clamped before use.

use async_trait::async_trait;
use caco_scheduler::SchedulingWeights;

/// A suggestion from an external advisor, alongside its stated rationale.
#[derive(Debug, Clone)]
pub struct WeightSuggestion {
    pub weights: SchedulingWeights,
    pub reason: String,
}

#[async_trait]
pub trait WeightOracle: Send + Sync {
    /// Suggest weights given a grid summary and a demand summary. Any
    /// error (unavailable, malformed, out-of-range) causes the caller to
    /// keep the prior weights; the oracle never blocks a planning cycle.
    async fn suggest_weights(
        &self,
        grid_summary: &str,
        demand_summary: &str,
    ) -> Result<WeightSuggestion, String>;
}

/// The default oracle: no external advisor configured, always declines.
pub struct NullOracle;

#[async_trait]
impl WeightOracle for NullOracle {
    async fn suggest_weights(
        &self,
        _grid_summary: &str,
        _demand_summary: &str,
    ) -> Result<WeightSuggestion, String> {
        Err("no weight oracle configured".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_oracle_always_declines() {
        let oracle = NullOracle;
        let result = oracle.suggest_weights("grid ok", "demand ok").await;
        assert!(result.is_err());
    }
}
