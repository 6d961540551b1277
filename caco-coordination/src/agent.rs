//! The Coordination agent: orchestrates one planning cycle end to end.
//!
//! Fans out `get_grid_forecast` and `get_flexibility_profile` concurrently
//! over in-memory [`AgentExecutor`]s, resolves scheduling weights (static
//! defaults, payload overrides, optional oracle), invokes the scheduling
//! engine, and atomically replaces the cached schedule/flex-offer
//! snapshot before returning.

use std::sync::Arc;

use async_trait::async_trait;
use caco_core::time::parse_datetime;
use caco_core::types::{CarbonPoint, FlexOffer, Job, PricePoint};
use caco_scheduler::SchedulingWeights;
use caco_transport::{error_response, AgentExecutor, RpcRequest};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::error::CoordinationError;
use crate::oracle::{NullOracle, WeightOracle};
use crate::snapshot::{PlanningSnapshot, SnapshotCache};

const DEFAULT_HORIZON_HOURS: f64 = 24.0;

pub struct CoordinationAgent {
    grid: Arc<dyn AgentExecutor>,
    compute: Arc<dyn AgentExecutor>,
    oracle: Arc<dyn WeightOracle>,
    snapshot: SnapshotCache,
}

impl CoordinationAgent {
    pub fn new(grid: Arc<dyn AgentExecutor>, compute: Arc<dyn AgentExecutor>) -> Self {
        Self {
            grid,
            compute,
            oracle: Arc::new(NullOracle),
            snapshot: SnapshotCache::new(),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn WeightOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    #[instrument(skip(self, payload), fields(context_id = %context_id))]
    async fn run_caco_planning(&self, context_id: &str, payload: &Value) -> Value {
        let (window_start, window_end) = match resolve_window(payload) {
            Ok(window) => window,
            // Wire contract is the literal "Invalid window" (spec.md §7),
            // not the typed error's more detailed `Display` text.
            Err(CoordinationError::InvalidWindow(_)) => return error_response("Invalid window"),
            Err(err) => return error_response(err.to_string()),
        };
        let region = payload
            .get("region")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();
        let cluster_id = payload.get("cluster_id").and_then(Value::as_str).map(str::to_string);

        let grid_request = RpcRequest {
            context_id: context_id.to_string(),
            command: "get_grid_forecast".to_string(),
            payload: json!({
                "from": caco_core::time::isoformat(window_start),
                "to": caco_core::time::isoformat(window_end),
                "region": region,
            }),
        };
        let compute_request = RpcRequest {
            context_id: context_id.to_string(),
            command: "get_flexibility_profile".to_string(),
            payload: json!({
                "from": caco_core::time::isoformat(window_start),
                "to": caco_core::time::isoformat(window_end),
                "cluster_id": cluster_id,
            }),
        };

        let (grid_response, compute_response) =
            tokio::join!(self.grid.handle(grid_request), self.compute.handle(compute_request));

        let compute_status = compute_response.get("status").and_then(Value::as_str);
        if compute_status != Some("ok") {
            let err = CoordinationError::ComputeFailure(compute_response.clone());
            warn!(response = %compute_response, "compute agent reported failure");
            return json!({
                "status": "error",
                "message": err.to_string(),
                "inner": compute_response,
            });
        }

        let jobs: Vec<Job> = match compute_response.get("jobs").and_then(Value::as_array) {
            Some(entries) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect(),
            None => Vec::new(),
        };

        let carbon_series: Vec<CarbonPoint> = parse_series(&grid_response, "carbon_series");
        let price_series: Vec<PricePoint> = parse_series(&grid_response, "price_series");

        let weights = self
            .resolve_weights(payload, &carbon_series, &jobs)
            .await;

        let (scheduled_jobs, flex_offers) =
            caco_scheduler::optimize_schedule(&jobs, &carbon_series, &price_series, weights);

        self.snapshot
            .replace(PlanningSnapshot {
                scheduled_jobs: scheduled_jobs.clone(),
                flex_offers: flex_offers.clone(),
            })
            .await;

        json!({
            "status": "success",
            "window": {
                "from": caco_core::time::isoformat(window_start),
                "to": caco_core::time::isoformat(window_end),
            },
            "scheduled_jobs": scheduled_jobs,
            "flex_offers": flex_offers,
            "strategy": weights,
        })
    }

    /// Default weights, overridden by payload `optimization`, then
    /// optionally refined by the weight oracle. Only the oracle's
    /// suggestion is clamped to the valid ranges (spec.md §4.5 clamps
    /// "its outputs", i.e. the oracle's, not the payload's) — a caller
    /// passing an out-of-range `optimization` override gets exactly what
    /// it asked for, same as the original coordination agent.
    async fn resolve_weights(&self, payload: &Value, carbon_series: &[CarbonPoint], jobs: &[Job]) -> SchedulingWeights {
        let mut weights = SchedulingWeights::default();

        if let Some(optimization) = payload.get("optimization") {
            if let Some(v) = optimization.get("carbon_penalty_weight").and_then(Value::as_f64) {
                weights.carbon_penalty_weight = v;
            }
            if let Some(v) = optimization.get("sla_penalty_weight").and_then(Value::as_f64) {
                weights.sla_penalty_weight = v;
            }
            if let Some(v) = optimization.get("max_power_kw").and_then(Value::as_f64) {
                weights.max_power_kw = v;
            }
        }

        let grid_summary = format!("{} carbon samples", carbon_series.len());
        let demand_summary = format!("{} jobs", jobs.len());
        if let Ok(suggestion) = self.oracle.suggest_weights(&grid_summary, &demand_summary).await {
            weights = suggestion.weights.clamped();
        }

        weights
    }

    fn export_beckn_catalog_sync(&self, flex_offers: Vec<FlexOffer>) -> Value {
        json!({ "status": "ok", "flex_offers": flex_offers })
    }
}

fn resolve_window(payload: &Value) -> crate::CoordinationResult<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = |raw: &str| CoordinationError::InvalidWindow(format!("invalid timestamp '{raw}'"));
    let from = match payload.get("from").and_then(Value::as_str) {
        Some(raw) => parse_datetime(raw).map_err(|_| invalid(raw))?,
        None => Utc::now(),
    };
    let to = match payload.get("to").and_then(Value::as_str) {
        Some(raw) => parse_datetime(raw).map_err(|_| invalid(raw))?,
        None => {
            let horizon_hours = payload
                .get("horizon_hours")
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_HORIZON_HOURS);
            from + Duration::milliseconds((horizon_hours * 3_600_000.0) as i64)
        }
    };
    Ok((from, to))
}

fn parse_series<T: serde::de::DeserializeOwned>(response: &Value, key: &str) -> Vec<T> {
    response
        .get(key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl AgentExecutor for CoordinationAgent {
    async fn handle(&self, request: RpcRequest) -> Value {
        match request.command.as_str() {
            "run_caco_planning" => self.run_caco_planning(&request.context_id, &request.payload).await,
            "export_beckn_catalog" => {
                let snapshot = self.snapshot.current().await;
                self.export_beckn_catalog_sync(snapshot.flex_offers.clone())
            }
            other => error_response(format!("Unknown command '{other}'")),
        }
    }
}
