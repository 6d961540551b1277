//! Domain entities shared by the grid provider, compute ledger, scheduling
//! engine, and coordination agent: `Job`, `CarbonPoint`, `PricePoint`,
//! `ScheduledJob`, and `FlexOffer`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A unit of deferrable compute work, as ingested into the compute
/// ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub job_id: String,
    #[serde(default = "default_cluster_id")]
    pub cluster_id: String,
    #[serde(default = "default_workload_type")]
    pub workload_type: String,
    pub arrival_time: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub duration_hours: f64,
    pub power_kw: f64,
    #[serde(default)]
    pub max_deferral_hours: f64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub sla_penalty_per_hour: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_cluster_id() -> String {
    "default".to_string()
}

fn default_workload_type() -> String {
    "batch".to_string()
}

/// Round-half-to-even, matching Python's `round()`. `f64::round` rounds
/// half away from zero instead, which disagrees with the original at
/// exact `.5` boundaries.
fn round_half_to_even(value: f64) -> f64 {
    let floor = value.floor();
    let diff = value - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

impl Job {
    /// Slot count at half-hour granularity: `max(1, round(duration_hours * 2))`,
    /// with `round` matching Python's round-half-to-even rather than Rust's
    /// `f64::round` (round-half-away-from-zero) — the two diverge at exact
    /// `.5` boundaries, e.g. `2.5` rounds to `2`, not `3`.
    pub fn duration_slots(&self) -> usize {
        let slots = round_half_to_even(self.duration_hours * 2.0);
        if slots < 1.0 {
            1
        } else {
            slots as usize
        }
    }

    /// A job is flexible (deferrable) when `max_deferral_hours > 0`.
    pub fn is_flexible(&self) -> bool {
        self.max_deferral_hours > 0.0
    }

    /// `duration_hours <= (deadline + max_deferral_hours - arrival_time)`,
    /// the feasibility invariant from the spec. A job failing this may be
    /// dropped by the scheduler, but ingestion itself never rejects it.
    pub fn is_feasible(&self) -> bool {
        let slack_hours = (self.deadline - self.arrival_time).num_seconds() as f64 / 3600.0
            + self.max_deferral_hours;
        self.duration_hours <= slack_hours
    }
}

/// A single grid-carbon-intensity forecast sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarbonPoint {
    pub timestamp: DateTime<Utc>,
    pub forecast_g_per_kwh: f64,
    #[serde(rename = "index", default = "default_index_label")]
    pub index_label: String,
}

fn default_index_label() -> String {
    "unknown".to_string()
}

/// A single system-price forecast sample. Prices may be negative
/// (imbalance surpluses) and pass through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub system_buy_price_gbp_per_mwh: f64,
    pub system_sell_price_gbp_per_mwh: f64,
}

/// Structured metadata carried by every `ScheduledJob`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledJobMetadata {
    pub lateness_hours: f64,
    pub cluster_id: String,
    pub priority: i64,
}

/// A placement decision emitted by the scheduling engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledJob {
    pub job_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub power_kw: f64,
    pub expected_cost_gbp: f64,
    pub expected_carbon_kg: f64,
    pub is_flexible_offer: bool,
    pub metadata: ScheduledJobMetadata,
}

/// Tags carried by a `FlexOffer`, identifying the source job and its
/// placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlexOfferTags {
    pub job_id: String,
    pub scheduled_start: String,
}

/// A marketable capacity window derived from a flexible scheduled job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlexOffer {
    pub offer_id: String,
    pub cluster_id: String,
    pub power_kw: f64,
    pub duration_hours: f64,
    pub earliest_start: DateTime<Utc>,
    pub latest_end: DateTime<Utc>,
    pub min_activation_notice_minutes: u32,
    pub price_gbp_per_mwh: f64,
    pub carbon_intensity_cap_g_per_kwh: f64,
    pub tags: FlexOfferTags,
}
