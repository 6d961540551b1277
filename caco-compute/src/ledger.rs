//! In-memory workload ledger and flexibility projection.

use std::collections::HashMap;
use std::path::Path;

use caco_core::time::parse_datetime;
use caco_core::types::Job;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::error::{ComputeError, ComputeResult};

/// A job view enriched with the window-relative flexibility fields the
/// scheduler and marketplace consume.
#[derive(Debug, Clone, Serialize)]
pub struct FlexibilityEntry {
    #[serde(flatten)]
    pub job: Job,
    pub earliest_start: DateTime<Utc>,
    pub latest_end: DateTime<Utc>,
    pub slack_hours: f64,
    pub is_flexible: bool,
}

/// Holds all ingested `Job` records until planner shutdown. Mutations
/// (ingest) and reads (flexibility projection) are serialized by the
/// single `RwLock`, matching spec.md §5's "no concurrent mutation within
/// one agent" invariant.
#[derive(Debug, Default)]
pub struct ComputeLedger {
    jobs: RwLock<HashMap<String, Job>>,
}

impl ComputeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload jobs from a bootstrap JSON file of the form
    /// `{"jobs": [...]}`. A missing file is not an error.
    pub async fn with_bootstrap_file(path: impl AsRef<Path>) -> ComputeResult<Self> {
        let ledger = Self::new();
        let path = path.as_ref();
        if !path.exists() {
            return Ok(ledger);
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ComputeError::BootstrapRead {
                path: path.display().to_string(),
                source,
            })?;

        #[derive(serde::Deserialize)]
        struct BootstrapFile {
            #[serde(default)]
            jobs: Vec<Job>,
        }

        let parsed: BootstrapFile =
            serde_json::from_str(&contents).map_err(|source| ComputeError::BootstrapParse {
                path: path.display().to_string(),
                source,
            })?;

        let (ingested, _total) = ledger.ingest_jobs(parsed.jobs).await;
        info!(ingested, "preloaded jobs from bootstrap file");
        Ok(ledger)
    }

    /// Merge jobs into the ledger keyed by `job_id` (last write wins).
    /// Returns `(num_jobs_ingested, total_jobs)`.
    #[instrument(skip(self, jobs))]
    pub async fn ingest_jobs(&self, jobs: Vec<Job>) -> (usize, usize) {
        let ingested = jobs.len();
        let mut guard = self.jobs.write().await;
        for job in jobs {
            guard.insert(job.job_id.clone(), job);
        }
        let total = guard.len();
        info!(ingested, total, "ingested jobs into compute ledger");
        (ingested, total)
    }

    /// Project the flexibility profile for every retained job overlapping
    /// `[from, to]`, optionally filtered by `cluster_id`.
    #[instrument(skip(self))]
    pub async fn get_flexibility_profile(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        cluster_id: Option<&str>,
    ) -> Vec<FlexibilityEntry> {
        let guard = self.jobs.read().await;
        guard
            .values()
            .filter(|job| job.deadline >= from && job.arrival_time <= to)
            .filter(|job| cluster_id.map_or(true, |cluster| job.cluster_id == cluster))
            .map(|job| project_flexibility(job, from, to))
            .collect()
    }
}

fn project_flexibility(job: &Job, from: DateTime<Utc>, to: DateTime<Utc>) -> FlexibilityEntry {
    let earliest_start = job.arrival_time.max(from);
    let latest_end = job.deadline.min(to);
    let window_hours = (latest_end - earliest_start).num_seconds() as f64 / 3600.0;
    let slack_hours = ((window_hours - job.duration_hours).max(0.0) * 100.0).round() / 100.0;

    FlexibilityEntry {
        job: job.clone(),
        earliest_start,
        latest_end,
        slack_hours,
        is_flexible: job.is_flexible(),
    }
}

/// Parse an RFC-3339 window bound, mapping failures to the shared
/// `ComputeError::InvalidWindow` variant used by the RPC layer.
pub fn parse_window_bound(raw: &str) -> ComputeResult<DateTime<Utc>> {
    parse_datetime(raw).map_err(|_| ComputeError::InvalidWindow(format!("invalid timestamp '{raw}'")))
}
