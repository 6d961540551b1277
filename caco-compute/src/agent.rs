//! `AgentExecutor` wiring for the compute agent's two commands:
//! `ingest_jobs` and `get_flexibility_profile`.

use async_trait::async_trait;
use caco_core::types::Job;
use caco_transport::{error_response, AgentExecutor, RpcRequest};
use serde_json::Value;

use crate::ledger::{parse_window_bound, ComputeLedger};

/// The Compute agent: a thin RPC facade over a [`ComputeLedger`].
pub struct ComputeAgent {
    ledger: ComputeLedger,
}

impl ComputeAgent {
    pub fn new() -> Self {
        Self {
            ledger: ComputeLedger::new(),
        }
    }

    pub fn with_ledger(ledger: ComputeLedger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &ComputeLedger {
        &self.ledger
    }
}

impl Default for ComputeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentExecutor for ComputeAgent {
    async fn handle(&self, request: RpcRequest) -> Value {
        match request.command.as_str() {
            "ingest_jobs" => handle_ingest(&self.ledger, &request.payload).await,
            "get_flexibility_profile" => handle_flex_profile(&self.ledger, &request.payload).await,
            other => error_response(format!("Unknown command '{other}'")),
        }
    }
}

async fn handle_ingest(ledger: &ComputeLedger, payload: &Value) -> Value {
    let jobs: Vec<Job> = match payload.get("jobs").cloned() {
        Some(value) => match serde_json::from_value(value) {
            Ok(jobs) => jobs,
            Err(err) => return error_response(format!("Invalid job payload: {err}")),
        },
        None => Vec::new(),
    };

    let (num_jobs_ingested, total_jobs) = ledger.ingest_jobs(jobs).await;
    serde_json::json!({
        "status": "ok",
        "num_jobs_ingested": num_jobs_ingested,
        "total_jobs": total_jobs,
    })
}

async fn handle_flex_profile(ledger: &ComputeLedger, payload: &Value) -> Value {
    let from_raw = match payload.get("from").and_then(Value::as_str) {
        Some(raw) => raw,
        None => return error_response("Invalid window"),
    };
    let to_raw = match payload.get("to").and_then(Value::as_str) {
        Some(raw) => raw,
        None => return error_response("Invalid window"),
    };

    let from = match parse_window_bound(from_raw) {
        Ok(value) => value,
        Err(_) => return error_response("Invalid window"),
    };
    let to = match parse_window_bound(to_raw) {
        Ok(value) => value,
        Err(_) => return error_response("Invalid window"),
    };

    let cluster_id = payload.get("cluster_id").and_then(Value::as_str);
    let jobs = ledger.get_flexibility_profile(from, to, cluster_id).await;

    serde_json::json!({
        "status": "ok",
        "jobs": jobs,
    })
}
