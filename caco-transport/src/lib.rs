//! Framed request/response agent RPC transport.
//!
//! Each of the three CACO agents (Coordination, Compute, Grid) exposes one
//! operation: accept a single textual request payload carrying a JSON
//! object, process it, and emit one textual response payload carrying a
//! JSON object, correlated end-to-end by a caller-assigned context id.
//!
//! This crate specs and implements the framing and dispatch semantics the
//! three agents share — it does not commit to a specific wire transport.
//! An HTTP-facing listener is an external collaborator that would sit on
//! top of [`dispatch`].

use async_trait::async_trait;
use serde_json::Value;
use tracing::{instrument, warn};

/// A single correlated request: a caller-assigned `context_id`, the parsed
/// `command`, and the full decoded payload.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub context_id: String,
    pub command: String,
    pub payload: Value,
}

/// An agent that answers exactly one request with exactly one response
/// body (a JSON object, or an error object).
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn handle(&self, request: RpcRequest) -> Value;
}

/// Build the transport-level malformed-request error body.
fn malformed_request_error(detail: &str) -> Value {
    serde_json::json!({ "status": "error", "message": format!("Invalid JSON payload: {detail}") })
}

/// Parse a raw textual request payload, dispatch it to `agent`, and return
/// the serialized textual response payload.
///
/// Malformed JSON never surfaces as a transport-level failure: it produces
/// `{status: "error", message: <parse detail>}`, matching spec.md §4.1/§7.
/// A request object missing `command` is treated the same way, since an
/// agent cannot dispatch without one.
#[instrument(skip(agent, raw_request), fields(context_id = %context_id.as_ref()))]
pub async fn dispatch<E: AgentExecutor + ?Sized>(
    agent: &E,
    context_id: impl AsRef<str>,
    raw_request: &str,
) -> String {
    let context_id = context_id.as_ref().to_string();

    let payload: Value = match serde_json::from_str(raw_request) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "malformed RPC request payload");
            return malformed_request_error(&err.to_string()).to_string();
        }
    };

    let command = match payload.get("command").and_then(Value::as_str) {
        Some(command) => command.to_string(),
        None => {
            warn!("RPC request missing 'command' field");
            return malformed_request_error("missing 'command' field").to_string();
        }
    };

    let request = RpcRequest {
        context_id,
        command,
        payload,
    };

    let response = agent.handle(request).await;
    response.to_string()
}

/// Build a `{status: "error", message}` response body. Agents use this for
/// unknown commands and downstream-agent error propagation (spec.md §7).
pub fn error_response(message: impl Into<String>) -> Value {
    serde_json::json!({ "status": "error", "message": message.into() })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAgent;

    #[async_trait]
    impl AgentExecutor for EchoAgent {
        async fn handle(&self, request: RpcRequest) -> Value {
            if request.command == "echo" {
                serde_json::json!({ "status": "ok", "echoed": request.payload })
            } else {
                error_response(format!("Unknown command '{}'", request.command))
            }
        }
    }

    #[tokio::test]
    async fn malformed_json_yields_error_not_panic() {
        let response = dispatch(&EchoAgent, "ctx-1", "{not json").await;
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["status"], "error");
        assert!(parsed["message"].as_str().unwrap().contains("Invalid JSON"));
    }

    #[tokio::test]
    async fn missing_command_yields_error() {
        let response = dispatch(&EchoAgent, "ctx-1", "{}").await;
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["status"], "error");
    }

    #[tokio::test]
    async fn unknown_command_is_reported_by_the_agent() {
        let response = dispatch(&EchoAgent, "ctx-1", r#"{"command": "bogus"}"#).await;
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["message"], "Unknown command 'bogus'");
    }

    #[tokio::test]
    async fn known_command_round_trips() {
        let response = dispatch(&EchoAgent, "ctx-1", r#"{"command": "echo", "x": 1}"#).await;
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["echoed"]["x"], 1);
    }
}
