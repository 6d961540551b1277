//! `AgentExecutor` wiring for the grid agent's single command:
//! `get_grid_forecast`.

use async_trait::async_trait;
use caco_core::types::{CarbonPoint, PricePoint};
use caco_transport::{error_response, AgentExecutor, RpcRequest};
use serde_json::Value;
use tracing::instrument;

use crate::error::{GridError, GridResult};
use crate::source::GridDataSource;

/// The Grid agent: fans carbon + price fetches out concurrently to a
/// [`GridDataSource`] and returns an un-wrapped `{carbon_series,
/// price_series}` body (no `status` field, per spec.md §4.1).
pub struct GridAgent<S: GridDataSource> {
    source: S,
}

impl<S: GridDataSource> GridAgent<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[instrument(skip(self))]
    pub async fn get_grid_forecast(
        &self,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> (Vec<CarbonPoint>, Vec<PricePoint>) {
        let (carbon_raw, price_series) =
            tokio::join!(self.source.fetch_carbon(from), self.source.fetch_prices(from, to));

        let filtered: Vec<CarbonPoint> = carbon_raw
            .iter()
            .filter(|point| point.timestamp >= from && point.timestamp <= to)
            .cloned()
            .collect();
        let carbon_series = if filtered.is_empty() { carbon_raw } else { filtered };

        (carbon_series, price_series)
    }
}

fn parse_window(payload: &Value) -> GridResult<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> {
    let from_raw = payload
        .get("from")
        .and_then(Value::as_str)
        .ok_or_else(|| GridError::InvalidWindow("missing 'from'".to_string()))?;
    let to_raw = payload
        .get("to")
        .and_then(Value::as_str)
        .ok_or_else(|| GridError::InvalidWindow("missing 'to'".to_string()))?;

    let from = caco_core::time::parse_datetime(from_raw)
        .map_err(|_| GridError::InvalidWindow(format!("invalid timestamp '{from_raw}'")))?;
    let to = caco_core::time::parse_datetime(to_raw)
        .map_err(|_| GridError::InvalidWindow(format!("invalid timestamp '{to_raw}'")))?;
    Ok((from, to))
}

#[async_trait]
impl<S: GridDataSource> AgentExecutor for GridAgent<S> {
    async fn handle(&self, request: RpcRequest) -> Value {
        if request.command != "get_grid_forecast" {
            return error_response(format!("Unknown command '{}'", request.command));
        }

        let (from, to) = match parse_window(&request.payload) {
            Ok(window) => window,
            Err(_) => return error_response("Invalid window"),
        };

        let (carbon_series, price_series) = self.get_grid_forecast(from, to).await;
        serde_json::json!({
            "carbon_series": carbon_series,
            "price_series": price_series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait as at;
    use caco_transport::dispatch;
    use chrono::{TimeZone, Utc};

    struct StaticSource {
        carbon: Vec<CarbonPoint>,
        prices: Vec<PricePoint>,
    }

    #[at]
    impl GridDataSource for StaticSource {
        async fn fetch_carbon(&self, _from: chrono::DateTime<Utc>) -> Vec<CarbonPoint> {
            self.carbon.clone()
        }

        async fn fetch_prices(
            &self,
            _from: chrono::DateTime<Utc>,
            _to: chrono::DateTime<Utc>,
        ) -> Vec<PricePoint> {
            self.prices.clone()
        }
    }

    #[tokio::test]
    async fn filters_carbon_series_to_window() {
        let source = StaticSource {
            carbon: vec![
                CarbonPoint {
                    timestamp: Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap(),
                    forecast_g_per_kwh: 50.0,
                    index_label: "low".to_string(),
                },
                CarbonPoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                    forecast_g_per_kwh: 100.0,
                    index_label: "moderate".to_string(),
                },
            ],
            prices: vec![],
        };
        let agent = GridAgent::new(source);
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = from + chrono::Duration::hours(1);
        let (carbon, _) = agent.get_grid_forecast(from, to).await;
        assert_eq!(carbon.len(), 1);
        assert_eq!(carbon[0].forecast_g_per_kwh, 100.0);
    }

    #[tokio::test]
    async fn empty_filter_result_falls_back_to_raw_series() {
        let source = StaticSource {
            carbon: vec![CarbonPoint {
                timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                forecast_g_per_kwh: 50.0,
                index_label: "low".to_string(),
            }],
            prices: vec![],
        };
        let agent = GridAgent::new(source);
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = from + chrono::Duration::hours(1);
        let (carbon, _) = agent.get_grid_forecast(from, to).await;
        assert_eq!(carbon.len(), 1);
    }

    #[tokio::test]
    async fn unknown_command_reports_error() {
        let agent = GridAgent::new(StaticSource {
            carbon: vec![],
            prices: vec![],
        });
        let response = dispatch(&agent, "ctx-1", r#"{"command": "bogus"}"#).await;
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["status"], "error");
    }

    #[tokio::test]
    async fn response_has_no_status_field() {
        let agent = GridAgent::new(StaticSource {
            carbon: vec![],
            prices: vec![],
        });
        let response = dispatch(
            &agent,
            "ctx-1",
            r#"{"command": "get_grid_forecast", "from": "2024-01-01T00:00:00Z", "to": "2024-01-01T01:00:00Z", "region": "GB"}"#,
        )
        .await;
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert!(parsed.get("status").is_none());
        assert!(parsed.get("carbon_series").is_some());
        assert!(parsed.get("price_series").is_some());
    }
}
