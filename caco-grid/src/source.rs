//! Concrete upstream HTTP data sources: UK Carbon Intensity API and
//! Elexon BMRS imbalance pricing, each falling back to a deterministic
//! synthetic series on any failure. Ported from
//! `original_source/src/data_sources/{carbon_intensity_client,bmrs_client}.py`.

use std::time::Duration;

use async_trait::async_trait;
use caco_core::time::{isoformat, parse_datetime};
use caco_core::types::{CarbonPoint, PricePoint};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::error::{GridError, GridResult};
use crate::fallback::{carbon_fallback_series, price_fallback_series};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// A source of carbon-intensity and system-price forecasts. Implementations
/// never surface upstream failures to callers — they substitute a
/// deterministic fallback series instead (spec.md §4.3).
#[async_trait]
pub trait GridDataSource: Send + Sync {
    async fn fetch_carbon(&self, from: DateTime<Utc>) -> Vec<CarbonPoint>;
    async fn fetch_prices(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PricePoint>;
}

/// Client for the UK Carbon Intensity API's 24h forecast endpoint.
pub struct CarbonIntensityClient {
    client: Client,
    base_url: String,
}

impl CarbonIntensityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(UPSTREAM_TIMEOUT)
                .build()
                .expect("reqwest client builds with a timeout"),
            base_url: base_url.into(),
        }
    }

    /// Return the next 24h carbon intensity forecast in half-hour steps,
    /// falling back to a synthetic series on any failure.
    pub async fn get_forecast_24h(&self, start: DateTime<Utc>) -> Vec<CarbonPoint> {
        match self.try_fetch(start).await {
            Ok(points) if !points.is_empty() => points,
            Ok(_) => {
                warn!("carbon intensity API returned no parseable entries, using fallback series");
                carbon_fallback_series(start)
            }
            Err(err) => {
                warn!(%err, "carbon intensity API failed, using fallback series");
                carbon_fallback_series(start)
            }
        }
    }

    async fn try_fetch(&self, start: DateTime<Utc>) -> GridResult<Vec<CarbonPoint>> {
        let url = format!("{}/intensity/{}/fw24h", self.base_url, isoformat(start));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GridError::Status(response.status()));
        }
        let payload: Value = response.json().await.map_err(|e| GridError::Parse(e.to_string()))?;
        let entries = payload
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if entries.is_empty() {
            return Err(GridError::EmptyData);
        }
        Ok(entries.iter().filter_map(parse_carbon_entry).collect())
    }
}

fn parse_carbon_entry(entry: &Value) -> Option<CarbonPoint> {
    let timestamp_raw = entry
        .get("from")
        .or_else(|| entry.get("timestamp"))
        .and_then(Value::as_str)?;
    let timestamp = parse_datetime(timestamp_raw).ok()?;

    let intensity = entry.get("intensity");
    let forecast = intensity
        .and_then(|i| i.get("forecast"))
        .and_then(Value::as_f64)
        .or_else(|| entry.get("forecast_g_per_kwh").and_then(Value::as_f64))
        .or_else(|| entry.get("actual").and_then(Value::as_f64))
        .unwrap_or(0.0);
    let index_label = intensity
        .and_then(|i| i.get("index"))
        .and_then(Value::as_str)
        .or_else(|| entry.get("index").and_then(Value::as_str))
        .unwrap_or("unknown")
        .to_string();

    Some(CarbonPoint {
        timestamp,
        forecast_g_per_kwh: forecast,
        index_label,
    })
}

/// Client for Elexon BMRS / Insights `DISEBSP` system price data.
pub struct BmrsPriceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BmrsPriceClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(UPSTREAM_TIMEOUT)
                .build()
                .expect("reqwest client builds with a timeout"),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub async fn get_system_prices(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PricePoint> {
        match self.try_fetch(from, to).await {
            Ok(points) if !points.is_empty() => points,
            Ok(_) => {
                warn!("BMRS API returned no parseable records, using fallback series");
                price_fallback_series(from, to)
            }
            Err(err) => {
                warn!(%err, "BMRS API failed, using fallback series");
                price_fallback_series(from, to)
            }
        }
    }

    async fn try_fetch(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> GridResult<Vec<PricePoint>> {
        let url = format!("{}/datasets/DISEBSP", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("from", isoformat(from)), ("to", isoformat(to))]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(GridError::Status(response.status()));
        }
        let payload: Value = response.json().await.map_err(|e| GridError::Parse(e.to_string()))?;
        let records = payload
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .or_else(|| {
                payload
                    .get("response")
                    .and_then(|r| r.get("data"))
                    .and_then(Value::as_array)
                    .cloned()
            })
            .unwrap_or_default();
        if records.is_empty() {
            return Err(GridError::EmptyData);
        }
        Ok(records.iter().filter_map(parse_price_record).collect())
    }
}

fn parse_price_record(record: &Value) -> Option<PricePoint> {
    let timestamp_raw = record
        .get("settlementPeriodStart")
        .or_else(|| record.get("time"))
        .or_else(|| record.get("timestamp"))
        .or_else(|| record.get("startTime"))
        .and_then(Value::as_str)?;
    let timestamp = parse_datetime(timestamp_raw).ok()?;

    let buy = record
        .get("systemBuyPrice")
        .or_else(|| record.get("buyPrice"))
        .or_else(|| record.get("price"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let sell = record
        .get("systemSellPrice")
        .or_else(|| record.get("sellPrice"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    Some(PricePoint {
        timestamp,
        system_buy_price_gbp_per_mwh: buy,
        system_sell_price_gbp_per_mwh: sell,
    })
}

/// The default grid data source: live HTTP clients for both upstream
/// providers, fetched concurrently.
pub struct HttpGridDataSource {
    pub carbon: CarbonIntensityClient,
    pub prices: BmrsPriceClient,
}

#[async_trait]
impl GridDataSource for HttpGridDataSource {
    async fn fetch_carbon(&self, from: DateTime<Utc>) -> Vec<CarbonPoint> {
        self.carbon.get_forecast_24h(from).await
    }

    async fn fetch_prices(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PricePoint> {
        self.prices.get_system_prices(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn carbon_client_parses_forecast_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/intensity/.*/fw24h$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"from": "2024-01-01T00:00:00Z", "intensity": {"forecast": 120.0, "index": "moderate"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = CarbonIntensityClient::new(server.uri());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = client.get_forecast_24h(start).await;

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].forecast_g_per_kwh, 120.0);
        assert_eq!(points[0].index_label, "moderate");
    }

    #[tokio::test]
    async fn carbon_client_falls_back_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/intensity/.*/fw24h$"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CarbonIntensityClient::new(server.uri());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = client.get_forecast_24h(start).await;

        assert_eq!(points.len(), 48);
    }

    #[tokio::test]
    async fn carbon_client_falls_back_on_empty_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/intensity/.*/fw24h$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let client = CarbonIntensityClient::new(server.uri());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = client.get_forecast_24h(start).await;

        assert_eq!(points.len(), 48);
    }

    #[tokio::test]
    async fn price_client_parses_tolerant_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/datasets/DISEBSP$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"data": [
                    {"time": "2024-01-01T00:00:00Z", "buyPrice": 95.0, "sellPrice": 65.0}
                ]}
            })))
            .mount(&server)
            .await;

        let client = BmrsPriceClient::new(server.uri(), None);
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = from + chrono::Duration::hours(1);
        let points = client.get_system_prices(from, to).await;

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].system_buy_price_gbp_per_mwh, 95.0);
        assert_eq!(points[0].system_sell_price_gbp_per_mwh, 65.0);
    }

    #[tokio::test]
    async fn price_client_falls_back_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/datasets/DISEBSP$"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = BmrsPriceClient::new(server.uri(), None);
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = from + chrono::Duration::hours(1);
        let points = client.get_system_prices(from, to).await;

        assert!(!points.is_empty());
    }
}
