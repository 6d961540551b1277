//! Deterministic synthetic series used when an upstream grid data source
//! fails. Ported from `original_source/src/data_sources/*.py`'s
//! `_fallback_series` functions; the constants here are load-bearing, not
//! illustrative — changing them changes the observable behavior of
//! `get_grid_forecast` under simulated upstream failure (spec.md §8,
//! property 6).

use caco_core::types::{CarbonPoint, PricePoint};
use chrono::{DateTime, Duration, Timelike, Utc};

const CARBON_FALLBACK_PERIODS: usize = 48;

/// Floor a timestamp to the start of its hour.
fn hour_floor(value: DateTime<Utc>) -> DateTime<Utc> {
    value
        .with_minute(0)
        .and_then(|v| v.with_second(0))
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(value)
}

/// 48 half-hourly points starting at the hour floor of `start`.
/// `value = 80 + 20 * ((i mod 16) / 16)` g/kWh; `index = "low"` if < 100
/// else `"moderate"`.
pub fn carbon_fallback_series(start: DateTime<Utc>) -> Vec<CarbonPoint> {
    let base = hour_floor(start);
    (0..CARBON_FALLBACK_PERIODS)
        .map(|slot| {
            let timestamp = base + Duration::minutes(30 * slot as i64);
            let forecast = 80.0 + 20.0 * ((slot % 16) as f64 / 16.0);
            let index_label = if forecast < 100.0 { "low" } else { "moderate" };
            CarbonPoint {
                timestamp,
                forecast_g_per_kwh: forecast,
                index_label: index_label.to_string(),
            }
        })
        .collect()
}

/// Half-hourly points from the hour floor of `from` through the hour
/// floor of `to` inclusive. `buy = 100 + 20 * ((i mod 12) / 12)`,
/// `sell = buy - 30`.
pub fn price_fallback_series(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<PricePoint> {
    let start = hour_floor(from);
    let end = hour_floor(to);

    let mut series = Vec::new();
    let mut current = start;
    let mut slot = 0usize;
    while current <= end {
        let buy = 100.0 + 20.0 * ((slot % 12) as f64 / 12.0);
        series.push(PricePoint {
            timestamp: current,
            system_buy_price_gbp_per_mwh: buy,
            system_sell_price_gbp_per_mwh: buy - 30.0,
        });
        current += Duration::minutes(30);
        slot += 1;
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn carbon_fallback_has_48_points_and_hour_floor_start() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 17, 0).unwrap();
        let series = carbon_fallback_series(start);
        assert_eq!(series.len(), 48);
        assert_eq!(series[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap());
        assert_eq!(series[0].forecast_g_per_kwh, 80.0);
        assert_eq!(series[0].index_label, "low");
    }

    #[test]
    fn carbon_fallback_crosses_into_moderate() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = carbon_fallback_series(start);
        let last_low = series.iter().find(|p| p.forecast_g_per_kwh >= 100.0);
        assert!(last_low.is_some());
        assert_eq!(last_low.unwrap().index_label, "moderate");
    }

    #[test]
    fn price_fallback_covers_window_inclusive() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        let series = price_fallback_series(from, to);
        // hour floor 00:00 .. 02:00 inclusive at 30 min steps = 5 points
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].system_buy_price_gbp_per_mwh, 100.0);
        assert_eq!(series[0].system_sell_price_gbp_per_mwh, 70.0);
    }
}
