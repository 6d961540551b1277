//! Timeline construction: the ordered union of carbon and price
//! timestamps, forward-filled into two lookups (spec.md §3, §4.4 Step 1).

use std::collections::{BTreeMap, HashMap};

use caco_core::types::{CarbonPoint, PricePoint};
use chrono::{DateTime, Utc};

/// An ordered slot timeline plus forward-filled price (GBP/kWh) and
/// carbon (g/kWh) lookups covering every slot.
pub struct Timeline {
    pub slots: Vec<DateTime<Utc>>,
    pub price_gbp_per_kwh: HashMap<DateTime<Utc>, f64>,
    pub carbon_g_per_kwh: HashMap<DateTime<Utc>, f64>,
}

impl Timeline {
    /// Build the sorted union of timestamps present in either series,
    /// forward-filling gaps in one series with the most recent value from
    /// the same series. If a series begins with a missing value, the
    /// first available value on that side seeds the fill.
    pub fn build(carbon_series: &[CarbonPoint], price_series: &[PricePoint]) -> Self {
        let mut price_raw: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for point in price_series {
            price_raw.insert(point.timestamp, point.system_buy_price_gbp_per_mwh / 1000.0);
        }
        let mut carbon_raw: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for point in carbon_series {
            carbon_raw.insert(point.timestamp, point.forecast_g_per_kwh);
        }

        let mut timestamps: Vec<DateTime<Utc>> = price_raw
            .keys()
            .chain(carbon_raw.keys())
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        timestamps.sort();

        let mut price_gbp_per_kwh = HashMap::new();
        let mut carbon_g_per_kwh = HashMap::new();

        let mut last_price = price_raw.values().next().copied();
        let mut last_carbon = carbon_raw.values().next().copied();

        for ts in &timestamps {
            if let Some(value) = price_raw.get(ts) {
                last_price = Some(*value);
            }
            if let Some(value) = carbon_raw.get(ts) {
                last_carbon = Some(*value);
            }
            if let Some(value) = last_price {
                price_gbp_per_kwh.insert(*ts, value);
            }
            if let Some(value) = last_carbon {
                carbon_g_per_kwh.insert(*ts, value);
            }
        }

        Self {
            slots: timestamps,
            price_gbp_per_kwh,
            carbon_g_per_kwh,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn union_of_timestamps_is_sorted_and_deduplicated() {
        let carbon = vec![
            CarbonPoint { timestamp: ts(0, 0), forecast_g_per_kwh: 100.0, index_label: "moderate".into() },
            CarbonPoint { timestamp: ts(1, 0), forecast_g_per_kwh: 90.0, index_label: "low".into() },
        ];
        let price = vec![PricePoint {
            timestamp: ts(0, 30),
            system_buy_price_gbp_per_mwh: 200.0,
            system_sell_price_gbp_per_mwh: 150.0,
        }];
        let timeline = Timeline::build(&carbon, &price);
        assert_eq!(timeline.slots, vec![ts(0, 0), ts(0, 30), ts(1, 0)]);
    }

    #[test]
    fn forward_fill_carries_last_known_value_across_the_other_series() {
        let carbon = vec![
            CarbonPoint { timestamp: ts(0, 0), forecast_g_per_kwh: 300.0, index_label: "high".into() },
        ];
        let price = vec![
            PricePoint { timestamp: ts(0, 0), system_buy_price_gbp_per_mwh: 100.0, system_sell_price_gbp_per_mwh: 70.0 },
            PricePoint { timestamp: ts(0, 30), system_buy_price_gbp_per_mwh: 200.0, system_sell_price_gbp_per_mwh: 170.0 },
        ];
        let timeline = Timeline::build(&carbon, &price);
        // carbon has no point at 0:30, so it must carry forward the 0:00 value.
        assert_eq!(timeline.carbon_g_per_kwh[&ts(0, 30)], 300.0);
        assert_eq!(timeline.price_gbp_per_kwh[&ts(0, 30)], 0.2);
    }

    #[test]
    fn every_slot_has_both_lookups_defined() {
        let carbon = vec![CarbonPoint { timestamp: ts(0, 0), forecast_g_per_kwh: 100.0, index_label: "moderate".into() }];
        let price = vec![
            PricePoint { timestamp: ts(0, 0), system_buy_price_gbp_per_mwh: 100.0, system_sell_price_gbp_per_mwh: 70.0 },
            PricePoint { timestamp: ts(1, 0), system_buy_price_gbp_per_mwh: 120.0, system_sell_price_gbp_per_mwh: 90.0 },
        ];
        let timeline = Timeline::build(&carbon, &price);
        for slot in &timeline.slots {
            assert!(timeline.price_gbp_per_kwh.contains_key(slot));
            assert!(timeline.carbon_g_per_kwh.contains_key(slot));
        }
    }

    #[test]
    fn empty_series_yields_empty_timeline() {
        let timeline = Timeline::build(&[], &[]);
        assert!(timeline.is_empty());
    }
}
