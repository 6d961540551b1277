//! The greedy, constrained, multi-objective scheduling engine — the heart
//! of the CACO planning core. Ported line-for-line against
//! `original_source/src/optimization/engine.py` for arithmetic and
//! tie-break parity.

use caco_core::time::isoformat;
use caco_core::types::{FlexOffer, FlexOfferTags, Job, ScheduledJob, ScheduledJobMetadata};
use chrono::Duration;
use tracing::{debug, instrument};

use crate::timeline::Timeline;
use crate::weights::SchedulingWeights;

const SLOT_MINUTES: i64 = 30;
const SLOT_HOURS: f64 = 0.5;
const MIN_ACTIVATION_NOTICE_MINUTES: u32 = 60;

/// Run one planning cycle: place every job greedily against the timeline,
/// then derive marketable flex offers from the flexible placements.
///
/// Never errors. Jobs that cannot be placed under the window, power cap,
/// or deferral constraints are silently dropped (spec.md §4.4/§7). An
/// empty timeline (no carbon or price data at all) yields an empty
/// schedule and empty offer list.
#[instrument(skip(jobs, carbon_series, price_series), fields(num_jobs = jobs.len()))]
pub fn optimize_schedule(
    jobs: &[Job],
    carbon_series: &[caco_core::types::CarbonPoint],
    price_series: &[caco_core::types::PricePoint],
    weights: SchedulingWeights,
) -> (Vec<ScheduledJob>, Vec<FlexOffer>) {
    if jobs.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let timeline = Timeline::build(carbon_series, price_series);
    if timeline.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut power_usage = vec![0.0_f64; timeline.len()];
    let mut scheduled_jobs = Vec::new();

    let mut ordered_jobs: Vec<&Job> = jobs.iter().collect();
    ordered_jobs.sort_by(|a, b| {
        // (-priority, duration_hours, arrival_time) ascending.
        b.priority
            .cmp(&a.priority)
            .then(a.duration_hours.total_cmp(&b.duration_hours))
            .then(a.arrival_time.cmp(&b.arrival_time))
    });

    for job in ordered_jobs {
        let Some((start_index, lateness_hours)) =
            select_start_index(job, &timeline, &power_usage, weights)
        else {
            debug!(job_id = %job.job_id, "no feasible placement, dropping job");
            continue;
        };

        let slot_count = job.duration_slots();
        let start_time = timeline.slots[start_index];
        let end_time = timeline.slots[start_index + slot_count - 1] + Duration::minutes(SLOT_MINUTES);
        let slot_energy = job.power_kw * SLOT_HOURS;

        let mut price_cost = 0.0;
        let mut carbon_cost = 0.0;
        for offset in 0..slot_count {
            let idx = start_index + offset;
            let ts = timeline.slots[idx];
            price_cost += timeline.price_gbp_per_kwh[&ts] * slot_energy;
            carbon_cost += timeline.carbon_g_per_kwh[&ts] * slot_energy / 1000.0;
            power_usage[idx] += job.power_kw;
        }

        scheduled_jobs.push(ScheduledJob {
            job_id: job.job_id.clone(),
            start_time,
            end_time,
            power_kw: job.power_kw,
            expected_cost_gbp: round_to(price_cost, 2),
            expected_carbon_kg: round_to(carbon_cost, 3),
            is_flexible_offer: job.is_flexible(),
            metadata: ScheduledJobMetadata {
                lateness_hours,
                cluster_id: job.cluster_id.clone(),
                priority: job.priority,
            },
        });
    }

    let flex_offers = derive_flex_offers(&scheduled_jobs, &timeline, weights);
    (scheduled_jobs, flex_offers)
}

/// Find the feasible start index with the strictly smallest score. Ties
/// go to the earliest (first-seen) index, matching a `<` rather than `<=`
/// comparison.
fn select_start_index(
    job: &Job,
    timeline: &Timeline,
    power_usage: &[f64],
    weights: SchedulingWeights,
) -> Option<(usize, f64)> {
    let slot_count = job.duration_slots();
    let mut best: Option<(usize, f64, f64)> = None; // (index, score, lateness_hours)

    for idx in 0..timeline.len() {
        if idx + slot_count > timeline.len() {
            break;
        }
        let slot_start = timeline.slots[idx];
        if slot_start < job.arrival_time {
            continue;
        }

        let slot_end = timeline.slots[idx + slot_count - 1] + Duration::minutes(SLOT_MINUTES);
        let lateness_hours = ((slot_end - job.deadline).num_seconds() as f64 / 3600.0).max(0.0);
        if lateness_hours > job.max_deferral_hours && job.max_deferral_hours > 0.0 {
            continue;
        }

        let power_ok = (0..slot_count).all(|offset| power_usage[idx + offset] + job.power_kw <= weights.max_power_kw);
        if !power_ok {
            continue;
        }

        let mut score = 0.0;
        for offset in 0..slot_count {
            let ts = timeline.slots[idx + offset];
            let slot_energy = job.power_kw * SLOT_HOURS;
            score += timeline.price_gbp_per_kwh[&ts] * slot_energy;
            score += weights.carbon_penalty_weight * timeline.carbon_g_per_kwh[&ts] * slot_energy / 1000.0;
        }
        score += (weights.sla_penalty_weight + job.sla_penalty_per_hour) * lateness_hours;

        if best.as_ref().map_or(true, |(_, best_score, _)| score < *best_score) {
            best = Some((idx, score, lateness_hours));
        }
    }

    best.map(|(idx, _, lateness)| (idx, lateness))
}

fn derive_flex_offers(
    scheduled_jobs: &[ScheduledJob],
    timeline: &Timeline,
    weights: SchedulingWeights,
) -> Vec<FlexOffer> {
    scheduled_jobs
        .iter()
        .filter(|job| job.is_flexible_offer)
        .map(|job| {
            let avg_price = average_in_range(&timeline.price_gbp_per_kwh, &timeline.slots, job.start_time, job.end_time);
            let avg_carbon = average_in_range(&timeline.carbon_g_per_kwh, &timeline.slots, job.start_time, job.end_time);
            let duration_hours = (job.end_time - job.start_time).num_seconds() as f64 / 3600.0;

            FlexOffer {
                offer_id: format!("flex-{}", job.job_id),
                cluster_id: job.metadata.cluster_id.clone(),
                power_kw: job.power_kw,
                duration_hours,
                earliest_start: job.start_time,
                latest_end: job.end_time,
                min_activation_notice_minutes: MIN_ACTIVATION_NOTICE_MINUTES,
                price_gbp_per_mwh: (avg_price * 1000.0 * (1.0 + weights.carbon_penalty_weight / 10.0)).max(1.0),
                carbon_intensity_cap_g_per_kwh: avg_carbon,
                tags: FlexOfferTags {
                    job_id: job.job_id.clone(),
                    scheduled_start: isoformat(job.start_time),
                },
            }
        })
        .collect()
}

/// Mean of `values` over slots within `[start, end]` inclusive. Falls
/// back to the first available value if the window selects none, and to
/// `0.0` if the map itself is empty (spec.md §4.4 Step 4).
fn average_in_range(
    values: &std::collections::HashMap<chrono::DateTime<chrono::Utc>, f64>,
    slots: &[chrono::DateTime<chrono::Utc>],
    start: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
) -> f64 {
    let selected: Vec<f64> = slots
        .iter()
        .filter(|ts| **ts >= start && **ts <= end)
        .filter_map(|ts| values.get(ts).copied())
        .collect();
    if !selected.is_empty() {
        return selected.iter().sum::<f64>() / selected.len() as f64;
    }
    slots.first().and_then(|ts| values.get(ts).copied()).unwrap_or(0.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
