use crate::types::config::ScoringPolicy;
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Days elapsed since `last_active`, or `None` when there is no timestamp.
/// A timestamp in the future counts as zero days; the second value reports it.
pub fn days_inactive(last_active: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (Option<f64>, bool) {
    match last_active {
        Some(last_active) => {
            let elapsed = now.signed_duration_since(last_active).num_milliseconds() as f64;
            if elapsed < 0.0 {
                (Some(0.0), true)
            } else {
                (Some(elapsed / MILLIS_PER_DAY), false)
            }
        }
        None => (None, false),
    }
}

/// Exponential half-life decay, held at `min_recency_factor` once a worker
/// passes the staleness threshold or has no recorded activity.
pub fn recency_factor(days_inactive: Option<f64>, policy: &ScoringPolicy) -> f64 {
    let floor = policy.min_recency_factor;
    match days_inactive {
        Some(days) if days.is_finite() && days < policy.staleness_days => {
            let decayed = 0.5_f64.powf(days.max(0.0) / policy.recency_half_life_days);
            decayed.clamp(floor, 1.0)
        }
        _ => floor,
    }
}
