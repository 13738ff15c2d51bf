//! Impact scoring.
//!
//! Turns one [`HealthWorker`] record into a non-negative impact score at a
//! given evaluation time. Out-of-range inputs are clamped, never rejected, and
//! every clamp is reported as an [`InputFlag`] and logged.

pub mod recency;

use crate::types::config::ScoringPolicy;
use crate::types::scoring::{ImpactScore, InputField, InputFlag};
use crate::types::worker::HealthWorker;
use chrono::{DateTime, Utc};
use tracing::warn;

pub const MAX_ACCESSIBILITY: f64 = 10.0;

pub fn score_worker(
    worker: &HealthWorker,
    now: DateTime<Utc>,
    policy: &ScoringPolicy,
) -> ImpactScore {
    let mut flags = worker.coerced_inputs.clone();

    let patients = clamp_count(worker, InputField::PatientsServed, worker.patients_served, &mut flags);
    let critical = clamp_count(worker, InputField::CriticalCases, worker.critical_cases, &mut flags);
    let response_time = clamp_response_time(worker, &mut flags);
    let accessibility = clamp_accessibility(worker, &mut flags);
    let specialization = match worker.specialization_criticality {
        Some(value) if value.is_finite() && value >= 0.0 => value,
        Some(value) => {
            flag(worker, InputField::SpecializationCriticality, value, 0.0, &mut flags);
            0.0
        }
        None => policy
            .specializations
            .criticality_of(&worker.specializations),
    };

    let (days, in_future) = recency::days_inactive(worker.last_active_timestamp, now);
    if in_future {
        let original = worker
            .last_active_timestamp
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default();
        push_flag(
            worker,
            InputField::LastActive,
            original,
            now.to_rfc3339(),
            &mut flags,
        );
    }
    let recency_factor = recency::recency_factor(days, policy);

    // No patients means there is no response time to reward.
    let responsiveness = if patients > 0.0 {
        1.0 / (1.0 + response_time)
    } else {
        0.0
    };

    let activity = policy.patients_weight * patients
        + policy.critical_case_weight * critical * policy.criticality_multiplier
        + policy.response_time_weight * responsiveness
        + policy.accessibility_weight * accessibility
        + policy.specialization_weight * specialization;

    let mut score = policy.min_score + activity * recency_factor;
    if !score.is_finite() {
        warn!(worker_id = %worker.id, "impact score overflowed, using minimum score");
        score = policy.min_score;
    }

    ImpactScore {
        worker_id: worker.id.clone(),
        score,
        recency_factor,
        flags,
    }
}

pub fn score_workers(
    workers: &[HealthWorker],
    now: DateTime<Utc>,
    policy: &ScoringPolicy,
) -> Vec<ImpactScore> {
    workers
        .iter()
        .map(|worker| score_worker(worker, now, policy))
        .collect()
}

fn clamp_count(
    worker: &HealthWorker,
    field: InputField,
    value: i64,
    flags: &mut Vec<InputFlag>,
) -> f64 {
    if value < 0 {
        push_flag(worker, field, value.to_string(), "0".to_string(), flags);
        0.0
    } else {
        value as f64
    }
}

fn clamp_response_time(worker: &HealthWorker, flags: &mut Vec<InputFlag>) -> f64 {
    let value = worker.response_time_avg_minutes;
    // +inf is a legitimate "never responds" and scores zero responsiveness.
    if value.is_nan() || value < 0.0 {
        flag(worker, InputField::ResponseTime, value, 0.0, flags);
        0.0
    } else {
        value
    }
}

fn clamp_accessibility(worker: &HealthWorker, flags: &mut Vec<InputFlag>) -> f64 {
    let value = worker.location_accessibility_score;
    if value.is_nan() {
        flag(worker, InputField::LocationAccessibility, value, 0.0, flags);
        return 0.0;
    }
    let clamped = value.clamp(0.0, MAX_ACCESSIBILITY);
    if clamped != value {
        flag(worker, InputField::LocationAccessibility, value, clamped, flags);
    }
    clamped
}

fn flag(
    worker: &HealthWorker,
    field: InputField,
    original: f64,
    clamped_to: f64,
    flags: &mut Vec<InputFlag>,
) {
    push_flag(
        worker,
        field,
        original.to_string(),
        clamped_to.to_string(),
        flags,
    );
}

fn push_flag(
    worker: &HealthWorker,
    field: InputField,
    original: String,
    clamped_to: String,
    flags: &mut Vec<InputFlag>,
) {
    warn!(
        worker_id = %worker.id,
        field = %field,
        original = %original,
        clamped_to = %clamped_to,
        "out-of-range input clamped"
    );
    flags.push(InputFlag {
        worker_id: worker.id.clone(),
        field,
        original,
        clamped_to,
    });
}
