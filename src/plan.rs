use crate::distribution::{self, rounding, TOTAL_PERCENT};
use crate::scoring;
use crate::types::config::ScoringPolicy;
use crate::types::report::{DistributionReport, Finding};
use crate::types::worker::HealthWorker;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Scores every verified worker at `now` and distributes 100% among them.
///
/// Unverified workers never reach the distributor; they are listed in
/// `excluded`. Nothing here fails: problems surface as findings.
pub fn plan_distribution(
    workers: &[HealthWorker],
    now: DateTime<Utc>,
    policy: &ScoringPolicy,
) -> DistributionReport {
    let (eligible, unverified): (Vec<&HealthWorker>, Vec<&HealthWorker>) =
        workers.iter().partition(|worker| worker.is_verified);

    for worker in &unverified {
        debug!(worker_id = %worker.id, "unverified worker excluded from distribution");
    }

    let scores = eligible
        .iter()
        .map(|worker| scoring::score_worker(worker, now, policy))
        .collect::<Vec<_>>();
    let outcome = distribution::distribute_scores(&scores, policy);
    let flags = scores
        .iter()
        .flat_map(|scored| scored.flags.iter().cloned())
        .collect::<Vec<_>>();

    let mut findings = Vec::new();
    if eligible.is_empty() {
        findings.push(Finding::blocking(
            "roster.empty",
            "No eligible workers",
            "No verified healthcare workers are available; nothing can be distributed.",
        ));
    }
    if !unverified.is_empty() {
        findings.push(Finding::warning(
            "roster.unverified_excluded",
            "Unverified workers excluded",
            format!(
                "{} unverified worker(s) excluded from distribution: {}.",
                unverified.len(),
                unverified
                    .iter()
                    .map(|worker| worker.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }
    for scored in scores.iter().filter(|scored| !scored.flags.is_empty()) {
        let fields = scored
            .flags
            .iter()
            .map(|flag| format!("{} ({} -> {})", flag.field, flag.original, flag.clamped_to))
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(
            Finding::warning(
                "input.out_of_range",
                "Out-of-range input clamped",
                format!("Worker {} had out-of-range input: {fields}.", scored.worker_id),
            )
            .for_worker(&scored.worker_id),
        );
    }
    if outcome.floor_relaxed {
        findings.push(Finding::warning(
            "distribution.floor_relaxed",
            "Equity floor relaxed",
            floor_relaxed_message(policy, scores.len()),
        ));
    } else if outcome.equal_split {
        findings.push(Finding::warning(
            "distribution.equal_split",
            "Equal split fallback",
            "Impact scores gave no usable proportions; shares were split equally.",
        ));
    }

    info!(
        eligible = scores.len(),
        excluded = unverified.len(),
        flagged = flags.len(),
        "distribution planned"
    );

    DistributionReport {
        evaluated_at: now,
        policy: policy.clone(),
        scores,
        shares: outcome.shares,
        excluded: unverified.iter().map(|worker| worker.id.clone()).collect(),
        flags,
        findings,
        floor_relaxed: outcome.floor_relaxed,
        equal_split: outcome.equal_split,
    }
}

fn floor_relaxed_message(policy: &ScoringPolicy, workers: usize) -> String {
    let floor = policy.equity_floor_percent;
    let grid_floor = rounding::ceil_to_precision(floor, policy.share_precision);
    if floor * workers as f64 <= TOTAL_PERCENT && grid_floor > floor {
        format!(
            "An equity floor of {floor}% fits {workers} workers, but at {} decimal places it \
             rounds up to {grid_floor}%, which does not; shares were split equally.",
            policy.share_precision
        )
    } else {
        format!(
            "An equity floor of {floor}% cannot be guaranteed to {workers} workers; shares were split equally."
        )
    }
}

/// Roster hygiene checks that do not affect the distribution itself.
pub fn roster_findings(workers: &[HealthWorker]) -> Vec<Finding> {
    let mut findings = Vec::new();

    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for worker in workers {
        if !seen.insert(worker.id.as_str()) {
            duplicates.insert(worker.id.as_str());
        }
    }
    if !duplicates.is_empty() {
        findings.push(Finding::warning(
            "roster.duplicate_id",
            "Duplicate worker ids",
            format!(
                "Worker ids appear more than once and will be merged: {}.",
                duplicates.into_iter().collect::<Vec<_>>().join(", ")
            ),
        ));
    }

    for worker in workers.iter().filter(|worker| worker.is_verified) {
        let missing = worker
            .address
            .as_deref()
            .map(|address| address.trim().is_empty())
            .unwrap_or(true);
        if missing {
            findings.push(
                Finding::warning(
                    "roster.missing_address",
                    "Verified worker without wallet address",
                    format!(
                        "{} is verified but has no wallet address to receive donations.",
                        worker.display_name()
                    ),
                )
                .for_worker(&worker.id),
            );
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn worker(id: &str, patients: i64, verified: bool) -> HealthWorker {
        HealthWorker {
            is_verified: verified,
            patients_served: patients,
            critical_cases: patients / 10,
            response_time_avg_minutes: 20.0,
            location_accessibility_score: 4.0,
            specializations: vec!["general".to_string()],
            last_active_timestamp: Some(now() - Duration::days(1)),
            ..HealthWorker::new(id)
        }
    }

    #[test]
    fn unverified_workers_never_receive_a_share() {
        let workers = vec![
            worker("hw-1", 200, true),
            worker("hw-2", 5_000, false),
            worker("hw-3", 40, true),
        ];
        let report = plan_distribution(&workers, now(), &ScoringPolicy::default());

        assert!(report.share_of("hw-2").is_none());
        assert_eq!(report.excluded, vec!["hw-2".to_string()]);
        assert_eq!(report.shares.len(), 2);
        let total: f64 = report.shares.iter().map(|share| share.percentage).sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert!(report
            .findings
            .iter()
            .any(|finding| finding.id == "roster.unverified_excluded" && !finding.blocking));
        assert!(!report.has_blocking());
    }

    #[test]
    fn empty_roster_is_blocking_but_not_an_error() {
        let report = plan_distribution(&[], now(), &ScoringPolicy::default());
        assert!(report.shares.is_empty());
        assert!(report.has_blocking());
        assert!(report
            .findings
            .iter()
            .any(|finding| finding.id == "roster.empty"));
    }

    #[test]
    fn clamped_inputs_surface_as_findings() {
        let mut broken = worker("hw-9", 10, true);
        broken.critical_cases = -3;
        let report = plan_distribution(&[broken], now(), &ScoringPolicy::default());

        assert_eq!(report.flags.len(), 1);
        let finding = report
            .findings
            .iter()
            .find(|finding| finding.id == "input.out_of_range")
            .expect("out-of-range finding should exist");
        assert_eq!(finding.worker_id.as_deref(), Some("hw-9"));
        assert!(finding.body.contains("criticalCases"));
        assert_eq!(report.share_of("hw-9"), Some(100.0));
    }

    #[test]
    fn relaxed_floor_is_reported() {
        let policy = ScoringPolicy {
            equity_floor_percent: 40.0,
            ..ScoringPolicy::default()
        };
        let workers = vec![
            worker("a", 10, true),
            worker("b", 20, true),
            worker("c", 30, true),
        ];
        let report = plan_distribution(&workers, now(), &policy);
        assert!(report.floor_relaxed);
        assert!(report
            .findings
            .iter()
            .any(|finding| finding.id == "distribution.floor_relaxed"));
    }

    #[test]
    fn floor_relaxed_by_display_precision_says_so() {
        let policy = ScoringPolicy {
            equity_floor_percent: 33.333,
            ..ScoringPolicy::default()
        };
        let workers = vec![
            worker("a", 10, true),
            worker("b", 20, true),
            worker("c", 30, true),
        ];
        let report = plan_distribution(&workers, now(), &policy);
        assert!(report.floor_relaxed);
        let finding = report
            .findings
            .iter()
            .find(|finding| finding.id == "distribution.floor_relaxed")
            .expect("relaxed floor finding should exist");
        assert!(finding.body.contains("rounds up to 33.34%"));
        assert!(finding.body.contains("2 decimal places"));
    }

    #[test]
    fn roster_findings_flag_duplicates_and_missing_addresses() {
        let mut paid = worker("hw-1", 10, true);
        paid.address = Some("0x1111".to_string());
        let workers = vec![
            paid.clone(),
            paid,
            worker("hw-2", 10, true),
            worker("hw-3", 10, false),
        ];
        let findings = roster_findings(&workers);

        let duplicate = findings
            .iter()
            .find(|finding| finding.id == "roster.duplicate_id")
            .expect("duplicate finding should exist");
        assert!(duplicate.body.contains("hw-1"));
        let missing = findings
            .iter()
            .filter(|finding| finding.id == "roster.missing_address")
            .collect::<Vec<_>>();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].worker_id.as_deref(), Some("hw-2"));
    }

    #[test]
    fn more_patients_means_a_larger_share() {
        let workers = vec![worker("busy", 400, true), worker("quiet", 20, true)];
        let report = plan_distribution(&workers, now(), &ScoringPolicy::default());
        let busy = report.share_of("busy").expect("busy should have a share");
        let quiet = report.share_of("quiet").expect("quiet should have a share");
        assert!(busy > quiet);
        assert!(quiet >= ScoringPolicy::default().equity_floor_percent);
    }
}
