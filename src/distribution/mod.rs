//! Equitable distribution of donation percentages.
//!
//! Shares are proportional to impact score, then every worker is lifted to the
//! equity floor at the expense of the workers above it. The sum-to-100
//! invariant always wins: when the floor cannot be met for every worker it is
//! dropped in favour of an equal split.
//!
//! Callers must pass verified workers only.

pub mod rounding;

use crate::types::config::ScoringPolicy;
use crate::types::report::DistributionShare;
use crate::types::scoring::{ImpactScore, Score};
use crate::types::worker::WorkerId;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const TOTAL_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionOutcome {
    pub shares: Vec<DistributionShare>,
    /// The floor, rounded up to the display grid, times the worker count
    /// exceeded 100%.
    pub floor_relaxed: bool,
    /// Scores were all zero or degenerate, so every worker got the same share.
    pub equal_split: bool,
    pub passes: usize,
}

impl DistributionOutcome {
    fn empty() -> Self {
        Self {
            shares: Vec::new(),
            floor_relaxed: false,
            equal_split: false,
            passes: 0,
        }
    }

    pub fn total(&self) -> f64 {
        self.shares.iter().map(|share| share.percentage).sum()
    }
}

/// Distributes 100% among `scores` with the floor and precision from `policy`.
pub fn distribute_scores(scores: &[ImpactScore], policy: &ScoringPolicy) -> DistributionOutcome {
    let pairs = scores
        .iter()
        .map(|scored| (scored.worker_id.clone(), scored.score))
        .collect::<Vec<_>>();
    distribute(&pairs, policy.equity_floor_percent, policy.share_precision)
}

pub fn distribute(
    scores: &[(WorkerId, Score)],
    equity_floor_percent: f64,
    precision: u32,
) -> DistributionOutcome {
    let canonical = canonicalize(scores);
    let count = canonical.len();
    if count == 0 {
        return DistributionOutcome::empty();
    }

    let floor = sanitize_floor(equity_floor_percent);
    let grid_floor = rounding::ceil_to_precision(floor, precision);
    let (ids, values): (Vec<&str>, Vec<f64>) = canonical.into_iter().unzip();

    if grid_floor * count as f64 > TOTAL_PERCENT + 1e-9 {
        warn!(
            workers = count,
            equity_floor_percent = floor,
            "equity floor cannot be met for every worker, falling back to an equal split"
        );
        let exact = vec![TOTAL_PERCENT / count as f64; count];
        let rounded = round_shares(&exact, &vec![1.0; count], precision, 0.0);
        return DistributionOutcome {
            shares: build_shares(&ids, &rounded),
            floor_relaxed: true,
            equal_split: true,
            passes: 0,
        };
    }

    let equal = vec![TOTAL_PERCENT / count as f64; count];
    let (exact, weights, equal_split, passes) = match proportional_shares(&values) {
        Some(raw) => {
            let (floored, passes) = apply_equity_floor(&raw, grid_floor);
            if floored.iter().all(|share| share.is_finite() && *share >= 0.0) {
                (floored, values, false, passes)
            } else {
                warn!("non-finite share after equity floor, falling back to an equal split");
                (equal, vec![1.0; count], true, passes)
            }
        }
        None => {
            debug!(workers = count, "no positive scores, splitting equally");
            (equal, vec![1.0; count], true, 0)
        }
    };

    let rounded = round_shares(&exact, &weights, precision, grid_floor);
    debug!(workers = count, passes, "distribution computed");
    DistributionOutcome {
        shares: build_shares(&ids, &rounded),
        floor_relaxed: false,
        equal_split,
        passes,
    }
}

/// Rounds to the display grid, weighting residual units by `weights` so that
/// a rounded share still only moves with its own score.
fn round_shares(exact: &[f64], weights: &[f64], precision: u32, grid_floor: f64) -> Vec<f64> {
    rounding::round_to_total(exact, weights, TOTAL_PERCENT, precision, grid_floor).unwrap_or_else(
        || {
            warn!(precision, "shares do not fit the display grid, leaving them unrounded");
            exact.to_vec()
        },
    )
}

/// Floor-adjusted shares before display rounding, in worker-id order.
pub fn equity_shares(scores: &[(WorkerId, Score)], equity_floor_percent: f64) -> Vec<DistributionShare> {
    let canonical = canonicalize(scores);
    let count = canonical.len();
    if count == 0 {
        return Vec::new();
    }
    let floor = sanitize_floor(equity_floor_percent);
    let (ids, values): (Vec<&str>, Vec<f64>) = canonical.into_iter().unzip();
    let exact = if floor * count as f64 > TOTAL_PERCENT {
        vec![TOTAL_PERCENT / count as f64; count]
    } else {
        match proportional_shares(&values) {
            Some(raw) => apply_equity_floor(&raw, floor).0,
            None => vec![TOTAL_PERCENT / count as f64; count],
        }
    };
    ids.iter()
        .zip(exact)
        .map(|(id, percentage)| DistributionShare {
            worker_id: id.to_string(),
            percentage,
        })
        .collect()
}

/// Deduplicates by worker id (highest score wins) and orders by id, so the
/// result does not depend on input order.
fn canonicalize(scores: &[(WorkerId, Score)]) -> BTreeMap<&str, f64> {
    let mut canonical = BTreeMap::<&str, f64>::new();
    for (worker_id, score) in scores {
        let score = if score.is_finite() && *score >= 0.0 {
            *score
        } else {
            warn!(worker_id = %worker_id, score = *score, "invalid score treated as zero");
            0.0
        };
        match canonical.get_mut(worker_id.as_str()) {
            Some(existing) => {
                warn!(worker_id = %worker_id, "duplicate worker id, keeping the highest score");
                if score > *existing {
                    *existing = score;
                }
            }
            None => {
                canonical.insert(worker_id.as_str(), score);
            }
        }
    }
    canonical
}

fn sanitize_floor(equity_floor_percent: f64) -> f64 {
    if equity_floor_percent.is_finite() {
        equity_floor_percent.clamp(0.0, TOTAL_PERCENT)
    } else {
        0.0
    }
}

/// Raw percentages proportional to score, or `None` when no score is positive.
fn proportional_shares(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    let raw = values
        .iter()
        .map(|value| value / total * TOTAL_PERCENT)
        .collect::<Vec<_>>();
    raw.iter().all(|share| share.is_finite()).then_some(raw)
}

/// Lifts below-floor workers to `floor` and scales the rest down to fund it.
/// Each pass pins at least one more worker, so at most `n` passes run.
fn apply_equity_floor(raw: &[f64], floor: f64) -> (Vec<f64>, usize) {
    let count = raw.len();
    let mut pinned = vec![false; count];
    let mut shares = raw.to_vec();
    let mut passes = 0;

    while passes <= count {
        passes += 1;
        let pinned_count = pinned.iter().filter(|is_pinned| **is_pinned).count();
        if pinned_count == count {
            return (vec![TOTAL_PERCENT / count as f64; count], passes);
        }

        let budget = TOTAL_PERCENT - floor * pinned_count as f64;
        let free_total: f64 = raw
            .iter()
            .zip(&pinned)
            .filter(|(_, is_pinned)| !**is_pinned)
            .map(|(share, _)| share)
            .sum();
        let free_count = (count - pinned_count) as f64;

        let mut newly_pinned = false;
        for index in 0..count {
            if pinned[index] {
                shares[index] = floor;
                continue;
            }
            shares[index] = if free_total > 0.0 {
                raw[index] * budget / free_total
            } else {
                budget / free_count
            };
            if shares[index] < floor {
                pinned[index] = true;
                newly_pinned = true;
            }
        }

        if !newly_pinned {
            break;
        }
    }

    (shares, passes)
}

fn build_shares(ids: &[&str], percentages: &[f64]) -> Vec<DistributionShare> {
    let mut shares = ids
        .iter()
        .zip(percentages)
        .map(|(id, percentage)| DistributionShare {
            worker_id: id.to_string(),
            percentage: *percentage,
        })
        .collect::<Vec<_>>();
    shares.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.worker_id.cmp(&b.worker_id))
    });
    shares
}
