use crate::distribution::rounding;
use crate::error::{FlamebornError, Result};
use crate::types::config::{DonationSettings, MAX_SHARE_PRECISION};
use crate::types::report::{DistributionShare, DonationAllocation};
use crate::types::worker::HealthWorker;
use std::collections::HashMap;

/// Splits a donation of `total` across `shares`, rounding to the configured
/// number of decimals while keeping the amounts summing to `total`.
pub fn preview_donation(
    total: f64,
    shares: &[DistributionShare],
    workers: &[HealthWorker],
    settings: &DonationSettings,
) -> Result<Vec<DonationAllocation>> {
    if !total.is_finite() || total <= 0.0 {
        return Err(FlamebornError::InvalidAmount(format!(
            "donation must be a positive amount (found {total})"
        )));
    }
    if total < settings.min_donation {
        return Err(FlamebornError::DonationBelowMinimum {
            amount: total,
            minimum: settings.min_donation,
        });
    }
    if shares.is_empty() {
        return Ok(Vec::new());
    }

    let addresses = workers
        .iter()
        .map(|worker| (worker.id.as_str(), worker.address.clone()))
        .collect::<HashMap<_, _>>();

    let scale = 10f64.powi(settings.amount_decimals as i32);
    let too_large = || {
        FlamebornError::InvalidAmount(format!(
            "{total} cannot be split at {} decimal places",
            settings.amount_decimals
        ))
    };
    let total_units = rounding::to_units(total, scale).ok_or_else(too_large)?;
    // Percentages are weighted on the finest share grid so the split is exact.
    let percent_scale = 10f64.powi(MAX_SHARE_PRECISION as i32);
    let parts = shares
        .iter()
        .map(|share| rounding::to_units(share.percentage, percent_scale))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(too_large)?;
    // Shares arrive largest first, so leftover units land on the largest amounts.
    let amounts = rounding::split_units(total_units, &parts).ok_or_else(too_large)?;

    Ok(shares
        .iter()
        .zip(amounts)
        .map(|(share, amount)| DonationAllocation {
            worker_id: share.worker_id.clone(),
            address: addresses
                .get(share.worker_id.as_str())
                .cloned()
                .flatten(),
            percentage: share.percentage,
            amount: amount as f64 / scale,
        })
        .collect())
}
