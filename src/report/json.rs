use crate::types::config::DonationSettings;
use crate::types::report::{DistributionReport, DonationAllocation};
use serde_json::json;

pub fn to_json(report: &DistributionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn preview_to_json(
    total: f64,
    allocations: &[DonationAllocation],
    settings: &DonationSettings,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "total": total,
        "currency": settings.currency,
        "allocations": allocations,
    }))
}
