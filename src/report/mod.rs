pub mod json;
pub mod md;

use crate::error::FlamebornError;
use crate::types::config::DonationSettings;
use crate::types::report::{DistributionReport, DonationAllocation};

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Md,
}

pub fn render(report: &DistributionReport, format: OutputFormat) -> Result<String, FlamebornError> {
    match format {
        OutputFormat::Json => json::to_json(report).map_err(FlamebornError::Json),
        OutputFormat::Md => Ok(md::to_markdown(report)),
    }
}

pub fn render_preview(
    total: f64,
    allocations: &[DonationAllocation],
    settings: &DonationSettings,
    format: OutputFormat,
) -> Result<String, FlamebornError> {
    match format {
        OutputFormat::Json => {
            json::preview_to_json(total, allocations, settings).map_err(FlamebornError::Json)
        }
        OutputFormat::Md => Ok(md::preview_to_markdown(total, allocations, settings)),
    }
}
