use crate::types::config::DonationSettings;
use crate::types::report::{DistributionReport, DonationAllocation};

pub fn to_markdown(report: &DistributionReport) -> String {
    let decimals = report.policy.share_precision as usize;
    let mut output = String::new();
    output.push_str("# Donation Distribution\n\n");
    output.push_str(&format!(
        "Evaluated at: {}\n\nEquity floor: {}%\n\n",
        report.evaluated_at.to_rfc3339(),
        report.policy.equity_floor_percent
    ));

    output.push_str("## Shares\n\n");
    if report.shares.is_empty() {
        output.push_str("- none\n\n");
    } else {
        output.push_str("| Worker | Impact score | Share |\n|---|---:|---:|\n");
        for share in &report.shares {
            let score = report
                .scores
                .iter()
                .find(|scored| scored.worker_id == share.worker_id)
                .map(|scored| format!("{:.3}", scored.score))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "| {} | {} | {:.decimals$}% |\n",
                share.worker_id, score, share.percentage
            ));
        }
        output.push('\n');
    }

    if !report.excluded.is_empty() {
        output.push_str("## Excluded\n\n");
        for worker_id in &report.excluded {
            output.push_str(&format!("- {worker_id} (unverified)\n"));
        }
        output.push('\n');
    }

    output.push_str("## Findings\n\n");
    if report.findings.is_empty() {
        output.push_str("- none\n");
    } else {
        for finding in &report.findings {
            output.push_str(&format!(
                "- [{}] {}: {}\n",
                if finding.blocking {
                    "blocking"
                } else {
                    "warning"
                },
                finding.title,
                finding.body
            ));
        }
    }

    output
}

pub fn preview_to_markdown(
    total: f64,
    allocations: &[DonationAllocation],
    settings: &DonationSettings,
) -> String {
    let decimals = settings.amount_decimals as usize;
    let mut output = String::new();
    output.push_str(&format!(
        "# Donation Preview\n\nTotal: {:.decimals$} {}\n\n",
        total, settings.currency
    ));
    if allocations.is_empty() {
        output.push_str("- no eligible workers\n");
        return output;
    }
    for allocation in allocations {
        output.push_str(&format!(
            "- {}: {:.decimals$} {} ({:.2}%)",
            allocation.worker_id, allocation.amount, settings.currency, allocation.percentage
        ));
        if let Some(address) = &allocation.address {
            output.push_str(&format!(" -> {address}"));
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::ScoringPolicy;
    use crate::types::report::{DistributionShare, Finding};
    use crate::types::scoring::ImpactScore;
    use chrono::Utc;

    #[test]
    fn markdown_report_contains_sections() {
        let report = DistributionReport {
            evaluated_at: Utc::now(),
            policy: ScoringPolicy::default(),
            scores: vec![ImpactScore {
                worker_id: "hw-1".to_string(),
                score: 12.5,
                recency_factor: 1.0,
                flags: vec![],
            }],
            shares: vec![DistributionShare {
                worker_id: "hw-1".to_string(),
                percentage: 100.0,
            }],
            excluded: vec!["hw-2".to_string()],
            flags: vec![],
            findings: vec![Finding::warning(
                "roster.unverified_excluded",
                "Unverified workers excluded",
                "1 unverified worker(s) excluded from distribution: hw-2.",
            )],
            floor_relaxed: false,
            equal_split: false,
        };

        let rendered = to_markdown(&report);
        assert!(rendered.contains("# Donation Distribution"));
        assert!(rendered.contains("| hw-1 | 12.500 | 100.00% |"));
        assert!(rendered.contains("- hw-2 (unverified)"));
        assert!(rendered.contains("[warning] Unverified workers excluded"));
    }

    #[test]
    fn preview_lists_amounts_and_addresses() {
        let allocations = vec![DonationAllocation {
            worker_id: "hw-1".to_string(),
            address: Some("0xabc".to_string()),
            percentage: 100.0,
            amount: 2.0,
        }];
        let settings = DonationSettings {
            amount_decimals: 2,
            ..DonationSettings::default()
        };
        let rendered = preview_to_markdown(2.0, &allocations, &settings);
        assert!(rendered.contains("Total: 2.00 BNB"));
        assert!(rendered.contains("- hw-1: 2.00 BNB (100.00%) -> 0xabc"));
    }
}
