mod cli;

use chrono::{DateTime, Utc};
use clap::Parser;
use flameborn::error::FlamebornError;
use flameborn::logging::{init_logging, Verbosity};
use flameborn::registry::{JsonRoster, WorkerRegistry};
use flameborn::report::OutputFormat;
use flameborn::types::config::FlamebornConfig;
use flameborn::types::report::Finding;
use flameborn::{allocation, config, plan, report, scoring};
use std::path::Path;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const WARNINGS: i32 = 1;
    pub const BLOCKING: i32 = 2;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn run() -> Result<i32, FlamebornError> {
    let cli = cli::Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));

    let now = evaluation_time(cli.now.as_deref())?;
    let loaded = load_or_default(&cli.config_dir)?;
    let missing_config = loaded.is_none();
    let cfg = loaded.unwrap_or_default();
    let policy = cfg.scoring_policy();

    match cli.command {
        cli::Commands::Score(cmd) => {
            let workers = JsonRoster::new(&cmd.roster).snapshot()?;
            let verified = workers
                .iter()
                .filter(|worker| worker.is_verified)
                .collect::<Vec<_>>();
            if verified.is_empty() {
                println!("score: no verified workers");
                return Ok(exit_code::BLOCKING);
            }
            for worker in verified {
                let scored = scoring::score_worker(worker, now, &policy);
                println!(
                    "{}\t{:.3}\trecency {:.3}",
                    scored.worker_id, scored.score, scored.recency_factor
                );
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Distribute(cmd) => {
            let workers = JsonRoster::new(&cmd.roster).snapshot()?;
            let distribution = plan::plan_distribution(&workers, now, &policy);
            let rendered = report::render(&distribution, output_format(&cmd.format))?;
            println!("{rendered}");

            if distribution.has_blocking() {
                Ok(exit_code::BLOCKING)
            } else if missing_config || !distribution.findings.is_empty() {
                Ok(exit_code::WARNINGS)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
        cli::Commands::Preview(cmd) => {
            let settings = cfg.donation_settings();
            let workers = JsonRoster::new(&cmd.roster).snapshot()?;
            let distribution = plan::plan_distribution(&workers, now, &policy);
            let allocations =
                allocation::preview_donation(cmd.amount, &distribution.shares, &workers, &settings)?;
            let rendered =
                report::render_preview(cmd.amount, &allocations, &settings, output_format(&cmd.format))?;
            println!("{rendered}");

            if allocations.is_empty() {
                Ok(exit_code::BLOCKING)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }
        cli::Commands::Check(cmd) => {
            let workers = JsonRoster::new(&cmd.roster).snapshot()?;
            let distribution = plan::plan_distribution(&workers, now, &policy);
            let mut findings = plan::roster_findings(&workers);
            findings.extend(distribution.findings);
            if missing_config {
                findings.push(Finding::warning(
                    "config.missing",
                    "Configuration file missing",
                    format!(
                        "No {} found in {}; built-in defaults are in use.",
                        config::DEFAULT_CONFIG_FILE,
                        cli.config_dir.display()
                    ),
                ));
            }

            if findings.is_empty() {
                println!("check: no findings");
                return Ok(exit_code::SUCCESS);
            }

            for finding in &findings {
                let level = if finding.blocking { "BLOCKING" } else { "WARN" };
                println!("[{}] {}: {}", level, finding.id, finding.title);
                println!("  {}", finding.body);
            }

            if findings.iter().any(|finding| finding.blocking) {
                Ok(exit_code::BLOCKING)
            } else {
                Ok(exit_code::WARNINGS)
            }
        }
    }
}

fn load_or_default(dir: &Path) -> Result<Option<FlamebornConfig>, FlamebornError> {
    let loaded = config::load_config(dir)?;
    if loaded.is_none() {
        eprintln!(
            "warning: no {} found in {}, using defaults",
            config::DEFAULT_CONFIG_FILE,
            dir.display()
        );
    }
    Ok(loaded)
}

fn evaluation_time(raw: Option<&str>) -> Result<DateTime<Utc>, FlamebornError> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| FlamebornError::InvalidTimestamp(format!("{raw}: {e}"))),
        None => Ok(Utc::now()),
    }
}

fn output_format(format: &cli::ReportFormat) -> OutputFormat {
    match format {
        cli::ReportFormat::Json => OutputFormat::Json,
        cli::ReportFormat::Md => OutputFormat::Md,
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(exit_code::RUNTIME_FAILURE);
        }
    }
}
