use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "flameborn",
    version,
    about = "Impact scoring and equitable donation distribution for healthcare workers"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory holding flameborn.toml
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    /// Evaluation time (RFC 3339); defaults to now
    #[arg(long, global = true)]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the impact score of every verified worker
    Score(ScoreCommand),
    /// Compute donation shares for every verified worker
    Distribute(DistributeCommand),
    /// Split a donation amount across verified workers
    Preview(PreviewCommand),
    /// Validate configuration and roster and report findings
    Check(CheckCommand),
}

#[derive(Args)]
pub struct ScoreCommand {
    pub roster: PathBuf,
}

#[derive(Args)]
pub struct DistributeCommand {
    pub roster: PathBuf,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct PreviewCommand {
    pub roster: PathBuf,
    #[arg(long, allow_negative_numbers = true)]
    pub amount: f64,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct CheckCommand {
    pub roster: PathBuf,
}

#[derive(Clone, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
}
