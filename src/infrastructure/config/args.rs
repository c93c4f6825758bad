//! Command-line arguments.

use super::app_config::LogLevel;
use crate::infrastructure::reader::SimulatedOutcome;
use clap::Parser;
use std::path::PathBuf;

/// Flags overriding `config.toml`.
#[derive(Debug, Parser)]
#[command(
    name = "mizpos-terminal",
    version,
    about = "Card payment terminal for the mizpos POS",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Name reported to the POS.
    #[arg(long, env = "MIZPOS_TERMINAL_NAME")]
    pub terminal_name: Option<String>,

    /// Simulated reader latency in milliseconds.
    #[arg(long)]
    pub latency_ms: Option<u64>,

    /// Simulated reader outcome.
    #[arg(long, value_enum)]
    pub outcome: Option<SimulatedOutcome>,

    /// Load the initial payment request from a JSON file.
    #[arg(long, value_name = "PATH")]
    pub request: Option<PathBuf>,

    /// Amount of the demo request, in minor units.
    #[arg(long)]
    pub amount: Option<u64>,

    /// Currency of the demo request.
    #[arg(long)]
    pub currency: Option<String>,
}
