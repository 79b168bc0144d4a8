use std::path::PathBuf;

use clap::{ArgAction, Parser};
use postwatch_core::ZeroViewsPolicy;

use crate::config::{AppConfig, LogTarget};

/// Track view counts of forum posts and record when posts disappear.
#[derive(Debug, Parser)]
#[command(name = "postwatch", version, about)]
pub struct Cli {
    /// RON config file. Defaults to ./postwatch.ron when present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed list CSV.
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Historical table CSV, rewritten at the end of the run.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Snapshot JSON output.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Also write a CSV of the snapshot ranked by increase.
    #[arg(long)]
    pub current_csv: Option<PathBuf>,

    /// Pause between requests, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// trust-when-corroborated, treat-as-removed or always-trust.
    #[arg(long)]
    pub zero_views_policy: Option<ZeroViewsPolicy>,

    /// Log to this file as well as the terminal.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Command line flags win over the config file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.seed {
            config.seed_path = path.clone();
        }
        if let Some(path) = &self.history {
            config.history_path = path.clone();
        }
        if let Some(path) = &self.snapshot {
            config.snapshot_path = path.clone();
        }
        if let Some(path) = &self.current_csv {
            config.current_csv_path = Some(path.clone());
        }
        if let Some(delay) = self.delay_ms {
            config.request_delay_ms = delay;
        }
        if let Some(policy) = self.zero_views_policy {
            config.zero_views_policy = policy.to_string();
        }
        if let Some(path) = &self.log_file {
            config.log.file = path.clone();
            config.log.target = LogTarget::Both;
        }
        match self.verbose {
            0 => {}
            1 => config.log.level = "debug".to_string(),
            _ => config.log.level = "trace".to_string(),
        }
    }
}
