mod cli;
mod config;

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone};
use clap::Parser;
use postwatch_engine::{run_pass, EngineEvent, ProgressSink, ReqwestFetcher, RunStamp};
use watch_logging::{watch_debug, watch_error, watch_info};

use crate::cli::Cli;
use crate::config::AppConfig;

/// Progress events go to the debug log; the engine already logs outcomes.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::ItemFinished { progress, outcome } = event {
            watch_debug!(
                "[{}/{}] {} -> {:?}",
                progress.index,
                progress.total,
                progress.name,
                outcome
            );
        }
    }
}

fn run_stamp<Tz: TimeZone>(now: &DateTime<Tz>) -> RunStamp
where
    Tz::Offset: std::fmt::Display,
{
    RunStamp {
        date: now.format("%Y-%m-%d").to_string(),
        timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    let level = config.log.level_filter()?;
    watch_logging::initialize(&config.log.destination(), level);

    let engine_config = config.engine_config()?;
    let extractor = config.extractor();
    let fetcher = ReqwestFetcher::new(engine_config.fetch.clone());
    let stamp = run_stamp(&Local::now());
    watch_info!(
        "Run {}: seed {:?}, history {:?}, snapshot {:?}",
        stamp.timestamp,
        engine_config.seed_path,
        engine_config.history_path,
        engine_config.snapshot_path
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;
    let summary = runtime
        .block_on(run_pass(&engine_config, &stamp, &fetcher, &extractor, &LogProgress))
        .inspect_err(|err| watch_error!("Run aborted: {}", err))
        .context("update pass failed")?;

    watch_info!(
        "Done: {} posts, {} observed, {} newly removed, {} still removed, {} failed, {} carried over",
        summary.total,
        summary.observed,
        summary.newly_removed,
        summary.still_removed,
        summary.failed,
        summary.carried_over
    );
    watch_info!(
        "Snapshot holds {} entries ({} name collisions)",
        summary.snapshot_entries,
        summary.snapshot_collisions
    );
    Ok(())
}
