use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use postwatch_core::{
    build_tracked_set, normalize_url, project, reconcile, CarryReason, HistoryEntry, ItemRecord,
    ReconcileContext, TrackedItem, Transition, ZeroViewsPolicy,
};
use thiserror::Error;
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::{
    classify, write_current_csv, write_snapshot, EngineEvent, FetchSettings, Fetcher, ItemProgress,
    OutcomeKind, PostExtractor, ProgressSink, RecordStore, SnapshotError, StoreError,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub seed_path: PathBuf,
    pub history_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub current_csv_path: Option<PathBuf>,
    /// Pause between two consecutive fetches.
    pub request_delay: Duration,
    pub fetch: FetchSettings,
    pub zero_views: ZeroViewsPolicy,
}

impl EngineConfig {
    pub fn with_paths(
        seed_path: impl Into<PathBuf>,
        history_path: impl Into<PathBuf>,
        snapshot_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            seed_path: seed_path.into(),
            history_path: history_path.into(),
            snapshot_path: snapshot_path.into(),
            current_csv_path: None,
            request_delay: Duration::from_secs(1),
            fetch: FetchSettings::default(),
            zero_views: ZeroViewsPolicy::default(),
        }
    }
}

/// Clock readings captured once at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
    /// `YYYY-MM-DD`, written to `last_updated` and `removed_date`.
    pub date: String,
    /// Written to the snapshot metadata.
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub observed: usize,
    pub newly_removed: usize,
    pub still_removed: usize,
    pub failed: usize,
    pub carried_over: usize,
    pub snapshot_entries: usize,
    pub snapshot_collisions: usize,
}

impl RunSummary {
    fn count(&mut self, transition: &Transition) {
        match transition {
            Transition::Observed { .. } => self.observed += 1,
            Transition::NewlyRemoved(_) => self.newly_removed += 1,
            Transition::StillRemoved(_) => self.still_removed += 1,
            Transition::CarriedOver(CarryReason::FetchFailed(_)) => self.failed += 1,
            Transition::CarriedOver(_) => self.carried_over += 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("record store: {0}")]
    Store(#[from] StoreError),
    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Processes every tracked post once, in order, then persists the history
/// table and rebuilds the snapshot.
///
/// Per-item failures are contained: the item's record is carried over and the
/// pass moves on. Only store and snapshot IO abort the run, and the history
/// table is written after all items are done, so an aborted run leaves it as
/// it was.
pub async fn run_pass(
    config: &EngineConfig,
    stamp: &RunStamp,
    fetcher: &dyn Fetcher,
    extractor: &dyn PostExtractor,
    sink: &dyn ProgressSink,
) -> Result<RunSummary, RunError> {
    let store = RecordStore::new(&config.seed_path, &config.history_path);
    let seed = store.load_seed()?;
    let history = store.load_history()?;

    let tracked = build_tracked_set(&seed, &history.entries);
    for url in &tracked.duplicate_seed_urls {
        watch_warn!("Duplicate seed url {} ignored", url);
    }
    for entry in &tracked.shadowed_history {
        watch_warn!("Stored row for {} repeats an earlier row; written back unchanged", entry.url);
    }
    // First stored row per identity, matching the tracked set.
    let mut prior: HashMap<String, &ItemRecord> = HashMap::with_capacity(history.entries.len());
    for entry in &history.entries {
        prior.entry(normalize_url(&entry.url)).or_insert(&entry.record);
    }

    let ctx = ReconcileContext {
        today: &stamp.date,
        zero_views: config.zero_views,
    };
    let total = tracked.items.len();
    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    watch_info!(
        "Processing {} tracked posts (zero-views policy: {})",
        total,
        config.zero_views
    );

    let mut results: Vec<(TrackedItem, ItemRecord)> = Vec::with_capacity(total);
    for (index, item) in tracked.items.into_iter().enumerate() {
        if index > 0 && !config.request_delay.is_zero() {
            tokio::time::sleep(config.request_delay).await;
        }

        let progress = ItemProgress {
            index: index + 1,
            total,
            url: item.url.clone(),
            name: item.name_en.clone(),
        };
        sink.emit(EngineEvent::ItemStarted(progress.clone()));
        watch_info!(
            "Processing {}/{}: {} ({})",
            index + 1,
            total,
            item.name_en,
            item.name_kr
        );

        let outcome = classify(fetcher.fetch(&item.url).await, &config.fetch, extractor);
        let reconciled = reconcile(prior.get(&item.key).copied(), &outcome, &ctx);
        log_transition(&item, &reconciled.record, &reconciled.transition);
        summary.count(&reconciled.transition);

        sink.emit(EngineEvent::ItemFinished {
            progress,
            outcome: OutcomeKind::from_transition(&reconciled.transition),
        });
        results.push((item, reconciled.record));
    }

    // Processed rows first, then stored rows that were not processed.
    let entries: Vec<HistoryEntry> = results
        .iter()
        .map(|(item, record)| HistoryEntry {
            url: item.url.clone(),
            name_en: item.name_en.clone(),
            name_kr: item.name_kr.clone(),
            record: record.clone(),
        })
        .chain(tracked.shadowed_history.iter().cloned())
        .collect();
    store.persist_history(&entries, &history.unkeyed)?;

    let projection = project(&results, &stamp.timestamp);
    for name in &projection.collisions {
        watch_warn!("Snapshot name collision on '{}'; later post kept", name);
    }
    let path = write_snapshot(&config.snapshot_path, &projection.snapshot)?;
    watch_info!("Snapshot written to {:?}", path);
    if let Some(csv_path) = &config.current_csv_path {
        let path = write_current_csv(csv_path, &projection.snapshot)?;
        watch_info!("Current CSV written to {:?}", path);
    }

    summary.snapshot_entries = projection.snapshot.items.len();
    summary.snapshot_collisions = projection.collisions.len();
    Ok(summary)
}

fn log_transition(item: &TrackedItem, record: &ItemRecord, transition: &Transition) {
    match transition {
        Transition::Observed { previous_max, views } => watch_info!(
            "  {}: {} views (max {} -> {}, recs {}, comments {})",
            item.url,
            views,
            previous_max,
            record.max_views,
            record.recs,
            record.comments
        ),
        Transition::NewlyRemoved(cause) => {
            watch_info!("  {}: marked removed ({})", item.url, cause)
        }
        Transition::StillRemoved(cause) => watch_debug!(
            "  {}: still removed since {} ({})",
            item.url,
            record.removed_date.as_deref().unwrap_or("?"),
            cause
        ),
        Transition::CarriedOver(CarryReason::FetchFailed(cause)) => {
            watch_warn!("  {}: fetch failed ({}); record carried over", item.url, cause)
        }
        Transition::CarriedOver(CarryReason::SuspiciousZeroViews) => watch_warn!(
            "  {}: page reported 0 views with no other fields; record carried over",
            item.url
        ),
        Transition::CarriedOver(CarryReason::RemovedIsSticky) => watch_warn!(
            "  {}: removed post answered with a live page; keeping removed status",
            item.url
        ),
    }
}
