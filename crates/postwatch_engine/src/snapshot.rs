use std::path::{Path, PathBuf};

use postwatch_core::Snapshot;
use serde::Serialize;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode csv export: {0}")]
    Csv(#[from] csv::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Writes the snapshot document as pretty JSON, replacing any previous file.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<PathBuf, SnapshotError> {
    let mut json = serde_json::to_vec_pretty(snapshot)?;
    json.push(b'\n');
    Ok(AtomicFileWriter::new(path).write(&json)?)
}

#[derive(Debug, Serialize)]
struct CurrentRow<'a> {
    name: &'a str,
    korean_name: &'a str,
    status: &'static str,
    initial_count: u64,
    current_count: u64,
    max_count: u64,
    increase: i64,
    increase_percent: f64,
    recommendation_count: u64,
    comment_count: u64,
    post_date: &'a str,
    post_title: &'a str,
    removed_date: &'a str,
    last_accessed: &'a str,
    last_updated: &'a str,
    url: &'a str,
}

/// Writes one CSV row per snapshot entry, largest increase first.
pub fn write_current_csv(path: &Path, snapshot: &Snapshot) -> Result<PathBuf, SnapshotError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for entry in snapshot.ranked_by_increase() {
        writer.serialize(CurrentRow {
            name: &entry.name_en,
            korean_name: &entry.name_kr,
            status: entry.status.as_str(),
            initial_count: entry.initial_views,
            current_count: entry.current_views,
            max_count: entry.max_views,
            increase: entry.increase,
            increase_percent: entry.increase_percent,
            recommendation_count: entry.recs,
            comment_count: entry.comments,
            post_date: entry.post_date.as_deref().unwrap_or_default(),
            post_title: entry.post_title.as_deref().unwrap_or_default(),
            removed_date: entry.removed_date.as_deref().unwrap_or_default(),
            last_accessed: entry.last_accessed.as_deref().unwrap_or_default(),
            last_updated: entry.last_updated.as_deref().unwrap_or_default(),
            url: &entry.url,
        })?;
    }
    let bytes = writer.into_inner().map_err(|err| {
        csv::Error::from(std::io::Error::new(err.error().kind(), err.to_string()))
    })?;
    Ok(AtomicFileWriter::new(path).write(&bytes)?)
}
