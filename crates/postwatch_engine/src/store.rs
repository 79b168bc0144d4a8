use std::io;
use std::path::{Path, PathBuf};

use postwatch_core::{HistoryEntry, ItemRecord, SeedEntry, Status};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use watch_logging::{watch_info, watch_warn};

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
}

/// Seed list row as maintained by hand. Header names follow the original sheet.
#[derive(Debug, Default, Deserialize)]
struct SeedRow {
    #[serde(default, alias = "name_en")]
    english_name: String,
    #[serde(default, alias = "name_kr")]
    korean_name: String,
    #[serde(default)]
    url: String,
    #[serde(default, alias = "initial_views")]
    initial_count: String,
    #[serde(default)]
    date_accessed: String,
}

/// Historical table row. Every column is text so damaged values can be
/// coerced instead of failing the whole load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct HistoryRow {
    english_name: String,
    korean_name: String,
    url: String,
    status: String,
    max_views: String,
    current_views: String,
    removed_date: String,
    last_updated: String,
    recs: String,
    comments: String,
    post_date: String,
    post_title: String,
}

impl HistoryRow {
    /// Maps fields by header name; unknown columns are ignored and missing
    /// ones read as empty. Invalid UTF-8 is replaced rather than rejected.
    fn from_record(headers: &[String], record: &csv::ByteRecord) -> Self {
        let mut row = HistoryRow::default();
        for (header, raw) in headers.iter().zip(record.iter()) {
            let value = String::from_utf8_lossy(raw).into_owned();
            let slot = match header.as_str() {
                "english_name" | "name_en" => &mut row.english_name,
                "korean_name" | "name_kr" => &mut row.korean_name,
                "url" => &mut row.url,
                "status" => &mut row.status,
                "max_views" => &mut row.max_views,
                "current_views" => &mut row.current_views,
                "removed_date" => &mut row.removed_date,
                "last_updated" => &mut row.last_updated,
                "recs" => &mut row.recs,
                "comments" => &mut row.comments,
                "post_date" => &mut row.post_date,
                "post_title" => &mut row.post_title,
                _ => continue,
            };
            *slot = value;
        }
        row
    }
}

/// A stored row that has no URL and so cannot be tracked. It is written back
/// exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnkeyedRow(HistoryRow);

impl UnkeyedRow {
    pub fn name_en(&self) -> &str {
        &self.0.english_name
    }
}

/// Contents of the historical table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryTable {
    pub entries: Vec<HistoryEntry>,
    pub unkeyed: Vec<UnkeyedRow>,
}

/// CSV-backed seed list (read-only) and historical table.
#[derive(Debug, Clone)]
pub struct RecordStore {
    seed_path: PathBuf,
    history_path: PathBuf,
}

impl RecordStore {
    pub fn new(seed_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            seed_path: seed_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Loads the seed list. A missing or unreadable file is fatal.
    pub fn load_seed(&self) -> Result<Vec<SeedEntry>, StoreError> {
        let path = &self.seed_path;
        let rows: Vec<SeedRow> = read_rows(path)?;

        let mut entries = Vec::with_capacity(rows.len());
        for (line, row) in rows.into_iter().enumerate() {
            let url = row.url.trim().to_string();
            if url.is_empty() {
                watch_warn!("Seed row {} in {:?} has no url; skipped", line + 1, path);
                continue;
            }
            entries.push(SeedEntry {
                initial_views: parse_count(&row.initial_count, "initial_count", &url),
                name_en: row.english_name.trim().to_string(),
                name_kr: row.korean_name.trim().to_string(),
                date_accessed: non_empty(&row.date_accessed),
                url,
            });
        }

        watch_info!("Loaded {} seed rows from {:?}", entries.len(), path);
        Ok(entries)
    }

    /// Loads the historical table. A missing file is a first run and yields no rows.
    ///
    /// No stored row is ever dropped: damaged values are coerced, and rows
    /// without a URL come back as [`UnkeyedRow`]s to be written back as-is.
    /// Only an unreadable file is an error.
    pub fn load_history(&self) -> Result<HistoryTable, StoreError> {
        let path = &self.history_path;
        if !path.exists() {
            watch_info!("No history at {:?}; starting fresh", path);
            return Ok(HistoryTable::default());
        }

        let read_err = |source: csv::Error| StoreError::Read {
            path: path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(read_err)?;
        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(read_err)?
            .iter()
            .map(|h| {
                let header = String::from_utf8_lossy(h);
                header.trim_start_matches('\u{feff}').trim().to_string()
            })
            .collect();

        let mut table = HistoryTable::default();
        for (line, record) in reader.byte_records().enumerate() {
            let row = HistoryRow::from_record(&headers, &record.map_err(read_err)?);
            match history_entry(&row) {
                Some(entry) => table.entries.push(entry),
                None => {
                    watch_warn!(
                        "History row {} in {:?} has no url; kept as-is but not tracked",
                        line + 1,
                        path
                    );
                    table.unkeyed.push(UnkeyedRow(row));
                }
            }
        }

        watch_info!(
            "Loaded {} history rows from {:?} ({} without url)",
            table.entries.len(),
            path,
            table.unkeyed.len()
        );
        Ok(table)
    }

    /// Replaces the whole historical table atomically. Unkeyed rows follow the
    /// entries unchanged.
    pub fn persist_history(
        &self,
        entries: &[HistoryEntry],
        unkeyed: &[UnkeyedRow],
    ) -> Result<(), StoreError> {
        let path = &self.history_path;
        let encode_err = |source: csv::Error| StoreError::Encode {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        let rows = entries
            .iter()
            .map(history_row)
            .chain(unkeyed.iter().map(|row| row.0.clone()));
        for row in rows {
            writer.serialize(row).map_err(encode_err)?;
        }
        let bytes = writer.into_inner().map_err(|err| {
            encode_err(io::Error::new(err.error().kind(), err.to_string()).into())
        })?;

        AtomicFileWriter::new(path.clone())
            .write(&bytes)
            .map_err(|source| StoreError::Persist {
                path: path.clone(),
                source,
            })?;

        watch_info!(
            "Persisted {} history rows to {:?}",
            entries.len() + unkeyed.len(),
            path
        );
        Ok(())
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StoreError> {
    let read_err = |source: csv::Error| StoreError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(read_err)?;

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) if err.is_io_error() => return Err(read_err(err)),
            Err(err) => watch_warn!("Row {} in {:?} could not be decoded: {}", line + 1, path, err),
        }
    }
    Ok(rows)
}

fn history_entry(row: &HistoryRow) -> Option<HistoryEntry> {
    let url = row.url.trim().to_string();
    if url.is_empty() {
        return None;
    }
    let removed_date = non_empty(&row.removed_date);

    let mut record = ItemRecord {
        status: parse_status(&row.status, removed_date.is_some(), &url),
        max_views: parse_count(&row.max_views, "max_views", &url),
        current_views: parse_count(&row.current_views, "current_views", &url),
        removed_date,
        last_updated: non_empty(&row.last_updated),
        recs: parse_count(&row.recs, "recs", &url),
        comments: parse_count(&row.comments, "comments", &url),
        post_date: non_empty(&row.post_date),
        post_title: non_empty(&row.post_title),
    };
    if record.status == Status::Active && record.current_views > record.max_views {
        watch_warn!(
            "History row for {} has current_views {} above max_views {}; raising max",
            url,
            record.current_views,
            record.max_views
        );
        record.max_views = record.current_views;
    }

    Some(HistoryEntry {
        name_en: row.english_name.trim().to_string(),
        name_kr: row.korean_name.trim().to_string(),
        url,
        record,
    })
}

fn history_row(entry: &HistoryEntry) -> HistoryRow {
    let record = &entry.record;
    HistoryRow {
        english_name: entry.name_en.clone(),
        korean_name: entry.name_kr.clone(),
        url: entry.url.clone(),
        status: record.status.to_string(),
        max_views: record.max_views.to_string(),
        current_views: record.current_views.to_string(),
        removed_date: record.removed_date.clone().unwrap_or_default(),
        last_updated: record.last_updated.clone().unwrap_or_default(),
        recs: record.recs.to_string(),
        comments: record.comments.to_string(),
        post_date: record.post_date.clone().unwrap_or_default(),
        post_title: record.post_title.clone().unwrap_or_default(),
    }
}

/// Empty reads as `Active`. An unrecognised value falls back to `Removed`
/// when a removal date is stored, else `Active`.
fn parse_status(raw: &str, has_removed_date: bool, url: &str) -> Status {
    if raw.trim().is_empty() {
        return Status::Active;
    }
    if let Some(status) = Status::parse(raw) {
        return status;
    }
    let fallback = if has_removed_date {
        Status::Removed
    } else {
        Status::Active
    };
    watch_warn!("Unknown status '{}' for {}; treating as {}", raw, url, fallback);
    fallback
}

/// Empty reads as 0; anything else unparsable is coerced to 0 with a warning.
fn parse_count(raw: &str, field: &str, url: &str) -> u64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return 0;
    }
    match cleaned.parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            watch_warn!("Unparsable {} '{}' for {}; using 0", field, raw, url);
            0
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
