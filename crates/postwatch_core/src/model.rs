use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Removed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Removed => "removed",
        }
    }

    /// Lenient parse used when loading stored rows.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Status::Active),
            "removed" | "deleted" => Some(Status::Removed),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted per-post state carried across runs.
///
/// `max_views >= current_views` holds while the record is `Active`. Once
/// `removed_date` is set on a `Removed` record it never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemRecord {
    pub status: Status,
    pub max_views: u64,
    pub current_views: u64,
    pub removed_date: Option<String>,
    /// Date of the most recent pass over this item; `None` before the first pass.
    pub last_updated: Option<String>,
    pub recs: u64,
    pub comments: u64,
    pub post_date: Option<String>,
    pub post_title: Option<String>,
}

/// One row of the externally maintained seed list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedEntry {
    pub url: String,
    pub name_en: String,
    pub name_kr: String,
    pub initial_views: u64,
    pub date_accessed: Option<String>,
}

/// One row of the historical table: display names plus the record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryEntry {
    pub url: String,
    pub name_en: String,
    pub name_kr: String,
    pub record: ItemRecord,
}

/// A post in the tracked set for this run, with names already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedItem {
    pub url: String,
    /// Normalized identity used to match seed rows against history rows.
    pub key: String,
    pub name_en: String,
    pub name_kr: String,
    /// Baseline count from the seed list; 0 for history-only items.
    pub initial_views: u64,
    /// When the seed baseline was read; `None` for history-only items.
    pub date_accessed: Option<String>,
}
