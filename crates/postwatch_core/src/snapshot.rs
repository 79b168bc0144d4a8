use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ItemRecord, Status, TrackedItem};

/// Presentation-facing view of one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name_en: String,
    pub name_kr: String,
    pub current_views: u64,
    pub max_views: u64,
    pub initial_views: u64,
    pub status: Status,
    pub post_date: Option<String>,
    pub post_title: Option<String>,
    pub recs: u64,
    pub comments: u64,
    pub url: String,
    pub removed_date: Option<String>,
    /// Date the seed baseline was read.
    pub last_accessed: Option<String>,
    pub last_updated: Option<String>,
    pub increase: i64,
    pub increase_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub total_items: usize,
    pub active_items: usize,
    pub removed_items: usize,
    pub total_views: u64,
    pub total_increase: i64,
    pub average_increase: f64,
    pub last_updated: String,
}

/// The derived document, keyed by English display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub items: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    /// Entries ordered by increase, largest first; ties by name.
    pub fn ranked_by_increase(&self) -> Vec<&SnapshotEntry> {
        let mut ranked: Vec<_> = self.items.values().collect();
        ranked.sort_by(|a, b| b.increase.cmp(&a.increase).then_with(|| a.name_en.cmp(&b.name_en)));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub snapshot: Snapshot,
    /// Display names that appeared more than once; the later item won.
    pub collisions: Vec<String>,
}

/// Rebuilds the snapshot from scratch out of the reconciled records.
pub fn project(records: &[(TrackedItem, ItemRecord)], generated_at: &str) -> Projection {
    let mut items = BTreeMap::new();
    let mut collisions = Vec::new();

    for (item, record) in records {
        let entry = build_entry(item, record);
        if items.insert(item.name_en.clone(), entry).is_some() {
            collisions.push(item.name_en.clone());
        }
    }

    let metadata = summarize(&items, generated_at);
    Projection {
        snapshot: Snapshot { metadata, items },
        collisions,
    }
}

fn build_entry(item: &TrackedItem, record: &ItemRecord) -> SnapshotEntry {
    // A removed post reports 0 current views; its growth is measured at the peak.
    let reference = match record.status {
        Status::Active => record.current_views,
        Status::Removed => record.max_views,
    };
    let increase = reference as i64 - item.initial_views as i64;
    let increase_percent = if item.initial_views > 0 {
        round2(increase as f64 / item.initial_views as f64 * 100.0)
    } else {
        0.0
    };

    SnapshotEntry {
        name_en: item.name_en.clone(),
        name_kr: item.name_kr.clone(),
        current_views: record.current_views,
        max_views: record.max_views,
        initial_views: item.initial_views,
        status: record.status,
        post_date: record.post_date.clone(),
        post_title: record.post_title.clone(),
        recs: record.recs,
        comments: record.comments,
        url: item.url.clone(),
        removed_date: record.removed_date.clone(),
        last_accessed: item.date_accessed.clone(),
        last_updated: record.last_updated.clone(),
        increase,
        increase_percent,
    }
}

fn summarize(items: &BTreeMap<String, SnapshotEntry>, generated_at: &str) -> SnapshotMetadata {
    let total_items = items.len();
    let removed_items = items.values().filter(|e| e.status == Status::Removed).count();
    let total_views = items.values().map(|e| e.current_views).sum();
    let total_increase: i64 = items.values().map(|e| e.increase).sum();
    let average_increase = if total_items > 0 {
        round2(total_increase as f64 / total_items as f64)
    } else {
        0.0
    };

    SnapshotMetadata {
        total_items,
        active_items: total_items - removed_items,
        removed_items,
        total_views,
        total_increase,
        average_increase,
        last_updated: generated_at.to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
