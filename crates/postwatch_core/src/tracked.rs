use std::collections::{HashMap, HashSet};

use url::Url;

use crate::{HistoryEntry, SeedEntry, TrackedItem};

pub const UNKNOWN_NAME: &str = "Unknown";

/// The ordered set of posts to process this run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackedSet {
    /// Seed order first, then history-only items in history order.
    pub items: Vec<TrackedItem>,
    /// Seed URLs dropped because an earlier row had the same identity.
    pub duplicate_seed_urls: Vec<String>,
    /// Stored rows sharing an identity with an earlier stored row. They are
    /// not processed and are written back as they were.
    pub shadowed_history: Vec<HistoryEntry>,
}

/// Identity key for a post URL: trimmed, fragment dropped, scheme and host
/// lowercased, trailing slash removed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}

/// Seed name wins when non-empty, then the stored name, then [`UNKNOWN_NAME`].
pub fn resolve_name(seed: Option<&str>, history: Option<&str>) -> String {
    [seed, history]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string()
}

/// Union of the seed list and the historical table, keyed by normalized URL.
pub fn build_tracked_set(seed: &[SeedEntry], history: &[HistoryEntry]) -> TrackedSet {
    // First stored row per identity, matching the prior-record lookup in the run loop.
    let mut history_by_key: HashMap<String, &HistoryEntry> =
        HashMap::with_capacity(history.len());
    for entry in history {
        history_by_key.entry(normalize_url(&entry.url)).or_insert(entry);
    }

    let mut seen = HashSet::new();
    let mut set = TrackedSet::default();

    for row in seed {
        let key = normalize_url(&row.url);
        if !seen.insert(key.clone()) {
            set.duplicate_seed_urls.push(row.url.clone());
            continue;
        }
        let stored = history_by_key.get(&key);
        set.items.push(TrackedItem {
            url: row.url.trim().to_string(),
            name_en: resolve_name(Some(&row.name_en), stored.map(|h| h.name_en.as_str())),
            name_kr: resolve_name(Some(&row.name_kr), stored.map(|h| h.name_kr.as_str())),
            initial_views: row.initial_views,
            date_accessed: row.date_accessed.clone(),
            key,
        });
    }

    let mut stored_keys = HashSet::new();
    for entry in history {
        let key = normalize_url(&entry.url);
        if !stored_keys.insert(key.clone()) {
            set.shadowed_history.push(entry.clone());
            continue;
        }
        if !seen.insert(key.clone()) {
            continue;
        }
        set.items.push(TrackedItem {
            url: entry.url.trim().to_string(),
            name_en: resolve_name(None, Some(&entry.name_en)),
            name_kr: resolve_name(None, Some(&entry.name_kr)),
            initial_views: 0,
            date_accessed: None,
            key,
        });
    }

    set
}
