use postwatch_core::{
    build_tracked_set, resolve_name, HistoryEntry, ItemRecord, SeedEntry, Status, UNKNOWN_NAME,
};
use pretty_assertions::assert_eq;

fn seed(url: &str, name_en: &str, name_kr: &str, initial: u64) -> SeedEntry {
    SeedEntry {
        url: url.to_string(),
        name_en: name_en.to_string(),
        name_kr: name_kr.to_string(),
        initial_views: initial,
        date_accessed: Some("2025-03-01".to_string()),
    }
}

fn history(url: &str, name_en: &str, name_kr: &str) -> HistoryEntry {
    HistoryEntry {
        url: url.to_string(),
        name_en: name_en.to_string(),
        name_kr: name_kr.to_string(),
        record: ItemRecord {
            status: Status::Active,
            max_views: 10,
            current_views: 10,
            ..ItemRecord::default()
        },
    }
}

#[test]
fn seed_order_comes_first_then_history_only_items() {
    watch_logging::initialize_for_tests();
    let seed_rows = vec![
        seed("https://g.example.com/view?no=2", "Beta", "베타", 20),
        seed("https://g.example.com/view?no=1", "Alpha", "알파", 10),
    ];
    let history_rows = vec![
        history("https://g.example.com/view?no=9", "Omega", "오메가"),
        history("https://g.example.com/view?no=1", "Alpha Old", "알파"),
        history("https://g.example.com/view?no=5", "Epsilon", "엡실론"),
    ];

    let set = build_tracked_set(&seed_rows, &history_rows);
    let names: Vec<_> = set.items.iter().map(|i| i.name_en.as_str()).collect();

    assert_eq!(names, vec!["Beta", "Alpha", "Omega", "Epsilon"]);
    assert_eq!(set.items[0].date_accessed.as_deref(), Some("2025-03-01"));
    assert_eq!(set.items[2].date_accessed, None);
    assert_eq!(set.items[2].initial_views, 0);
    assert!(set.duplicate_seed_urls.is_empty());
}

#[test]
fn names_prefer_seed_then_history_then_unknown() {
    let seed_rows = vec![
        seed("https://g.example.com/view?no=1", "", "  ", 10),
        seed("https://g.example.com/view?no=2", "", "", 10),
    ];
    let history_rows = vec![history("https://g.example.com/view?no=1", "Stored", "저장")];

    let set = build_tracked_set(&seed_rows, &history_rows);

    assert_eq!(set.items[0].name_en, "Stored");
    assert_eq!(set.items[0].name_kr, "저장");
    assert_eq!(set.items[1].name_en, UNKNOWN_NAME);
    assert_eq!(set.items[1].name_kr, UNKNOWN_NAME);
}

#[test]
fn resolve_name_trims_candidates() {
    assert_eq!(resolve_name(Some("  Seed  "), Some("Hist")), "Seed");
    assert_eq!(resolve_name(None, Some(" Hist ")), "Hist");
    assert_eq!(resolve_name(Some(""), None), UNKNOWN_NAME);
}

#[test]
fn url_variants_match_one_identity() {
    let seed_rows = vec![
        seed("https://G.example.com/view?no=1", "Alpha", "알파", 10),
        seed("https://g.example.com/view?no=1#comments", "Alpha Again", "알파", 99),
    ];
    let history_rows = vec![history(" https://g.example.com/view?no=1 ", "Alpha", "알파")];

    let set = build_tracked_set(&seed_rows, &history_rows);

    assert_eq!(set.items.len(), 1);
    assert_eq!(set.items[0].initial_views, 10);
    assert_eq!(
        set.duplicate_seed_urls,
        vec!["https://g.example.com/view?no=1#comments".to_string()]
    );
}

#[test]
fn first_stored_row_wins_and_later_duplicates_are_kept_aside() {
    let seed_rows = vec![seed("https://g.example.com/view?no=1", "", "", 10)];
    let mut later = history("https://g.example.com/view?no=1/", "Second", "둘");
    later.record.max_views = 999;
    let history_rows = vec![
        history("https://g.example.com/view?no=1", "First", "하나"),
        later.clone(),
        history("https://g.example.com/view?no=7", "Seven", "칠"),
        history("https://g.example.com/view?no=7#top", "Seven Again", "칠"),
    ];

    let set = build_tracked_set(&seed_rows, &history_rows);

    let names: Vec<_> = set.items.iter().map(|i| i.name_en.as_str()).collect();
    assert_eq!(names, vec!["First", "Seven"]);
    assert_eq!(set.shadowed_history.len(), 2);
    assert_eq!(set.shadowed_history[0], later);
    assert_eq!(set.shadowed_history[1].name_en, "Seven Again");
}

#[test]
fn empty_inputs_yield_empty_set() {
    let set = build_tracked_set(&[], &[]);
    assert!(set.items.is_empty());
    assert!(set.shadowed_history.is_empty());
}
