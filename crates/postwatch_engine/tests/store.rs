use std::fs;

use postwatch_core::{HistoryEntry, ItemRecord, SeedEntry, Status};
use postwatch_engine::{HistoryTable, RecordStore, StoreError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn store_in(temp: &TempDir) -> RecordStore {
    RecordStore::new(temp.path().join("seed.csv"), temp.path().join("history.csv"))
}

#[test]
fn seed_rows_load_in_order_and_skip_missing_urls() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("seed.csv"),
        "english_name,korean_name,url,initial_count,date_accessed\n\
         Alice, 앨리스 ,https://g.example/board/view/?id=x&no=1,\"1,200\",2024-11-01\n\
         Nameless,,   ,5,\n\
         Bob,밥,https://g.example/board/view/?id=x&no=2,,\n",
    )
    .unwrap();

    let seed = store_in(&temp).load_seed().unwrap();

    assert_eq!(
        seed,
        vec![
            SeedEntry {
                url: "https://g.example/board/view/?id=x&no=1".to_string(),
                name_en: "Alice".to_string(),
                name_kr: "앨리스".to_string(),
                initial_views: 1200,
                date_accessed: Some("2024-11-01".to_string()),
            },
            SeedEntry {
                url: "https://g.example/board/view/?id=x&no=2".to_string(),
                name_en: "Bob".to_string(),
                name_kr: "밥".to_string(),
                initial_views: 0,
                date_accessed: None,
            },
        ]
    );
}

#[test]
fn seed_accepts_short_header_names() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("seed.csv"),
        "name_en,name_kr,url,initial_views\nCara,카라,https://g.example/p/3,40\n",
    )
    .unwrap();

    let seed = store_in(&temp).load_seed().unwrap();
    assert_eq!(seed.len(), 1);
    assert_eq!(seed[0].name_en, "Cara");
    assert_eq!(seed[0].name_kr, "카라");
    assert_eq!(seed[0].initial_views, 40);
}

#[test]
fn missing_seed_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = store_in(&temp).load_seed().unwrap_err();
    assert!(matches!(err, StoreError::Read { .. }));
}

#[test]
fn missing_history_is_an_empty_table() {
    let temp = TempDir::new().unwrap();
    assert_eq!(store_in(&temp).load_history().unwrap(), HistoryTable::default());
}

#[test]
fn history_rows_are_coerced_never_dropped() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("history.csv"),
        "english_name,korean_name,url,status,max_views,current_views,removed_date,last_updated\n\
         A,에이,https://g.example/p/1,active,400,500,,2025-01-01\n\
         B,비,https://g.example/p/2,deleted,90,0,2025-01-02,2025-01-03\n\
         C,씨,https://g.example/p/3,archived,1,1,,\n\
         D,디,,active,1,1,,\n\
         E,이,https://g.example/p/5,,\"2,000\",abc,,\n\
         F,에프,https://g.example/p/6,gone?,80,0,2024-12-24,2025-01-03\n\
         G,지,https://g.example/p/7,active\n",
    )
    .unwrap();

    let table = store_in(&temp).load_history().unwrap();
    let urls: Vec<&str> = table.entries.iter().map(|entry| entry.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://g.example/p/1",
            "https://g.example/p/2",
            "https://g.example/p/3",
            "https://g.example/p/5",
            "https://g.example/p/6",
            "https://g.example/p/7",
        ]
    );
    assert_eq!(table.unkeyed.len(), 1);
    assert_eq!(table.unkeyed[0].name_en(), "D");

    let a = &table.entries[0].record;
    assert_eq!(a.status, Status::Active);
    assert_eq!(a.max_views, 500);
    assert_eq!(a.current_views, 500);
    assert_eq!(a.last_updated.as_deref(), Some("2025-01-01"));
    assert_eq!(a.removed_date, None);

    let b = &table.entries[1].record;
    assert_eq!(b.status, Status::Removed);
    assert_eq!(b.max_views, 90);
    assert_eq!(b.removed_date.as_deref(), Some("2025-01-02"));

    // Unknown status without a removal date reads as active, counts kept.
    let c = &table.entries[2].record;
    assert_eq!(c.status, Status::Active);
    assert_eq!((c.max_views, c.current_views), (1, 1));

    let e = &table.entries[3].record;
    assert_eq!(e.status, Status::Active);
    assert_eq!(e.max_views, 2000);
    assert_eq!(e.current_views, 0);
    assert_eq!(e.post_title, None);

    // Unknown status with a removal date reads as removed.
    let f = &table.entries[4].record;
    assert_eq!(f.status, Status::Removed);
    assert_eq!(f.max_views, 80);
    assert_eq!(f.removed_date.as_deref(), Some("2024-12-24"));

    // Short row: missing columns read as empty.
    let g = &table.entries[5];
    assert_eq!(g.name_en, "G");
    assert_eq!(g.record.max_views, 0);
}

#[test]
fn rows_without_url_are_written_back_verbatim() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    fs::write(
        store.history_path(),
        "english_name,korean_name,url,status,max_views,current_views,removed_date,last_updated,\
         recs,comments,post_date,post_title\n\
         A,에이,https://g.example/p/1,active,10,10,,2025-01-01,0,0,,\n\
         Orphan,고아,,weird,12x,7,,2024-10-10,1,,,Lost title\n",
    )
    .unwrap();

    let table = store.load_history().unwrap();
    store.persist_history(&table.entries, &table.unkeyed).unwrap();

    let raw = fs::read_to_string(store.history_path()).unwrap();
    assert!(raw.ends_with("Orphan,고아,,weird,12x,7,,2024-10-10,1,,,Lost title\n"));
    assert_eq!(store.load_history().unwrap(), table);
}

#[test]
fn persisted_history_reloads_unchanged() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    let entries = vec![
        HistoryEntry {
            url: "https://g.example/p/1".to_string(),
            name_en: "Alice".to_string(),
            name_kr: "앨리스".to_string(),
            record: ItemRecord {
                status: Status::Active,
                max_views: 1500,
                current_views: 1480,
                removed_date: None,
                last_updated: Some("2025-03-10".to_string()),
                recs: 12,
                comments: 3,
                post_date: Some("2024-11-01 09:00:00".to_string()),
                post_title: Some("Title, with \"quotes\"".to_string()),
            },
        },
        HistoryEntry {
            url: "https://g.example/p/2".to_string(),
            name_en: "Bob".to_string(),
            name_kr: "밥".to_string(),
            record: ItemRecord {
                status: Status::Removed,
                max_views: 90,
                current_views: 0,
                removed_date: Some("2025-02-01".to_string()),
                last_updated: Some("2025-03-10".to_string()),
                ..ItemRecord::default()
            },
        },
    ];

    store.persist_history(&entries, &[]).unwrap();
    let raw = fs::read_to_string(store.history_path()).unwrap();
    assert!(raw.starts_with(
        "english_name,korean_name,url,status,max_views,current_views,removed_date,last_updated,"
    ));
    assert!(raw.contains(",removed,"));

    let table = store.load_history().unwrap();
    assert_eq!(table.entries, entries);
    assert!(table.unkeyed.is_empty());
}

#[test]
fn persist_creates_missing_directories() {
    let temp = TempDir::new().unwrap();
    let store = RecordStore::new(
        temp.path().join("seed.csv"),
        temp.path().join("data").join("history.csv"),
    );

    store.persist_history(&[], &[]).unwrap();
    assert!(store.history_path().exists());
    assert_eq!(store.load_history().unwrap(), HistoryTable::default());
}
