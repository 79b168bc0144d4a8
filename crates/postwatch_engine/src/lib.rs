//! Postwatch engine: fetching, extraction, storage and the sequential run loop.
mod classify;
mod decode;
mod engine;
mod extract;
mod fetch;
mod persist;
mod snapshot;
mod store;
mod types;

pub use classify::classify;
pub use decode::decode_page;
pub use engine::{run_pass, EngineConfig, RunError, RunStamp, RunSummary};
pub use extract::{Extraction, GalleryPostExtractor, PostExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use persist::{ensure_parent_dir, AtomicFileWriter, PersistError};
pub use snapshot::{write_current_csv, write_snapshot, SnapshotError};
pub use store::{HistoryTable, RecordStore, StoreError, UnkeyedRow};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, ItemProgress, OutcomeKind,
    ProgressSink,
};
