//! Postwatch core: pure record types, the status state machine and snapshot projection.
mod model;
mod observation;
mod policy;
mod reconcile;
mod snapshot;
mod tracked;

pub use model::{HistoryEntry, ItemRecord, SeedEntry, Status, TrackedItem};
pub use observation::{FetchOutcome, Observation, RemovalCause};
pub use policy::{UnknownPolicy, ZeroViewsPolicy, ZeroViewsVerdict};
pub use reconcile::{reconcile, CarryReason, ReconcileContext, Reconciled, Transition};
pub use snapshot::{project, Projection, Snapshot, SnapshotEntry, SnapshotMetadata};
pub use tracked::{build_tracked_set, normalize_url, resolve_name, TrackedSet, UNKNOWN_NAME};
