use crate::{
    FetchOutcome, ItemRecord, Observation, RemovalCause, Status, ZeroViewsPolicy, ZeroViewsVerdict,
};

#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    /// Run date stamped into `last_updated` and, on removal, `removed_date`.
    pub today: &'a str,
    pub zero_views: ZeroViewsPolicy,
}

/// What `reconcile` did to the record, for logging and run summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Observed { previous_max: u64, views: u64 },
    NewlyRemoved(RemovalCause),
    StillRemoved(RemovalCause),
    CarriedOver(CarryReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarryReason {
    FetchFailed(String),
    SuspiciousZeroViews,
    /// A live observation arrived for a record that is already removed.
    RemovedIsSticky,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub record: ItemRecord,
    pub transition: Transition,
}

/// Merges one fetch outcome into the prior record.
///
/// A missing prior record starts as `Active` with zero counts. Every branch
/// stamps `last_updated`; a failed fetch changes nothing else. `Removed` is
/// terminal: later observations never bring a record back to `Active`.
pub fn reconcile(
    prior: Option<&ItemRecord>,
    outcome: &FetchOutcome,
    ctx: &ReconcileContext<'_>,
) -> Reconciled {
    let mut record = prior.cloned().unwrap_or_default();
    record.last_updated = Some(ctx.today.to_string());

    let transition = match outcome {
        FetchOutcome::Failed { cause } => {
            Transition::CarriedOver(CarryReason::FetchFailed(cause.clone()))
        }
        FetchOutcome::Removed(cause) => mark_removed(&mut record, *cause, ctx.today),
        FetchOutcome::Observed(_) if record.status == Status::Removed => {
            Transition::CarriedOver(CarryReason::RemovedIsSticky)
        }
        FetchOutcome::Observed(observation) if observation.views == 0 => {
            match ctx.zero_views.judge(observation) {
                ZeroViewsVerdict::Trust => apply_observation(&mut record, observation),
                ZeroViewsVerdict::Removed => {
                    mark_removed(&mut record, RemovalCause::ZeroViews, ctx.today)
                }
                ZeroViewsVerdict::Suspicious => {
                    Transition::CarriedOver(CarryReason::SuspiciousZeroViews)
                }
            }
        }
        FetchOutcome::Observed(observation) => apply_observation(&mut record, observation),
    };

    Reconciled { record, transition }
}

fn mark_removed(record: &mut ItemRecord, cause: RemovalCause, today: &str) -> Transition {
    let was_active = record.status == Status::Active;
    if was_active || record.removed_date.is_none() {
        record.removed_date = Some(today.to_string());
    }
    record.status = Status::Removed;
    record.current_views = 0;

    if was_active {
        Transition::NewlyRemoved(cause)
    } else {
        Transition::StillRemoved(cause)
    }
}

fn apply_observation(record: &mut ItemRecord, observation: &Observation) -> Transition {
    let previous_max = record.max_views;
    record.status = Status::Active;
    record.current_views = observation.views;
    record.max_views = previous_max.max(observation.views);
    record.recs = observation.recs;
    record.comments = observation.comments;
    // Date and title do not change over a post's life; keep the last good value.
    if observation.post_date.is_some() {
        record.post_date = observation.post_date.clone();
    }
    if observation.post_title.is_some() {
        record.post_title = observation.post_title.clone();
    }

    Transition::Observed {
        previous_max,
        views: observation.views,
    }
}
