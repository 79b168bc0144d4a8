use std::fmt;

use postwatch_core::Transition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Coarse classification of what happened to one item during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Observed,
    Removed,
    Failed,
    CarriedOver,
}

impl OutcomeKind {
    pub fn from_transition(transition: &Transition) -> Self {
        use postwatch_core::CarryReason;
        match transition {
            Transition::Observed { .. } => OutcomeKind::Observed,
            Transition::NewlyRemoved(_) | Transition::StillRemoved(_) => OutcomeKind::Removed,
            Transition::CarriedOver(CarryReason::FetchFailed(_)) => OutcomeKind::Failed,
            Transition::CarriedOver(_) => OutcomeKind::CarriedOver,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProgress {
    /// 1-based position in the tracked set.
    pub index: usize,
    pub total: usize,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ItemStarted(ItemProgress),
    ItemFinished {
        progress: ItemProgress,
        outcome: OutcomeKind,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Sink for callers that do not watch progress.
impl ProgressSink for () {
    fn emit(&self, _event: EngineEvent) {}
}
