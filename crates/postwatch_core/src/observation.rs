use std::fmt;

/// Counters scraped from a single post page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observation {
    pub views: u64,
    pub recs: u64,
    pub comments: u64,
    pub post_date: Option<String>,
    pub post_title: Option<String>,
}

impl Observation {
    /// True when any field besides the view count was found on the page.
    pub fn has_corroborating_fields(&self) -> bool {
        self.recs > 0
            || self.comments > 0
            || self.post_date.as_deref().is_some_and(|d| !d.trim().is_empty())
            || self.post_title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// The server answered 404.
    NotFound,
    /// The post URL resolved to a listing page.
    RedirectedToListing,
    /// The page carries a deletion notice.
    DeletionMarker,
    /// The body is a listing page rather than a post view.
    ListingPage,
    /// A zero view count judged as removal by the zero-views policy.
    ZeroViews,
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalCause::NotFound => write!(f, "not found (404)"),
            RemovalCause::RedirectedToListing => write!(f, "redirected to listing"),
            RemovalCause::DeletionMarker => write!(f, "deletion marker in page"),
            RemovalCause::ListingPage => write!(f, "page is a listing"),
            RemovalCause::ZeroViews => write!(f, "zero views"),
        }
    }
}

/// Result of the fetch and extract step for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Observed(Observation),
    Removed(RemovalCause),
    /// Transport error, timeout or a non-404 HTTP error.
    Failed { cause: String },
}

impl FetchOutcome {
    pub fn failed(cause: impl Into<String>) -> Self {
        FetchOutcome::Failed {
            cause: cause.into(),
        }
    }
}
