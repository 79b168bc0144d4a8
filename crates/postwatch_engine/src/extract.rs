use postwatch_core::{Observation, RemovalCause};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Observed(Observation),
    Removed(RemovalCause),
}

pub trait PostExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Extraction;
}

const DELETION_MARKERS: &[&str] = &[
    "삭제된 게시물",
    "게시물이 삭제",
    "해당 게시물은 삭제되었습니다",
];

/// Extractor for gallery-style forum post pages:
/// - views, recommendations and comments from `span.gall_count`,
///   `span.gall_reply_num` and `span.gall_comment` ("조회 123" style labels)
/// - post date from the `title` attribute of `span.gall_date`
/// - title from `h3.title span.title_subject`, else the first span in `h3.title`
///
/// A page without a post header is a removal when it carries a deletion
/// notice or is a gallery listing. Missing counters read as 0.
#[derive(Debug)]
pub struct GalleryPostExtractor {
    views: CounterRule,
    recs: CounterRule,
    comments: CounterRule,
    date: Option<Selector>,
    title: Option<Selector>,
    title_fallback: Option<Selector>,
    post_header: Option<Selector>,
    listing: Option<Selector>,
    deletion_markers: Vec<String>,
}

#[derive(Debug)]
struct CounterRule {
    selector: Option<Selector>,
    pattern: Option<Regex>,
}

impl CounterRule {
    fn new(selector: &str, label: &str) -> Self {
        Self {
            selector: Selector::parse(selector).ok(),
            pattern: Regex::new(&format!(r"{label}\s*([\d,]+)")).ok(),
        }
    }

    fn read(&self, doc: &Html) -> u64 {
        let text = match first_text(doc, self.selector.as_ref()) {
            Some(text) => text,
            None => return 0,
        };
        self.pattern
            .as_ref()
            .and_then(|re| re.captures(&text))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse().ok())
            .unwrap_or(0)
    }
}

impl GalleryPostExtractor {
    pub fn new() -> Self {
        Self {
            views: CounterRule::new("span.gall_count", "조회"),
            recs: CounterRule::new("span.gall_reply_num", "추천"),
            comments: CounterRule::new("span.gall_comment", "댓글"),
            date: Selector::parse("span.gall_date").ok(),
            title: Selector::parse("h3.title span.title_subject").ok(),
            title_fallback: Selector::parse("h3.title span").ok(),
            post_header: Selector::parse("div.gallview_head, span.gall_count").ok(),
            listing: Selector::parse("table.gall_list, div.gall_listwrap").ok(),
            deletion_markers: DELETION_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_deletion_markers(mut self, markers: Vec<String>) -> Self {
        self.deletion_markers = markers;
        self
    }

    fn removal_signal(&self, doc: &Html, html: &str) -> Option<RemovalCause> {
        if has_match(doc, self.post_header.as_ref()) {
            return None;
        }
        if self
            .deletion_markers
            .iter()
            .any(|marker| !marker.is_empty() && html.contains(marker.as_str()))
        {
            return Some(RemovalCause::DeletionMarker);
        }
        if has_match(doc, self.listing.as_ref()) {
            return Some(RemovalCause::ListingPage);
        }
        None
    }

    fn post_date(&self, doc: &Html) -> Option<String> {
        let sel = self.date.as_ref()?;
        let node = doc.select(sel).next()?;
        node.value()
            .attr("title")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| non_empty_text(node))
    }
}

impl Default for GalleryPostExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PostExtractor for GalleryPostExtractor {
    fn extract(&self, html: &str) -> Extraction {
        let doc = Html::parse_document(html);
        if let Some(cause) = self.removal_signal(&doc, html) {
            return Extraction::Removed(cause);
        }

        Extraction::Observed(Observation {
            views: self.views.read(&doc),
            recs: self.recs.read(&doc),
            comments: self.comments.read(&doc),
            post_date: self.post_date(&doc),
            post_title: first_text(&doc, self.title.as_ref())
                .or_else(|| first_text(&doc, self.title_fallback.as_ref())),
        })
    }
}

fn has_match(doc: &Html, selector: Option<&Selector>) -> bool {
    selector.is_some_and(|sel| doc.select(sel).next().is_some())
}

fn first_text(doc: &Html, selector: Option<&Selector>) -> Option<String> {
    let sel = selector?;
    doc.select(sel).next().and_then(non_empty_text)
}

fn non_empty_text(node: ElementRef<'_>) -> Option<String> {
    let text = node.text().collect::<String>();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
