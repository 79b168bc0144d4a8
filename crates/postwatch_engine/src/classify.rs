use postwatch_core::{normalize_url, FetchOutcome, RemovalCause};
use url::Url;

use crate::{
    decode_page, Extraction, FailureKind, FetchError, FetchOutput, FetchSettings, PostExtractor,
};

/// Turns one fetch attempt into the outcome the reconciler consumes.
///
/// 404 and a redirect onto a listing page are removals without looking at the
/// body. Every other error is a transient failure.
pub fn classify(
    result: Result<FetchOutput, FetchError>,
    settings: &FetchSettings,
    extractor: &dyn PostExtractor,
) -> FetchOutcome {
    let output = match result {
        Ok(output) => output,
        Err(err) if err.kind == FailureKind::HttpStatus(404) => {
            return FetchOutcome::Removed(RemovalCause::NotFound);
        }
        Err(err) => return FetchOutcome::failed(err.to_string()),
    };

    if redirected_to_listing(&output, &settings.listing_path_markers) {
        return FetchOutcome::Removed(RemovalCause::RedirectedToListing);
    }

    let html = decode_page(&output.bytes, output.metadata.content_type.as_deref());
    match extractor.extract(&html) {
        Extraction::Observed(observation) => FetchOutcome::Observed(observation),
        Extraction::Removed(cause) => FetchOutcome::Removed(cause),
    }
}

fn redirected_to_listing(output: &FetchOutput, markers: &[String]) -> bool {
    let meta = &output.metadata;
    if normalize_url(&meta.final_url) == normalize_url(&meta.original_url) {
        return false;
    }
    let path = match Url::parse(&meta.final_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => return false,
    };
    markers
        .iter()
        .any(|marker| !marker.is_empty() && path.contains(marker.as_str()))
}
