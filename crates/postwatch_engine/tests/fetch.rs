use std::time::Duration;

use postwatch_core::{FetchOutcome, RemovalCause};
use postwatch_engine::{
    classify, FailureKind, FetchSettings, Fetcher, GalleryPostExtractor, ReqwestFetcher,
};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIVE_PAGE: &str = r#"<div class="gallview_head">
    <span class="gall_count">조회 321</span>
    <span class="gall_reply_num">추천 4</span>
    <span class="gall_comment">댓글 2</span>
</div>"#;

async fn fetch_and_classify(settings: FetchSettings, url: &str) -> FetchOutcome {
    let fetcher = ReqwestFetcher::new(settings.clone());
    classify(fetcher.fetch(url).await, &settings, &GalleryPostExtractor::new())
}

#[tokio::test]
async fn fetcher_returns_page_with_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/view/"))
        .and(query_param("no", "1"))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(LIVE_PAGE, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/board/view/?id=g&no=1", server.uri());

    let output = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.final_url, url);
    assert_eq!(output.metadata.redirect_count, 0);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(output.bytes, LIVE_PAGE.as_bytes());
}

#[tokio::test]
async fn live_page_classifies_as_observation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/view/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(LIVE_PAGE, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/board/view/?id=g&no=1", server.uri());
    match fetch_and_classify(FetchSettings::default(), &url).await {
        FetchOutcome::Observed(obs) => {
            assert_eq!(obs.views, 321);
            assert_eq!(obs.recs, 4);
            assert_eq!(obs.comments, 2);
        }
        other => panic!("expected observation, got {other:?}"),
    }
}

#[tokio::test]
async fn not_found_is_a_confirmed_removal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/view/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/board/view/?id=g&no=2", server.uri());
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));

    assert_eq!(
        fetch_and_classify(FetchSettings::default(), &url).await,
        FetchOutcome::Removed(RemovalCause::NotFound)
    );
}

#[tokio::test]
async fn server_error_is_a_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/view/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let url = format!("{}/board/view/?id=g&no=3", server.uri());
    match fetch_and_classify(FetchSettings::default(), &url).await {
        FetchOutcome::Failed { cause } => assert!(cause.contains("503"), "cause: {cause}"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_times_out_as_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/view/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw(LIVE_PAGE, "text/html"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let url = format!("{}/board/view/?id=g&no=4", server.uri());

    let err = ReqwestFetcher::new(settings.clone())
        .fetch(&url)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);

    assert!(matches!(
        fetch_and_classify(settings, &url).await,
        FetchOutcome::Failed { .. }
    ));
}

#[tokio::test]
async fn redirect_to_listing_is_a_confirmed_removal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/view/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/board/lists/?id=g", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/board/lists/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LIVE_PAGE, "text/html"))
        .mount(&server)
        .await;

    let url = format!("{}/board/view/?id=g&no=5", server.uri());
    let output = ReqwestFetcher::new(FetchSettings::default())
        .fetch(&url)
        .await
        .expect("redirect followed");
    assert_eq!(output.metadata.redirect_count, 1);
    assert!(output.metadata.final_url.contains("/board/lists/"));

    assert_eq!(
        fetch_and_classify(FetchSettings::default(), &url).await,
        FetchOutcome::Removed(RemovalCause::RedirectedToListing)
    );
}

#[tokio::test]
async fn non_html_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board/view/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let url = format!("{}/board/view/?id=g&no=6", server.uri());
    let err = ReqwestFetcher::new(FetchSettings::default())
        .fetch(&url)
        .await
        .unwrap_err();

    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/json".to_string()
        }
    );
}

#[tokio::test]
async fn invalid_url_fails_without_network() {
    let err = ReqwestFetcher::new(FetchSettings::default())
        .fetch("not a url")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
