use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use scraper_engine::{
    ContentFetcher, LinkStatus, PipelineSettings, ProgressTracker, RateLimiter, ReaderClient,
};

const ARTICLE: &str = "# A Real Article\n\nFirst paragraph with enough words to matter.\n\nSecond paragraph keeps the validator happy.\n";

fn test_settings() -> PipelineSettings {
    PipelineSettings {
        rate_limit: 100,
        rate_period: Duration::from_secs(60),
        max_retries: 3,
        retry_delay: Duration::from_millis(10),
        default_timeout: Duration::from_secs(5),
        pdf_timeout: Duration::from_secs(5),
        ..PipelineSettings::default()
    }
}

fn build_fetcher(server_uri: &str, settings: &PipelineSettings) -> ContentFetcher {
    let converter = Arc::new(ReaderClient::new(server_uri));
    let limiter = Arc::new(RateLimiter::new(settings.rate_limit, settings.rate_period));
    ContentFetcher::new(converter, limiter, settings.clone())
}

#[tokio::test]
async fn first_try_success_yields_succeeded_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
        .mount(&server)
        .await;

    let settings = test_settings();
    let fetcher = build_fetcher(&server.uri(), &settings);
    let tracker = ProgressTracker::new();
    tracker.set_total(1);
    let url = Url::parse("https://example.com/article").unwrap();

    let report = fetcher
        .fetch(&url, &tracker, &CancellationToken::new())
        .await;

    assert_eq!(report.status, LinkStatus::Succeeded);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.title.as_deref(), Some("A Real Article"));
    assert!(report.content.as_deref().unwrap().contains("First paragraph"));
    assert!(report.error.is_none());

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.successful, 1);
    assert_eq!(snapshot.processed, 1);
    assert_eq!(snapshot.current_url, url.to_string());
}

#[tokio::test]
async fn transient_failures_are_retried_then_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
        .mount(&server)
        .await;

    let settings = test_settings();
    let fetcher = build_fetcher(&server.uri(), &settings);
    let tracker = ProgressTracker::new();
    tracker.set_total(1);
    let url = Url::parse("https://example.com/busy").unwrap();

    let report = fetcher
        .fetch(&url, &tracker, &CancellationToken::new())
        .await;

    assert_eq!(report.status, LinkStatus::Succeeded);
    assert_eq!(report.attempts, 3);
    assert_eq!(tracker.snapshot().successful, 1);
    assert_eq!(tracker.snapshot().failed, 0);
}

#[tokio::test]
async fn exhausted_retries_yield_failed_with_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let settings = test_settings();
    let fetcher = build_fetcher(&server.uri(), &settings);
    let tracker = ProgressTracker::new();
    tracker.set_total(1);
    let url = Url::parse("https://example.com/broken").unwrap();

    let report = fetcher
        .fetch(&url, &tracker, &CancellationToken::new())
        .await;

    assert_eq!(report.status, LinkStatus::Failed);
    assert_eq!(report.attempts, settings.max_retries + 1);
    assert!(report.error.as_deref().unwrap().contains("503"));
    assert_eq!(tracker.snapshot().failed, 1);
    assert_eq!(tracker.snapshot().successful, 0);
}

#[tokio::test]
async fn empty_content_is_skipped_not_failed_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let settings = test_settings();
    let fetcher = build_fetcher(&server.uri(), &settings);
    let tracker = ProgressTracker::new();
    tracker.set_total(1);
    let url = Url::parse("https://example.com/empty").unwrap();

    let report = fetcher
        .fetch(&url, &tracker, &CancellationToken::new())
        .await;

    assert_eq!(report.status, LinkStatus::Skipped);
    assert!(report.error.as_deref().unwrap().contains("too short"));
    assert_eq!(tracker.snapshot().skipped, 1);
    assert_eq!(tracker.snapshot().failed, 0);
}

#[tokio::test]
async fn metadata_only_content_is_skipped() {
    let body = "Title: Some Page\nURL Source: https://example.com/page\nMarkdown Content:\n# Original URL: https://example.com/page\nTitle: padding line to clear the length threshold\n";
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let settings = test_settings();
    let fetcher = build_fetcher(&server.uri(), &settings);
    let tracker = ProgressTracker::new();
    tracker.set_total(1);
    let url = Url::parse("https://example.com/shell").unwrap();

    let report = fetcher
        .fetch(&url, &tracker, &CancellationToken::new())
        .await;

    assert_eq!(report.status, LinkStatus::Skipped);
    assert!(report.error.as_deref().unwrap().contains("only metadata"));
}

#[tokio::test]
async fn cancelled_token_stops_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
        .expect(0)
        .mount(&server)
        .await;

    let settings = test_settings();
    let fetcher = build_fetcher(&server.uri(), &settings);
    let tracker = ProgressTracker::new();
    tracker.set_total(1);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let url = Url::parse("https://example.com/late").unwrap();

    let report = fetcher.fetch(&url, &tracker, &cancel).await;

    assert_eq!(report.status, LinkStatus::Cancelled);
    assert_eq!(report.attempts, 0);
    assert_eq!(tracker.snapshot().cancelled, 1);
    assert_eq!(tracker.snapshot().processed, 0);
}
