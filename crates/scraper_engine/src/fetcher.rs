use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use scraper_core::{extract_title, is_pdf_url, validate_content, ContentVerdict};

use crate::limiter::RateLimiter;
use crate::progress::ProgressTracker;
use crate::reader::{ContentConverter, ConvertError};
use crate::settings::PipelineSettings;
use crate::types::{LinkReport, LinkStatus};

/// Fetch-and-convert for a single URL: rate-limit gate, per-class timeout,
/// retry with exponential backoff, content validation.
///
/// Every outcome is a terminal [`LinkReport`]; callers inspect status, they
/// never handle errors from here.
pub struct ContentFetcher {
    converter: Arc<dyn ContentConverter>,
    limiter: Arc<RateLimiter>,
    settings: PipelineSettings,
}

impl ContentFetcher {
    pub fn new(
        converter: Arc<dyn ContentConverter>,
        limiter: Arc<RateLimiter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            converter,
            limiter,
            settings,
        }
    }

    pub async fn fetch(
        &self,
        url: &Url,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> LinkReport {
        tracker.link_started(url);

        let timeout = if is_pdf_url(url.as_str()) {
            self.settings.pdf_timeout
        } else {
            self.settings.default_timeout
        };

        let mut last_error: Option<ConvertError> = None;
        let total_attempts = self.settings.max_retries + 1;

        for attempt in 1..=total_attempts {
            if cancel.is_cancelled() {
                tracker.link_finished(LinkStatus::Cancelled);
                return LinkReport::cancelled(url.clone(), attempt - 1);
            }

            // The admission wait can be long when the window is drained;
            // give cancellation a way in.
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracker.link_finished(LinkStatus::Cancelled);
                    return LinkReport::cancelled(url.clone(), attempt - 1);
                }
                _ = self.limiter.acquire() => {}
            }

            match self.converter.convert(url, timeout).await {
                Ok(content) => {
                    return match validate_content(&content) {
                        ContentVerdict::Valid => {
                            let title = extract_title(&content);
                            log::info!("fetched {url} on attempt {attempt}");
                            tracker.link_finished(LinkStatus::Succeeded);
                            LinkReport::succeeded(url.clone(), attempt, title, content)
                        }
                        verdict => {
                            log::info!("skipping {url}: {}", skip_reason(verdict));
                            tracker.link_finished(LinkStatus::Skipped);
                            LinkReport::skipped(url.clone(), attempt, skip_reason(verdict))
                        }
                    };
                }
                Err(err) => {
                    log::warn!("attempt {attempt}/{total_attempts} for {url} failed: {err}");
                    last_error = Some(err);
                    if attempt < total_attempts {
                        let delay = backoff_delay(self.settings.retry_delay, attempt);
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                tracker.link_finished(LinkStatus::Cancelled);
                                return LinkReport::cancelled(url.clone(), attempt);
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        let message = last_error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "conversion failed".to_string());
        log::error!("giving up on {url} after {total_attempts} attempts: {message}");
        tracker.link_finished(LinkStatus::Failed);
        LinkReport::failed(url.clone(), total_attempts, message)
    }
}

/// `retry_delay * 2^(attempt-1)`: 5s, 10s, 20s with the defaults.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt - 1)
}

fn skip_reason(verdict: ContentVerdict) -> &'static str {
    match verdict {
        ContentVerdict::TooShort => "retrieved content too short or empty",
        ContentVerdict::MetadataOnly => "retrieved content contains only metadata",
        ContentVerdict::Valid => unreachable!("valid content is not skipped"),
    }
}
