use std::time::Duration;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::fetcher::ContentFetcher;
use crate::progress::ProgressTracker;
use crate::types::{LinkReport, LinkStatus};

/// Drives a job's link set through the fetcher in fixed-size batches.
///
/// Fetches within a batch run concurrently, each gated by the shared rate
/// limiter, so real parallelism is throttled by admission availability
/// rather than batch size alone. Batches follow discovery order, with a
/// pacing pause between batches.
pub struct BatchScheduler {
    batch_size: usize,
    batch_pause: Duration,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, batch_pause: Duration) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            batch_size,
            batch_pause,
        }
    }

    /// Processes every link exactly once and returns one report per link,
    /// in discovery order. Cancellation is honored between batches, between
    /// attempts, and inside each fetch; remaining links end `Cancelled`.
    pub async fn run(
        &self,
        links: &[Url],
        fetcher: &ContentFetcher,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Vec<LinkReport> {
        let mut reports = Vec::with_capacity(links.len());
        let mut idx = 0;

        while idx < links.len() {
            if cancel.is_cancelled() {
                log::info!("cancelled with {} links remaining", links.len() - idx);
                for url in &links[idx..] {
                    tracker.link_finished(LinkStatus::Cancelled);
                    reports.push(LinkReport::cancelled(url.clone(), 0));
                }
                break;
            }

            let end = (idx + self.batch_size).min(links.len());
            let batch = &links[idx..end];
            log::debug!("fetching batch of {} links", batch.len());
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|url| fetcher.fetch(url, tracker, cancel)),
            )
            .await;
            reports.extend(outcomes);
            idx = end;

            if idx < links.len() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.batch_pause) => {}
                }
            }
        }

        reports
    }
}
