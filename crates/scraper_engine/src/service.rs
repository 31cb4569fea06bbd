use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::archive::{ArchiveError, ArchiveStore};
use crate::discover::LinkDiscoverer;
use crate::fetcher::ContentFetcher;
use crate::limiter::RateLimiter;
use crate::progress::{ProgressEvent, ProgressSnapshot, ProgressTracker};
use crate::reader::{ContentConverter, ReaderClient};
use crate::scheduler::BatchScheduler;
use crate::settings::PipelineSettings;
use crate::types::{JobError, JobId, JobSummary, LinkReport, LinkStatus};

/// Per-process pipeline context: owns the shared rate limiter, the job
/// map, and the archive store. No ambient global state; tests build a
/// fresh service each.
#[derive(Clone)]
pub struct ScrapeService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    settings: PipelineSettings,
    limiter: Arc<RateLimiter>,
    converter: Arc<dyn ContentConverter>,
    discoverer: LinkDiscoverer,
    archives: ArchiveStore,
    jobs: Mutex<HashMap<JobId, JobHandle>>,
}

struct JobHandle {
    tracker: Arc<ProgressTracker>,
    cancel: CancellationToken,
    done: watch::Receiver<Option<JobSummary>>,
    finished_at: Arc<Mutex<Option<Instant>>>,
}

impl ScrapeService {
    pub fn new(settings: PipelineSettings) -> Self {
        let converter = Arc::new(ReaderClient::new(settings.reader_base_url.clone()));
        Self::with_converter(settings, converter)
    }

    /// Injects a converter implementation (tests, alternative upstreams).
    pub fn with_converter(
        settings: PipelineSettings,
        converter: Arc<dyn ContentConverter>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                limiter: Arc::new(RateLimiter::new(settings.rate_limit, settings.rate_period)),
                converter,
                discoverer: LinkDiscoverer::new(),
                archives: ArchiveStore::new(settings.retention),
                jobs: Mutex::new(HashMap::new()),
                settings,
            }),
        }
    }

    /// Creates a job for `seed` and starts discovery and fetching in the
    /// background. Must be called within a tokio runtime.
    pub fn start(&self, seed: &str) -> Result<JobId, JobError> {
        let seed =
            Url::parse(seed).map_err(|err| JobError::InvalidSeedUrl(err.to_string()))?;
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(JobError::InvalidSeedUrl(format!(
                "unsupported scheme {}",
                seed.scheme()
            )));
        }

        let job_id = Uuid::new_v4();
        let tracker = Arc::new(ProgressTracker::new());
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(None);
        let finished_at = Arc::new(Mutex::new(None));

        {
            let mut jobs = self.inner.jobs.lock().expect("jobs lock");
            jobs.insert(
                job_id,
                JobHandle {
                    tracker: Arc::clone(&tracker),
                    cancel: cancel.clone(),
                    done: done_rx,
                    finished_at: Arc::clone(&finished_at),
                },
            );
        }

        log::info!("job {job_id} started for {seed}");
        tokio::spawn(run_job(
            Arc::clone(&self.inner),
            job_id,
            seed,
            tracker,
            cancel,
            done_tx,
            finished_at,
        ));
        Ok(job_id)
    }

    /// Live progress stream for one job. Events before the subscription are
    /// not replayed; use [`ScrapeService::progress`] to catch up first.
    pub fn subscribe(
        &self,
        job_id: JobId,
    ) -> Result<broadcast::Receiver<ProgressEvent>, JobError> {
        self.with_job(job_id, |handle| handle.tracker.subscribe())
    }

    pub fn progress(&self, job_id: JobId) -> Result<ProgressSnapshot, JobError> {
        self.with_job(job_id, |handle| handle.tracker.snapshot())
    }

    /// Requests best-effort cancellation: in-flight and queued fetches stop
    /// issuing new attempts promptly; already-archived results are kept.
    pub fn cancel(&self, job_id: JobId) -> Result<(), JobError> {
        log::info!("cancellation requested for job {job_id}");
        self.with_job(job_id, |handle| handle.cancel.cancel())
    }

    /// Final summary if the job has finished, `None` while it is running.
    pub fn result(&self, job_id: JobId) -> Result<Option<JobSummary>, JobError> {
        self.with_job(job_id, |handle| handle.done.borrow().clone())
    }

    /// Waits for the job to finish and returns its summary.
    pub async fn wait(&self, job_id: JobId) -> Result<JobSummary, JobError> {
        let mut done = self.with_job(job_id, |handle| handle.done.clone())?;
        loop {
            if let Some(summary) = done.borrow_and_update().clone() {
                return Ok(summary);
            }
            if done.changed().await.is_err() {
                return Err(JobError::UnknownJob(job_id));
            }
        }
    }

    /// Bundle bytes for a finished job, until the retention window closes.
    pub fn download(&self, job_id: JobId) -> Result<Arc<Vec<u8>>, JobError> {
        self.inner
            .archives
            .fetch(&job_id)
            .ok_or(JobError::ArchiveNotFound(job_id))
    }

    /// Runs one eviction pass over archives and finished-job state.
    pub fn sweep(&self) {
        self.inner.sweep();
    }

    /// Spawns the periodic eviction sweep. The task runs until aborted.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.settings.sweep_interval);
            loop {
                ticker.tick().await;
                inner.sweep();
            }
        })
    }

    fn with_job<T>(
        &self,
        job_id: JobId,
        f: impl FnOnce(&JobHandle) -> T,
    ) -> Result<T, JobError> {
        let jobs = self.inner.jobs.lock().expect("jobs lock");
        jobs.get(&job_id).map(f).ok_or(JobError::UnknownJob(job_id))
    }
}

impl ServiceInner {
    fn sweep(&self) {
        self.archives.sweep();
        let retention = self.settings.retention;
        let mut jobs = self.jobs.lock().expect("jobs lock");
        jobs.retain(
            |_, handle| match *handle.finished_at.lock().expect("job lock") {
                Some(at) => at.elapsed() <= retention,
                None => true,
            },
        );
    }
}

async fn run_job(
    inner: Arc<ServiceInner>,
    job_id: JobId,
    seed: Url,
    tracker: Arc<ProgressTracker>,
    cancel: CancellationToken,
    done_tx: watch::Sender<Option<JobSummary>>,
    finished_at: Arc<Mutex<Option<Instant>>>,
) {
    let summary = match inner
        .discoverer
        .discover(&seed, inner.settings.default_timeout)
        .await
    {
        Err(err) => {
            // Seed failure is fatal: report zero totals with an explicit
            // error instead of a silently empty result.
            log::error!("job {job_id}: discovery failed: {err}");
            tracker.set_total(0);
            tracker.complete();
            JobSummary {
                job_id,
                links: Vec::new(),
                successful: 0,
                skipped: 0,
                failed: 0,
                cancelled: 0,
                error: Some(err.to_string()),
            }
        }
        Ok(links) => {
            tracker.set_total(links.len() as u32);
            let fetcher = ContentFetcher::new(
                Arc::clone(&inner.converter),
                Arc::clone(&inner.limiter),
                inner.settings.clone(),
            );
            let scheduler =
                BatchScheduler::new(inner.settings.batch_size, inner.settings.batch_pause);
            let reports = scheduler.run(&links, &fetcher, &tracker, &cancel).await;

            match inner.archives.build(job_id, &reports) {
                Ok(count) => log::info!("job {job_id}: archived {count} files"),
                Err(ArchiveError::NoContent) => {
                    log::warn!("job {job_id}: no valid content to archive")
                }
                Err(err) => log::error!("job {job_id}: archive build failed: {err}"),
            }
            tracker.complete();
            summarize(job_id, &links, &reports)
        }
    };

    *finished_at.lock().expect("job lock") = Some(Instant::now());
    log::info!(
        "job {job_id} finished: {} ok, {} skipped, {} failed, {} cancelled",
        summary.successful,
        summary.skipped,
        summary.failed,
        summary.cancelled
    );
    let _ = done_tx.send(Some(summary));
}

fn summarize(job_id: JobId, links: &[Url], reports: &[LinkReport]) -> JobSummary {
    let mut summary = JobSummary {
        job_id,
        links: links.iter().map(Url::to_string).collect(),
        successful: 0,
        skipped: 0,
        failed: 0,
        cancelled: 0,
        error: None,
    };
    for report in reports {
        match report.status {
            LinkStatus::Succeeded => summary.successful += 1,
            LinkStatus::Skipped => summary.skipped += 1,
            LinkStatus::Failed => summary.failed += 1,
            LinkStatus::Cancelled => summary.cancelled += 1,
            LinkStatus::Pending | LinkStatus::Fetching => {}
        }
    }
    summary
}
