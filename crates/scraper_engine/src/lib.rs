//! Scraper engine: rate-limited, batched content-acquisition pipeline.
//!
//! A job starts from one seed URL: the discoverer extracts the candidate
//! link set, the batch scheduler drains it through the fetcher (gated by a
//! process-wide sliding-window rate limiter), every outcome feeds the
//! progress stream, and
//! successful content lands in a downloadable archive that expires after a
//! retention window.
mod archive;
mod discover;
mod fetcher;
mod limiter;
mod progress;
mod reader;
mod scheduler;
mod service;
mod settings;
mod types;

pub use archive::{ArchiveError, ArchiveStore};
pub use discover::{extract_links, DiscoveryError, LinkDiscoverer};
pub use fetcher::ContentFetcher;
pub use limiter::RateLimiter;
pub use progress::{ProgressEvent, ProgressSnapshot, ProgressTracker};
pub use reader::{ContentConverter, ConvertError, ReaderClient};
pub use scheduler::BatchScheduler;
pub use service::ScrapeService;
pub use settings::PipelineSettings;
pub use types::{JobError, JobId, JobSummary, LinkReport, LinkStatus};
