use serde::Serialize;
use url::Url;
use uuid::Uuid;

/// Opaque identity of one scraping run.
pub type JobId = Uuid;

/// Terminal and in-flight states of one discovered link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Pending,
    Fetching,
    Succeeded,
    Skipped,
    Failed,
    Cancelled,
}

impl LinkStatus {
    /// Whether the link has reached a state it will never leave.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LinkStatus::Pending | LinkStatus::Fetching)
    }
}

/// Final record of one link's trip through the fetcher.
///
/// The fetcher never raises past its boundary; every outcome, including
/// cancellation, lands here as data.
#[derive(Debug, Clone)]
pub struct LinkReport {
    pub url: Url,
    pub status: LinkStatus,
    /// Conversion attempts actually issued.
    pub attempts: u32,
    /// Last error for failures, or the skip reason.
    pub error: Option<String>,
    pub title: Option<String>,
    /// Converted content, held only until it is archived.
    pub content: Option<String>,
}

impl LinkReport {
    pub(crate) fn succeeded(
        url: Url,
        attempts: u32,
        title: Option<String>,
        content: String,
    ) -> Self {
        Self {
            url,
            status: LinkStatus::Succeeded,
            attempts,
            error: None,
            title,
            content: Some(content),
        }
    }

    pub(crate) fn skipped(url: Url, attempts: u32, reason: impl Into<String>) -> Self {
        Self {
            url,
            status: LinkStatus::Skipped,
            attempts,
            error: Some(reason.into()),
            title: None,
            content: None,
        }
    }

    pub(crate) fn failed(url: Url, attempts: u32, error: impl Into<String>) -> Self {
        Self {
            url,
            status: LinkStatus::Failed,
            attempts,
            error: Some(error.into()),
            title: None,
            content: None,
        }
    }

    pub(crate) fn cancelled(url: Url, attempts: u32) -> Self {
        Self {
            url,
            status: LinkStatus::Cancelled,
            attempts,
            error: None,
            title: None,
            content: None,
        }
    }
}

/// User-facing summary of a finished job: aggregate counts only, no traces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    #[serde(rename = "jobId")]
    pub job_id: JobId,
    /// Discovered link set, in discovery order.
    pub links: Vec<String>,
    pub successful: u32,
    pub skipped: u32,
    pub failed: u32,
    pub cancelled: u32,
    /// Set only when the seed page itself could not be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Errors crossing the service boundary.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("unknown job {0}")]
    UnknownJob(JobId),
    #[error("invalid seed url: {0}")]
    InvalidSeedUrl(String),
    #[error("no archive for job {0}: never built or past retention")]
    ArchiveNotFound(JobId),
}
