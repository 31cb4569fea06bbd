use std::time::Duration;

/// Tunable knobs for one pipeline instance.
///
/// Every duration is explicit so tests can shrink delays to milliseconds.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Conversion requests admitted per sliding window (external quota).
    pub rate_limit: u32,
    /// Length of the admission window.
    pub rate_period: Duration,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Base backoff delay; doubles per retry.
    pub retry_delay: Duration,
    /// Conversion timeout for ordinary pages.
    pub default_timeout: Duration,
    /// Conversion timeout for PDF-class URLs.
    pub pdf_timeout: Duration,
    /// Links fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches, spreading the load on the upstream quota.
    pub batch_pause: Duration,
    /// How long a finished job's archive and state are kept around.
    pub retention: Duration,
    /// Cadence of the background eviction sweep.
    pub sweep_interval: Duration,
    /// Base URL of the content-conversion service.
    pub reader_base_url: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let rate_period = Duration::from_secs(60);
        Self {
            rate_limit: 15,
            rate_period,
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            default_timeout: Duration::from_secs(30),
            pdf_timeout: Duration::from_secs(60),
            batch_size: 10,
            batch_pause: rate_period / 2,
            retention: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(30),
            reader_base_url: "https://r.jina.ai".to_string(),
        }
    }
}
