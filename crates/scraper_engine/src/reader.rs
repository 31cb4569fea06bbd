use std::time::Duration;

use url::Url;

/// Errors from one conversion attempt. All variants are treated as
/// transient by the retry policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("network error: {0}")]
    Network(String),
    #[error("conversion timed out after {0:?}")]
    Timeout(Duration),
    #[error("converter returned http status {0}")]
    HttpStatus(u16),
}

/// Contract with the external content-conversion service: URL in,
/// normalized text or failure out, within a bounded time.
#[async_trait::async_trait]
pub trait ContentConverter: Send + Sync {
    async fn convert(&self, url: &Url, timeout: Duration) -> Result<String, ConvertError>;
}

/// Reader-API client: `GET {base}/{target_url}` returns the page as
/// normalized markdown in the response body.
#[derive(Debug, Clone)]
pub struct ReaderClient {
    base_url: String,
    client: reqwest::Client,
}

impl ReaderClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Injects a preconfigured client (shared connection pool, tests).
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, client }
    }
}

#[async_trait::async_trait]
impl ContentConverter for ReaderClient {
    async fn convert(&self, url: &Url, timeout: Duration) -> Result<String, ConvertError> {
        let target = format!("{}/{}", self.base_url, url);
        log::debug!("converting via reader: {target}");

        let response = self
            .client
            .get(&target)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConvertError::HttpStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|err| map_reqwest_error(err, timeout))?;
        Ok(text.trim().to_string())
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> ConvertError {
    if err.is_timeout() {
        return ConvertError::Timeout(timeout);
    }
    ConvertError::Network(err.to_string())
}
