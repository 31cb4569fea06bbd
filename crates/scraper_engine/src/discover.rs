use std::collections::HashSet;
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use scraper_core::{is_excluded_url, normalize_link, rewrite_arxiv_url};

/// Seed-page failures are fatal to the job: with no links there is nothing
/// to schedule, and silence would look like an empty result.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("seed fetch failed: {0}")]
    Fetch(String),
    #[error("seed returned http status {0}")]
    HttpStatus(u16),
}

/// Fetches the seed page and extracts the candidate link set.
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    client: reqwest::Client,
}

impl LinkDiscoverer {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn discover(
        &self,
        seed: &Url,
        timeout: Duration,
    ) -> Result<Vec<Url>, DiscoveryError> {
        let response = self
            .client
            .get(seed.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| DiscoveryError::Fetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::HttpStatus(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|err| DiscoveryError::Fetch(err.to_string()))?;

        let links = extract_links(&html, seed);
        log::info!("discovered {} links from {seed}", links.len());
        Ok(links)
    }
}

impl Default for LinkDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls anchor hrefs out of the seed markup, normalized and deduplicated
/// in document order. Excluded URLs are dropped here, not counted as
/// skipped. arXiv abstract pages come out in their PDF form.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchor_sel) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = normalize_link(href, base) else {
            continue;
        };
        if is_excluded_url(&url) {
            continue;
        }
        let url = rewrite_arxiv_url(&url).unwrap_or(url);
        if seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    }
    links
}
