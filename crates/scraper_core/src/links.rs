use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hosts whose content is never worth converting (social media, CDNs).
const EXCLUDED_HOST_SUFFIXES: &[&str] = &[
    "twitter.com",
    "x.com",
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "substackcdn.com",
];

const EXCLUDED_PATH_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Query parameters that do not affect content identity.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid"];

static ARXIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"arxiv\.org/(?:abs|pdf|html)/(\d+\.\d+)(v\d+)?(?:\.pdf)?").expect("valid regex")
});

/// Resolves `raw` against `base` and normalizes it for deduplication.
///
/// Returns `None` for anything that is not an http(s) URL. Fragments and
/// known tracking parameters are stripped so that two links to the same
/// content compare equal.
pub fn normalize_link(raw: &str, base: &Url) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => base.join(trimmed).ok()?,
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    strip_tracking_params(&mut url);
    Some(url)
}

fn strip_tracking_params(url: &mut Url) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

/// Exclusion policy: social-media hosts and raw image URLs are dropped at
/// discovery time rather than wasting conversion quota on them.
pub fn is_excluded_url(url: &Url) -> bool {
    if let Some(host) = url.host_str() {
        let host = host.to_ascii_lowercase();
        if EXCLUDED_HOST_SUFFIXES
            .iter()
            .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
        {
            return true;
        }
    }

    let path = url.path().to_ascii_lowercase();
    EXCLUDED_PATH_SUFFIXES
        .iter()
        .any(|suffix| path.ends_with(suffix))
}

/// Rewrites an arXiv abstract/html URL to its PDF form.
///
/// The PDF path gives the converter the full paper instead of the abstract
/// page. Idempotent: a URL already in PDF form maps to itself.
pub fn rewrite_arxiv_url(url: &Url) -> Option<Url> {
    let caps = ARXIV_RE.captures(url.as_str())?;
    let paper_id = caps.get(1)?.as_str();
    let version = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Url::parse(&format!("https://arxiv.org/pdf/{paper_id}{version}.pdf")).ok()
}

/// Whether a URL is likely to resolve to a PDF (longer conversion timeout).
pub fn is_pdf_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.ends_with(".pdf") || lower.contains("arxiv.org/pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn relative_links_resolve_against_base() {
        let url = normalize_link("/about", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn non_http_schemes_are_dropped() {
        assert!(normalize_link("mailto:a@example.com", &base()).is_none());
        assert!(normalize_link("javascript:void(0)", &base()).is_none());
        assert!(normalize_link("ftp://example.com/file", &base()).is_none());
    }

    #[test]
    fn fragments_and_tracking_params_are_stripped() {
        let url = normalize_link(
            "https://example.com/a?utm_source=feed&id=7&fbclid=xyz#section",
            &base(),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://example.com/a?id=7");
    }

    #[test]
    fn query_becomes_empty_when_only_tracking_params() {
        let url = normalize_link("https://example.com/a?utm_medium=mail", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn social_hosts_and_images_are_excluded() {
        for raw in [
            "https://twitter.com/someone/status/1",
            "https://www.youtube.com/watch?v=abc",
            "https://example.com/logo.PNG",
            "https://example.com/photo.jpeg",
        ] {
            let url = Url::parse(raw).unwrap();
            assert!(is_excluded_url(&url), "{raw} should be excluded");
        }
        let ok = Url::parse("https://example.com/article").unwrap();
        assert!(!is_excluded_url(&ok));
    }

    #[test]
    fn arxiv_abstract_rewrites_to_pdf() {
        let url = Url::parse("https://arxiv.org/abs/1706.03762").unwrap();
        let rewritten = rewrite_arxiv_url(&url).unwrap();
        assert_eq!(rewritten.as_str(), "https://arxiv.org/pdf/1706.03762.pdf");
    }

    #[test]
    fn arxiv_rewrite_keeps_version_and_is_idempotent() {
        let url = Url::parse("https://arxiv.org/html/2301.00001v2").unwrap();
        let once = rewrite_arxiv_url(&url).unwrap();
        assert_eq!(once.as_str(), "https://arxiv.org/pdf/2301.00001v2.pdf");
        let twice = rewrite_arxiv_url(&once).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn non_arxiv_urls_are_left_alone() {
        let url = Url::parse("https://example.com/abs/1706.03762").unwrap();
        assert!(rewrite_arxiv_url(&url).is_none());
    }

    #[test]
    fn pdf_detection_covers_extension_and_arxiv_path() {
        assert!(is_pdf_url("https://example.com/paper.PDF"));
        assert!(is_pdf_url("https://arxiv.org/pdf/1706.03762.pdf"));
        assert!(!is_pdf_url("https://example.com/paper.html"));
    }
}
