//! Scraper core: pure, deterministic link/title/content heuristics.
//!
//! Everything here is synchronous and side-effect free so the async engine
//! can treat these as plain functions over text input.
mod filename;
mod links;
mod title;
mod validate;

pub use filename::{safe_filename, MAX_TITLE_LEN, URL_HASH_LEN};
pub use links::{is_excluded_url, is_pdf_url, normalize_link, rewrite_arxiv_url};
pub use title::{extract_title, MIN_TITLE_LEN, TITLE_SCAN_LINES};
pub use validate::{validate_content, ContentVerdict, MIN_CONTENT_CHARS, MIN_CONTENT_NEWLINES};
