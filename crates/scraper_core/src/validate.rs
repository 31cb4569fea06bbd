/// Minimum length for converted content to count as an article body.
pub const MIN_CONTENT_CHARS: usize = 50;
/// Minimum number of newlines expected in real content.
pub const MIN_CONTENT_NEWLINES: usize = 3;

/// Lines the converter emits about the page rather than from the page.
const METADATA_PREFIXES: &[&str] = &[
    "# Original URL:",
    "Title:",
    "URL Source:",
    "Markdown Content:",
];

/// Outcome of the content-quality heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentVerdict {
    Valid,
    /// Empty or too short to be an article body.
    TooShort,
    /// Every non-empty line is converter metadata; no body at all.
    MetadataOnly,
}

impl ContentVerdict {
    pub fn is_valid(self) -> bool {
        matches!(self, ContentVerdict::Valid)
    }
}

/// Checks that converted content carries an actual body.
///
/// Pages that convert to a bare title/byline still come back with a 200, so
/// the pipeline has to judge the text itself. Failing content is skipped,
/// never retried.
pub fn validate_content(content: &str) -> ContentVerdict {
    let trimmed = content.trim();
    if trimmed.len() < MIN_CONTENT_CHARS
        || trimmed.matches('\n').count() < MIN_CONTENT_NEWLINES
    {
        return ContentVerdict::TooShort;
    }

    let mut saw_line = false;
    let all_metadata = trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .all(|line| {
            saw_line = true;
            METADATA_PREFIXES
                .iter()
                .any(|prefix| line.trim_start().starts_with(prefix))
        });
    if saw_line && all_metadata {
        return ContentVerdict::MetadataOnly;
    }

    ContentVerdict::Valid
}
