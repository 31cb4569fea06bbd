use std::sync::LazyLock;

use regex::Regex;

/// How many leading lines are scanned for a heading signal.
pub const TITLE_SCAN_LINES: usize = 30;
/// Shortest heading accepted as a title.
pub const MIN_TITLE_LEN: usize = 3;

/// Converter metadata lines that must never be mistaken for a title.
const METADATA_PREFIXES: &[&str] = &[
    "URL Source:",
    "Markdown Content:",
    "# Original URL:",
    "Published:",
];

static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^\)]+\)").expect("valid regex"));
static MD_EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`]").expect("valid regex"));

/// Extracts a human-meaningful title from converted markdown content.
///
/// Scans the first [`TITLE_SCAN_LINES`] lines in priority order: `# `
/// heading, then `## ` heading, then an explicit `Title:` line. Markdown
/// link syntax and emphasis markers are stripped before the length check.
pub fn extract_title(content: &str) -> Option<String> {
    if content.is_empty() {
        return None;
    }
    let lines: Vec<&str> = content
        .lines()
        .take(TITLE_SCAN_LINES)
        .map(str::trim)
        .collect();

    for line in &lines {
        if let Some(title) = heading_title(line, "# ") {
            return Some(title);
        }
    }
    for line in &lines {
        if let Some(title) = heading_title(line, "## ") {
            return Some(title);
        }
    }
    for line in &lines {
        if let Some(rest) = line.strip_prefix("Title:") {
            let title = rest.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

fn heading_title(line: &str, marker: &str) -> Option<String> {
    if is_metadata_line(line) {
        return None;
    }
    let rest = line.strip_prefix(marker)?.trim();
    let cleaned = clean_markdown(rest);
    if cleaned.len() >= MIN_TITLE_LEN {
        Some(cleaned)
    } else {
        None
    }
}

fn is_metadata_line(line: &str) -> bool {
    METADATA_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn clean_markdown(text: &str) -> String {
    let without_links = MD_LINK_RE.replace_all(text, "$1");
    MD_EMPHASIS_RE
        .replace_all(&without_links, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::extract_title;
    use pretty_assertions::assert_eq;

    #[test]
    fn h1_heading_wins() {
        let content = "# Introduction to Machine Learning\n\nBody text.\n\n## Chapter 1\n";
        assert_eq!(
            extract_title(content).as_deref(),
            Some("Introduction to Machine Learning")
        );
    }

    #[test]
    fn h1_preferred_over_title_line() {
        let content =
            "URL Source: https://example.com/article\nTitle: Understanding Neural Networks\n\n# Understanding Neural Networks\n\nBody.\n";
        assert_eq!(
            extract_title(content).as_deref(),
            Some("Understanding Neural Networks")
        );
    }

    #[test]
    fn h2_used_when_no_h1() {
        let content = "Some introductory text\n\n## FastAPI Documentation\n\nBody.\n";
        assert_eq!(
            extract_title(content).as_deref(),
            Some("FastAPI Documentation")
        );
    }

    #[test]
    fn markdown_links_and_emphasis_are_stripped() {
        let content = "# [Getting Started with **Python**](https://python.org)\n\nBody.\n";
        assert_eq!(
            extract_title(content).as_deref(),
            Some("Getting Started with Python")
        );
    }

    #[test]
    fn metadata_only_content_has_no_title() {
        let content = "URL Source: https://example.com\n\nJust some content without headers.\n";
        assert_eq!(extract_title(content), None);
    }

    #[test]
    fn original_url_header_is_not_a_title() {
        let content = "# Original URL: https://example.com/a\n\nBody without headings.\n";
        assert_eq!(extract_title(content), None);
    }

    #[test]
    fn headings_outside_scan_window_are_ignored() {
        let mut content = "filler\n".repeat(40);
        content.push_str("# Late Heading\n");
        assert_eq!(extract_title(&content), None);
    }

    #[test]
    fn empty_content_has_no_title() {
        assert_eq!(extract_title(""), None);
    }
}
