use sha2::{Digest, Sha256};

/// Longest sanitized title kept in a filename.
pub const MAX_TITLE_LEN: usize = 100;
/// Hex characters of the URL hash suffix.
pub const URL_HASH_LEN: usize = 12;

/// Deterministic, collision-resistant filename: `{sanitized_title}--{short_hash(url)}.md`
///
/// Same (title, url) always yields the same name; two URLs sharing a title
/// still get distinct names through the hash suffix.
pub fn safe_filename(title: Option<&str>, url: &str) -> String {
    let sanitized = sanitize_title(title.unwrap_or("untitled"));
    let hash = short_hash(url);
    format!("{sanitized}--{hash}.md")
}

fn sanitize_title(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            cleaned.push(c);
            prev_dash = false;
        } else if c.is_whitespace() || c == '-' {
            // Collapse whitespace and hyphen runs to a single separator.
            if !prev_dash && !cleaned.is_empty() {
                cleaned.push('-');
            }
            prev_dash = true;
        }
        // Everything else (punctuation, non-ASCII) is dropped.
    }
    let mut cleaned = cleaned.trim_matches('-').to_string();

    if cleaned.len() > MAX_TITLE_LEN {
        cleaned.truncate(MAX_TITLE_LEN);
        cleaned = cleaned.trim_end_matches('-').to_string();
    }
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    cleaned
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(URL_HASH_LEN);
    for byte in digest.iter().take(URL_HASH_LEN / 2) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::{safe_filename, MAX_TITLE_LEN, URL_HASH_LEN};

    #[test]
    fn filename_is_deterministic() {
        let a = safe_filename(Some("Intro to ML"), "https://example.com/ml");
        let b = safe_filename(Some("Intro to ML"), "https://example.com/ml");
        assert_eq!(a, b);
    }

    #[test]
    fn same_title_different_urls_differ() {
        let a = safe_filename(Some("Intro"), "https://example.com/a");
        let b = safe_filename(Some("Intro"), "https://example.com/b");
        assert_ne!(a, b);
        assert!(a.starts_with("Intro--"));
        assert!(b.starts_with("Intro--"));
    }

    #[test]
    fn special_characters_are_dropped() {
        let name = safe_filename(Some("What's New in Python 3.12?"), "https://example.com");
        assert!(name.starts_with("Whats-New-in-Python-312--"));
        assert!(name.ends_with(".md"));
    }

    #[test]
    fn long_titles_are_truncated() {
        let title = "word ".repeat(60);
        let name = safe_filename(Some(&title), "https://example.com");
        let stem = name.split("--").next().unwrap();
        assert!(stem.len() <= MAX_TITLE_LEN);
        assert!(!stem.ends_with('-'));
    }

    #[test]
    fn missing_or_junk_title_falls_back_to_untitled() {
        let a = safe_filename(None, "https://example.com/x");
        let b = safe_filename(Some("!!!???###"), "https://example.com/x");
        assert!(a.starts_with("untitled--"));
        assert_eq!(a, b);
    }

    #[test]
    fn hash_suffix_has_expected_length() {
        let name = safe_filename(Some("Title"), "https://example.com");
        let hash = name
            .strip_suffix(".md")
            .unwrap()
            .split("--")
            .nth(1)
            .unwrap();
        assert_eq!(hash.len(), URL_HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
