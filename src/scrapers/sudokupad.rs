//! SudokuPad link scanning and deep-link rewriting.
//!
//! Video descriptions link puzzles as `https://sudokupad.app/<id>`. The app
//! opens them through the `sudokupad.svencodes.com/puzzle/` mirror, which
//! accepts the same path suffix.

use once_cell::sync::Lazy;
use regex::Regex;

static SUDOKUPAD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://sudokupad\.app/\S+").expect("valid SudokuPad regex"));

/// Find every SudokuPad link in `description`, in order of appearance.
pub fn extract_sudokupad_links(description: &str) -> Vec<String> {
    SUDOKUPAD_LINK
        .find_iter(description)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Rewrite a SudokuPad link to its deep-link form.
///
/// ```ignore
/// assert_eq!(
///     sudokupad_deeplink("https://sudokupad.app/abc123"),
///     "https://sudokupad.svencodes.com/puzzle/abc123"
/// );
/// ```
pub fn sudokupad_deeplink(link: &str) -> String {
    link.replace("sudokupad.app/", "sudokupad.svencodes.com/puzzle/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deeplink_rewrite() {
        assert_eq!(
            sudokupad_deeplink("https://sudokupad.app/abc123"),
            "https://sudokupad.svencodes.com/puzzle/abc123"
        );
    }

    #[test]
    fn test_deeplink_keeps_path_and_query() {
        assert_eq!(
            sudokupad_deeplink("https://sudokupad.app/psxt/miracle?setting-nogrid=1"),
            "https://sudokupad.svencodes.com/puzzle/psxt/miracle?setting-nogrid=1"
        );
    }

    #[test]
    fn test_extract_multiple_links_in_order() {
        let description = "Part one: https://sudokupad.app/first\n\
                           Part two (harder): https://sudokupad.app/second-one end";
        assert_eq!(
            extract_sudokupad_links(description),
            vec![
                "https://sudokupad.app/first".to_string(),
                "https://sudokupad.app/second-one".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_stops_at_whitespace() {
        let links = extract_sudokupad_links("Try it:\thttps://sudokupad.app/x1y2\u{a0}now");
        assert_eq!(links, vec!["https://sudokupad.app/x1y2".to_string()]);
    }

    #[test]
    fn test_extract_ignores_other_hosts() {
        let description = "http://sudokupad.app/insecure https://f-puzzles.com/?id=1 \
                           https://sudokupad.application/nope";
        assert!(extract_sudokupad_links(description).is_empty());
    }

    #[test]
    fn test_extract_empty_description() {
        assert!(extract_sudokupad_links("").is_empty());
    }
}
