//! Utility functions and helpers.

pub mod console;
pub mod encoding;
pub mod http;

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element with whitespace normalized.
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Cut `text` to at most `max` characters, replacing the tail with `...`.
///
/// Counts Unicode scalar values, so the cut can land inside an emoji sequence
/// or in the middle of a field.
pub fn truncate_chars(text: &str, max: usize) -> String {
    const ELLIPSIS: &str = "...";

    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Case-insensitive substring containment.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("dl.calendar_day").is_ok());
        assert!(parse_selector(".cal_event_icon span").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_chars("短い", 280), "短い");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "あ".repeat(300);
        let out = truncate_chars(&text, 280);
        assert_eq!(out.chars().count(), 280);
        assert!(out.starts_with(&"あ".repeat(277)));
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncate_exactly_at_limit() {
        let text = "x".repeat(280);
        assert_eq!(truncate_chars(&text, 280), text);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Event-Card", "card"));
        assert!(!contains_ignore_case("header", "card"));
    }
}
