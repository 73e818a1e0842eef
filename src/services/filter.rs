// src/services/filter.rs

//! Today-filter.
//!
//! In [`MatchMode::Legacy`] a record is kept when its date text contains one
//! of four rendered forms of today's date. This is substring containment, not
//! date parsing: "2024年1月1日" matches "1月1日" on every first of January, and
//! "11/10" contains "1/1".
//!
//! [`MatchMode::Strict`] parses every date in the text and compares real
//! dates, falling back to the substring rules when nothing parses.
//!
//! In both modes a title carrying a today marker ("本日", "today", ...) keeps
//! the record regardless of its date.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::{EventRecord, FilterConfig, MatchMode};
use crate::utils::contains_ignore_case;

/// `[year 年|/] month 月|/ day [日]`, preceded by a non-digit or the start.
static DATE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(?:(\d{4})\s*[年/]\s*)?(\d{1,2})\s*[月/]\s*(\d{1,2})").ok()
});

/// The four literal renderings of `date` searched for in date text.
pub fn today_patterns(date: NaiveDate) -> [String; 4] {
    let (y, m, d) = (date.year(), date.month(), date.day());
    [
        format!("{m}月{d}日"),
        format!("{m}/{d}"),
        format!("{y}年{m}月{d}日"),
        format!("{y}/{m}/{d}"),
    ]
}

/// Legacy substring match of the date text.
pub fn date_text_matches(text: &str, date: NaiveDate) -> bool {
    today_patterns(date)
        .iter()
        .any(|pattern| text.contains(pattern.as_str()))
}

/// Whether the title carries one of the today markers.
pub fn has_today_marker(title: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|marker| contains_ignore_case(title, marker))
}

/// Dates found in `text`. Year-less dates take `default_year`.
pub fn parse_dates(text: &str, default_year: i32) -> Vec<NaiveDate> {
    let Some(re) = DATE_PATTERN.as_ref() else {
        return Vec::new();
    };

    re.captures_iter(text)
        .filter_map(|caps| {
            let year = caps
                .get(1)
                .and_then(|y| y.as_str().parse().ok())
                .unwrap_or(default_year);
            let month = caps.get(2)?.as_str().parse().ok()?;
            let day = caps.get(3)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .collect()
}

/// Decide whether one record belongs to `date`.
pub fn is_today(record: &EventRecord, date: NaiveDate, config: &FilterConfig) -> bool {
    if has_today_marker(&record.title, &config.today_markers) {
        return true;
    }

    match config.match_mode {
        MatchMode::Legacy => date_text_matches(&record.date, date),
        MatchMode::Strict => {
            let parsed = parse_dates(&record.date, date.year());
            if parsed.is_empty() {
                date_text_matches(&record.date, date)
            } else {
                parsed.contains(&date)
            }
        }
    }
}

/// Keep only records for `date`, preserving order and duplicates.
pub fn filter_today(
    records: Vec<EventRecord>,
    date: NaiveDate,
    config: &FilterConfig,
) -> Vec<EventRecord> {
    records
        .into_iter()
        .filter(|record| is_today(record, date, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(title: &str, date_text: &str) -> EventRecord {
        EventRecord::new(title, date_text, "src", EventKind::SpecialEvent)
    }

    fn strict() -> FilterConfig {
        FilterConfig {
            match_mode: MatchMode::Strict,
            ..FilterConfig::default()
        }
    }

    #[test]
    fn test_each_literal_pattern_is_kept() {
        let today = date(2025, 8, 15);
        let config = FilterConfig::default();
        for pattern in today_patterns(today) {
            assert!(is_today(&record("x", &pattern), today, &config), "{pattern}");
        }
    }

    #[test]
    fn test_patterns_are_unpadded() {
        assert_eq!(
            today_patterns(date(2025, 1, 5)),
            ["1月5日", "1/5", "2025年1月5日", "2025/1/5"].map(String::from)
        );
    }

    #[test]
    fn test_today_marker_ignores_date() {
        let config = FilterConfig::default();
        let today = date(2025, 8, 15);
        assert!(is_today(&record("本日限定 朝市", ""), today, &config));
        assert!(is_today(&record("Open TODAY", "12/24"), today, &config));
        assert!(!is_today(&record("朝市", ""), today, &config));
    }

    #[test]
    fn test_legacy_matches_other_years_and_longer_numbers() {
        let config = FilterConfig::default();
        let today = date(2025, 1, 1);
        assert!(is_today(&record("x", "2024年1月1日"), today, &config));
        assert!(is_today(&record("x", "11/10"), today, &config));
    }

    #[test]
    fn test_strict_compares_real_dates() {
        let config = strict();
        let today = date(2025, 1, 1);
        assert!(!is_today(&record("x", "2024年1月1日"), today, &config));
        assert!(!is_today(&record("x", "11/10"), today, &config));
        assert!(is_today(&record("x", "1/1(水)"), today, &config));
        assert!(is_today(&record("x", "2025/1/1 10:00"), today, &config));
    }

    #[test]
    fn test_strict_falls_back_to_text_when_nothing_parses() {
        let config = strict();
        assert!(!is_today(&record("x", "未定"), date(2025, 1, 1), &config));
    }

    #[test]
    fn test_strict_range_lists_both_ends() {
        let parsed = parse_dates("8月15日～8月16日", 2025);
        assert_eq!(parsed, vec![date(2025, 8, 15), date(2025, 8, 16)]);
    }

    #[test]
    fn test_filter_keeps_duplicates_and_order() {
        let today = date(2025, 8, 15);
        let records = vec![
            record("花火", "8月15日"),
            record("朝市", "8月16日"),
            EventRecord::new("花火", "8月15日", "other", EventKind::SpecialEvent),
        ];
        let kept = filter_today(records, today, &FilterConfig::default());
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].source, "src");
        assert_eq!(kept[1].source, "other");
    }
}
