//! Event record data structure.

use serde::{Deserialize, Serialize};

/// Where a record came from, which decides how it is rendered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Entry from the municipal calendar day view
    CalendarEvent,
    /// Entry from a listing page or the annual table
    #[default]
    SpecialEvent,
}

/// One scraped event entry.
///
/// Records have no identity beyond title and date. Two sources reporting the
/// same title produce two records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// Event title
    pub title: String,

    /// Freeform date text, formatted however the source writes it
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// Origin label of the source
    pub source: String,

    pub kind: EventKind,
}

impl EventRecord {
    /// Create a record with only the mandatory fields set.
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        source: impl Into<String>,
        kind: EventKind,
    ) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            category: None,
            comment: None,
            time: None,
            place: None,
            contact: None,
            source: source.into(),
            kind,
        }
    }

    /// Whether the record came from the calendar day view.
    pub fn is_calendar(&self) -> bool {
        self.kind == EventKind::CalendarEvent
    }
}

/// Turn an extracted string into an optional field, dropping blanks.
pub fn non_empty(text: impl Into<String>) -> Option<String> {
    let text = text.into();
    if text.trim().is_empty() {
        None
    } else {
        Some(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_leaves_optional_fields_empty() {
        let record = EventRecord::new("花火", "8月15日", "観光協会", EventKind::SpecialEvent);
        assert!(record.category.is_none());
        assert!(record.contact.is_none());
        assert!(!record.is_calendar());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" 市民会館 "), Some("市民会館".to_string()));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EventKind::CalendarEvent).unwrap();
        assert_eq!(json, "\"calendar_event\"");
    }
}
