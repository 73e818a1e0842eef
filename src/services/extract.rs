// src/services/extract.rs

//! Ordered extraction strategies.
//!
//! A page is handed to each strategy in turn and the first non-empty result
//! wins. Targeted strategies come first, heuristics last.

use chrono::NaiveDate;
use scraper::Html;

use crate::error::Result;
use crate::models::{EventKind, EventRecord};

/// Everything a strategy needs besides the markup itself.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Day being rendered
    pub date: NaiveDate,
    /// Origin label stamped on every record
    pub label: String,
    pub kind: EventKind,
}

impl ExtractContext {
    pub fn new(date: NaiveDate, label: impl Into<String>, kind: EventKind) -> Self {
        Self {
            date,
            label: label.into(),
            kind,
        }
    }

    /// Start a record carrying this context's label and kind.
    pub fn record(&self, title: impl Into<String>, date: impl Into<String>) -> EventRecord {
        EventRecord::new(title, date, self.label.clone(), self.kind)
    }
}

/// One way of turning a parsed page into event records.
pub trait ExtractStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Extract records. An empty vector means "nothing recognised here".
    fn extract(&self, document: &Html, ctx: &ExtractContext) -> Result<Vec<EventRecord>>;
}

/// Run `strategies` in order over `html` and keep the first non-empty result.
///
/// A strategy that errors is logged and skipped.
pub fn extract_first_non_empty(
    strategies: &[Box<dyn ExtractStrategy>],
    html: &str,
    ctx: &ExtractContext,
) -> Vec<EventRecord> {
    let document = Html::parse_document(html);

    for strategy in strategies {
        match strategy.extract(&document, ctx) {
            Ok(records) if !records.is_empty() => {
                log::debug!(
                    "[{}] strategy '{}' found {} records",
                    ctx.label,
                    strategy.name(),
                    records.len()
                );
                return records;
            }
            Ok(_) => {
                log::debug!("[{}] strategy '{}' found nothing", ctx.label, strategy.name());
            }
            Err(e) => {
                log::warn!("[{}] strategy '{}' failed: {}", ctx.label, strategy.name(), e);
            }
        }
    }
    Vec::new()
}
