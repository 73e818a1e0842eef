//! Annual events table.

use crate::models::{AnnualEvent, EventKind, EventRecord};

/// Label stamped on records from the annual table.
pub const ANNUAL_LABEL: &str = "年間行事";

/// Records for every table entry on `month`/`day`, in table order.
pub fn lookup(table: &[AnnualEvent], month: u32, day: u32) -> Vec<EventRecord> {
    table
        .iter()
        .filter(|event| event.month == month && event.day == day)
        .map(|event| {
            EventRecord::new(
                event.title.clone(),
                format!("{month}月{day}日"),
                ANNUAL_LABEL,
                EventKind::SpecialEvent,
            )
        })
        .collect()
}
