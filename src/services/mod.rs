//! Service layer for the poster application.
//!
//! This module contains the business logic for:
//! - Page extraction strategies (`extract`, `calendar`, `listing`)
//! - The annual events table (`annual`)
//! - Forecast parsing (`weather`)
//! - The today-filter (`filter`)
//! - Post rendering (`format`)
//! - Publishing (`publish`)

pub mod annual;
pub mod calendar;
pub mod extract;
pub mod filter;
pub mod format;
pub mod listing;
pub mod publish;
pub mod weather;

pub use calendar::CalendarDayStrategy;
pub use extract::{ExtractContext, ExtractStrategy, extract_first_non_empty};
pub use publish::{DryRunPublisher, Publisher, XPublisher};
