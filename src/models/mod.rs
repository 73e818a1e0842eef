// src/models/mod.rs

//! Domain models for the poster application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod credentials;
mod event;
mod weather;

// Re-export all public types
pub use config::{
    AnnualEvent, AuthMode, CalendarConfig, Config, FilterConfig, HttpConfig, MatchMode,
    PostConfig, SourceConfig, SourceSelectors, TimezoneConfig, WeatherConfig,
};
pub use credentials::{
    Credentials, ENV_ACCESS_SECRET, ENV_ACCESS_TOKEN, ENV_API_KEY, ENV_API_SECRET,
    ENV_BEARER_TOKEN,
};
pub use event::{EventKind, EventRecord, non_empty};
pub use weather::WeatherSnapshot;

/// Counters for one orchestrated run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub weather_posted: bool,
    pub sources_total: usize,
    pub source_failures: usize,
    pub collected: usize,
    pub kept: usize,
    pub posted: usize,
    pub post_failures: usize,
}
