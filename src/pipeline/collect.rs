// src/pipeline/collect.rs

//! Event and weather collection.
//!
//! Sources are fetched one after another. A source that fails to fetch
//! contributes nothing and the run carries on with the rest.

use chrono::{Datelike, NaiveDate};

use crate::error::Result;
use crate::models::{Config, EventKind, EventRecord, WeatherSnapshot};
use crate::services::{
    CalendarDayStrategy, ExtractContext, ExtractStrategy, annual, extract_first_non_empty,
    listing, weather,
};
use crate::utils::http::PageFetcher;

/// Records gathered from every source, plus fetch counters.
#[derive(Debug, Default)]
pub struct Collected {
    pub records: Vec<EventRecord>,
    pub sources_total: usize,
    pub source_failures: usize,
}

/// Fetch and parse the weather feed.
pub async fn fetch_weather(config: &Config, fetcher: &dyn PageFetcher) -> Result<WeatherSnapshot> {
    let body = fetcher.fetch_text(&config.weather.url()).await?;
    weather::parse_forecast(&body)
}

/// Fetch one page and run its strategies. Fetch errors yield `None`.
async fn scrape_page(
    fetcher: &dyn PageFetcher,
    url: &str,
    strategies: &[Box<dyn ExtractStrategy>],
    ctx: &ExtractContext,
) -> Option<Vec<EventRecord>> {
    match fetcher.fetch_text(url).await {
        Ok(html) => {
            let records = extract_first_non_empty(strategies, &html, ctx);
            log::info!("[{}] {} records", ctx.label, records.len());
            Some(records)
        }
        Err(e) => {
            log::warn!("[{}] fetch failed ({}): {}", ctx.label, url, e);
            None
        }
    }
}

/// Gather records for `date`: listing sources, the annual table, then the
/// calendar, concatenated in that order. No deduplication.
pub async fn collect_events(
    config: &Config,
    fetcher: &dyn PageFetcher,
    date: NaiveDate,
) -> Collected {
    let mut collected = Collected::default();

    for source in &config.sources {
        collected.sources_total += 1;
        let ctx = ExtractContext::new(date, source.label.clone(), source.kind);
        let strategies = listing::strategies_for(source);
        match scrape_page(fetcher, &source.url, &strategies, &ctx).await {
            Some(records) => collected.records.extend(records),
            None => collected.source_failures += 1,
        }
    }

    let annual = annual::lookup(&config.annual_events, date.month(), date.day());
    log::info!("[{}] {} records", annual::ANNUAL_LABEL, annual.len());
    collected.records.extend(annual);

    if config.calendar.enabled {
        collected.sources_total += 1;
        let ctx = ExtractContext::new(
            date,
            config.calendar.label.clone(),
            EventKind::CalendarEvent,
        );
        let strategies: Vec<Box<dyn ExtractStrategy>> = vec![Box::new(CalendarDayStrategy::new())];
        let url = config.calendar.url_for(date);
        match scrape_page(fetcher, &url, &strategies, &ctx).await {
            Some(records) => collected.records.extend(records),
            None => collected.source_failures += 1,
        }
    }

    collected
}
