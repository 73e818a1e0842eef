// src/pipeline/daily.rs

//! The daily run: weather post, event collection, today-filter, event posts.

use chrono::{Datelike, NaiveDate};

use crate::models::{Config, EventRecord, RunSummary};
use crate::services::filter::filter_today;
use crate::services::format::{format_empty, format_event, format_weather};
use crate::services::Publisher;
use crate::utils::console;
use crate::utils::http::PageFetcher;

use super::collect::{collect_events, fetch_weather};

/// Send one post, logging the outcome. Failures never propagate.
pub async fn publish_logged(publisher: &dyn Publisher, text: &str) -> bool {
    match publisher.publish(text).await {
        Ok(()) => {
            log::info!("✅ posted: {} ...", console::preview(text, 30));
            true
        }
        Err(e) => {
            log::warn!("⚠️ post failed: {}", e);
            false
        }
    }
}

/// Render the posts for today's records, in order.
///
/// Calendar records are numbered `(i/total)` when there is more than one.
pub fn compose_event_posts(records: &[EventRecord]) -> Vec<String> {
    let calendar_total = records.iter().filter(|r| r.is_calendar()).count();
    let mut calendar_index = 0;

    records
        .iter()
        .map(|record| {
            let position = if record.is_calendar() && calendar_total > 1 {
                calendar_index += 1;
                Some((calendar_index, calendar_total))
            } else {
                None
            };
            format_event(record, position)
        })
        .collect()
}

/// Fetch, render and post the weather. Returns whether a post went out.
pub async fn post_weather(
    config: &Config,
    fetcher: &dyn PageFetcher,
    publisher: &dyn Publisher,
    date: NaiveDate,
) -> bool {
    match fetch_weather(config, fetcher).await {
        Ok(snapshot) => publish_logged(publisher, &format_weather(&snapshot, date)).await,
        Err(e) => {
            log::warn!("Weather unavailable: {}", e);
            false
        }
    }
}

/// Collect, filter and render today's event posts without sending them.
pub async fn preview_events(
    config: &Config,
    fetcher: &dyn PageFetcher,
    date: NaiveDate,
) -> Vec<String> {
    let collected = collect_events(config, fetcher, date).await;
    let kept = filter_today(collected.records, date, &config.filter);
    compose_event_posts(&kept)
}

/// Run the whole sequence for `date`.
pub async fn run_daily(
    config: &Config,
    fetcher: &dyn PageFetcher,
    publisher: &dyn Publisher,
    date: NaiveDate,
) -> RunSummary {
    console::header(&format!(
        "Daily run for {}年{}月{}日",
        date.year(),
        date.month(),
        date.day()
    ));
    let mut summary = RunSummary::default();

    console::step(1, 3, "Weather");
    if config.weather.enabled {
        summary.weather_posted = post_weather(config, fetcher, publisher, date).await;
    } else {
        console::sub_item("weather disabled");
    }

    console::step(2, 3, "Collecting events");
    let collected = collect_events(config, fetcher, date).await;
    summary.sources_total = collected.sources_total;
    summary.source_failures = collected.source_failures;
    summary.collected = collected.records.len();

    let kept = filter_today(collected.records, date, &config.filter);
    summary.kept = kept.len();
    log::info!("Today's events: {} of {}", summary.kept, summary.collected);

    console::step(3, 3, "Posting events");
    let posts = if kept.is_empty() {
        if config.post.post_when_empty {
            vec![format_empty(&config.post.empty_message, date)]
        } else {
            console::sub_item("no events today, nothing to post");
            Vec::new()
        }
    } else {
        compose_event_posts(&kept)
    };

    for text in &posts {
        if publish_logged(publisher, text).await {
            summary.posted += 1;
        } else {
            summary.post_failures += 1;
        }
    }

    console::summary(
        "Run complete",
        &[
            ("Weather posted", summary.weather_posted.to_string()),
            (
                "Sources",
                format!(
                    "{} ({} failed)",
                    summary.sources_total, summary.source_failures
                ),
            ),
            ("Collected", summary.collected.to_string()),
            ("Today", summary.kept.to_string()),
            ("Posted", summary.posted.to_string()),
            ("Post failures", summary.post_failures.to_string()),
        ],
    );
    summary
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::{EventKind, SourceConfig};

    const WEATHER_JSON: &str = r#"[{"timeSeries":[{"areas":[{"weathers":["晴れ"],"winds":["北の風"],"area":{"name":"京都府"}}]},{},{"areas":[{"temps":["25"]}]}]}]"#;

    const CALENDAR_HTML: &str = r#"
        <dl class="calendar_day">
          <dt class="t_day"><span>15</span></dt>
          <dd>
            <div class="cal_event_box"><p class="article_title"><a>朝市</a></p></div>
            <div class="cal_event_box"><p class="article_title"><a>福知山花火大会</a></p></div>
          </dd>
        </dl>"#;

    const LISTING_HTML: &str = r#"
        <ul>
          <li class="event-item"><h3>福知山花火大会</h3><span>8月15日</span></li>
          <li class="event-item"><h3>紅葉まつり</h3><span>11月3日</span></li>
        </ul>"#;

    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::fetch(url, "status 404 Not Found"))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        posts: Mutex<Vec<String>>,
        fail_containing: Option<&'static str>,
    }

    impl RecordingPublisher {
        fn posts(&self) -> Vec<String> {
            self.posts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, text: &str) -> Result<()> {
            if let Some(needle) = self.fail_containing {
                if text.contains(needle) {
                    return Err(AppError::publish("403 Forbidden"));
                }
            }
            self.posts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.sources = vec![SourceConfig {
            label: "観光協会".into(),
            url: "https://kanko.example/event/".into(),
            kind: EventKind::SpecialEvent,
            selectors: None,
            class_keywords: vec!["event".into()],
            text_keywords: vec![],
        }];
        config.annual_events.clear();
        config
    }

    fn all_pages(config: &Config) -> FakeFetcher {
        let calendar_url = config.calendar.url_for(date());
        let weather_url = config.weather.url();
        FakeFetcher::new(&[
            (weather_url.as_str(), WEATHER_JSON),
            (calendar_url.as_str(), CALENDAR_HTML),
            ("https://kanko.example/event/", LISTING_HTML),
        ])
    }

    #[tokio::test]
    async fn test_full_run_posts_weather_then_events() {
        let config = config();
        let fetcher = all_pages(&config);
        let publisher = RecordingPublisher::default();

        let summary = run_daily(&config, &fetcher, &publisher, date()).await;
        let posts = publisher.posts();

        assert!(summary.weather_posted);
        assert_eq!(summary.collected, 4);
        assert_eq!(summary.kept, 3);
        assert_eq!(summary.posted, 3);
        assert_eq!(posts.len(), 4);
        assert!(posts[0].starts_with("☀️"));
        assert!(posts[0].contains("気温: 25°C"));
        // Same title from two sources: both posted.
        assert!(posts[1].starts_with("🎆 福知山花火大会\n"));
        assert!(posts[1].contains("🔗 観光協会"));
        assert_eq!(posts[2], "🎉 朝市 (1/2)");
        assert_eq!(posts[3], "🎆 福知山花火大会 (2/2)");
    }

    #[tokio::test]
    async fn test_failed_sources_do_not_stop_the_run() {
        let config = config();
        let calendar_url = config.calendar.url_for(date());
        let fetcher = FakeFetcher::new(&[(calendar_url.as_str(), CALENDAR_HTML)]);
        let publisher = RecordingPublisher::default();

        let summary = run_daily(&config, &fetcher, &publisher, date()).await;

        assert!(!summary.weather_posted);
        assert_eq!(summary.sources_total, 2);
        assert_eq!(summary.source_failures, 1);
        assert_eq!(publisher.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_post_failure_moves_on() {
        let config = config();
        let fetcher = all_pages(&config);
        let publisher = RecordingPublisher {
            fail_containing: Some("朝市"),
            ..RecordingPublisher::default()
        };

        let summary = run_daily(&config, &fetcher, &publisher, date()).await;

        assert_eq!(summary.posted, 2);
        assert_eq!(summary.post_failures, 1);
        assert_eq!(publisher.posts().last().unwrap(), "🎆 福知山花火大会 (2/2)");
    }

    #[tokio::test]
    async fn test_empty_day_posts_fixed_message() {
        let mut config = config();
        config.weather.enabled = false;
        let fetcher = FakeFetcher::new(&[]);
        let publisher = RecordingPublisher::default();

        let summary = run_daily(&config, &fetcher, &publisher, date()).await;

        assert_eq!(summary.kept, 0);
        assert_eq!(
            publisher.posts(),
            vec!["今日(8月15日)は登録されたイベントがありません".to_string()]
        );

        config.post.post_when_empty = false;
        let publisher = RecordingPublisher::default();
        run_daily(&config, &fetcher, &publisher, date()).await;
        assert!(publisher.posts().is_empty());
    }

    #[tokio::test]
    async fn test_preview_does_not_need_a_publisher() {
        let config = config();
        let fetcher = all_pages(&config);
        let posts = preview_events(&config, &fetcher, date()).await;
        assert_eq!(posts.len(), 3);
    }

    #[tokio::test]
    async fn test_annual_entry_is_posted_on_its_day() {
        let mut config = config();
        config.calendar.enabled = false;
        config.sources.clear();
        config.annual_events = Config::default().annual_events;
        let posts = preview_events(&config, &FakeFetcher::new(&[]), date()).await;
        assert_eq!(posts, vec!["🏮 福知山ドッコイセまつり\n📅 8月15日\n🔗 年間行事"]);
    }

    #[test]
    fn test_single_calendar_event_is_not_numbered() {
        let records = vec![EventRecord::new(
            "朝市",
            "2025年8月15日",
            "cal",
            EventKind::CalendarEvent,
        )];
        assert_eq!(compose_event_posts(&records), vec!["🎉 朝市"]);
    }
}
