// src/services/format.rs

//! Post text rendering.
//!
//! Every post is a line-structured block: a leading emoji picked by keyword,
//! then labelled fields in a fixed order, each omitted when empty. The
//! rendered text is cut to [`MAX_POST_CHARS`] afterwards.

use chrono::{Datelike, NaiveDate};

use crate::models::{EventRecord, WeatherSnapshot};
use crate::utils::{contains_ignore_case, truncate_chars};

/// Character ceiling of a single post.
pub const MAX_POST_CHARS: usize = 280;

/// Weather icons, first match wins.
const WEATHER_ICONS: &[(&[&str], &str)] = &[
    (&["雨", "rain"], "☔"),
    (&["雪", "snow"], "❄️"),
    (&["曇", "くもり", "cloud"], "☁️"),
    (&["霧", "fog"], "🌫️"),
];
const SUN_ICON: &str = "☀️";

/// Event icons, first match wins.
const EVENT_ICONS: &[(&[&str], &str)] = &[
    (&["花火", "fireworks"], "🎆"),
    (&["まつり", "祭", "matsuri"], "🏮"),
    (&["フェス", "festival"], "🎪"),
    (&["コンサート", "演奏会", "ライブ", "concert"], "🎵"),
    (&["大会", "コンテスト", "competition"], "🏆"),
];
const DEFAULT_EVENT_ICON: &str = "🎉";

fn pick_icon(text: &str, table: &[(&[&str], &'static str)], default: &'static str) -> &'static str {
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| contains_ignore_case(text, k)))
        .map_or(default, |(_, icon)| *icon)
}

/// Icon for a weather description: rain > snow > cloud > fog > sun.
pub fn weather_icon(description: &str) -> &'static str {
    pick_icon(description, WEATHER_ICONS, SUN_ICON)
}

/// Icon for an event, judged on its title, category and description.
pub fn event_icon(record: &EventRecord) -> &'static str {
    let text = format!(
        "{} {} {}",
        record.title,
        record.category.as_deref().unwrap_or_default(),
        record.comment.as_deref().unwrap_or_default()
    );
    pick_icon(&text, EVENT_ICONS, DEFAULT_EVENT_ICON)
}

/// Cut a rendered post to the ceiling.
pub fn finalize(text: &str) -> String {
    truncate_chars(text, MAX_POST_CHARS)
}

/// Render the weather post.
pub fn format_weather(snapshot: &WeatherSnapshot, date: NaiveDate) -> String {
    let mut lines = vec![format!(
        "{} {}月{}日の天気",
        weather_icon(&snapshot.description),
        date.month(),
        date.day()
    )];
    lines.push(format!("天気: {}", snapshot.description));
    if let Some(temp) = &snapshot.temperature {
        lines.push(format!("気温: {temp}°C"));
    }
    if let Some(wind) = &snapshot.wind {
        lines.push(format!("風: {wind}"));
    }
    if !snapshot.area.is_empty() {
        lines.push(format!("予報エリア: {}", snapshot.area));
    }
    finalize(&lines.join("\n"))
}

/// Render one event post.
///
/// `position` is `(index, total)`, both 1-based, and adds an `(i/total)`
/// label to the first line.
pub fn format_event(record: &EventRecord, position: Option<(usize, usize)>) -> String {
    let mut head = format!("{} {}", event_icon(record), record.title);
    if let Some((i, total)) = position {
        head.push_str(&format!(" ({i}/{total})"));
    }

    let mut lines = vec![head];
    let mut push = |prefix: &str, value: &Option<String>| {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("{prefix}{v}"));
        }
    };
    push("カテゴリ: ", &record.category);
    push("", &record.comment);
    push("⏰ ", &record.time);
    push("📍 ", &record.place);
    push("📞 ", &record.contact);

    if !record.is_calendar() {
        if !record.date.is_empty() {
            lines.push(format!("📅 {}", record.date));
        }
        if !record.source.is_empty() {
            lines.push(format!("🔗 {}", record.source));
        }
    }
    finalize(&lines.join("\n"))
}

/// Render the "no events today" post from a `{month}`/`{day}` template.
pub fn format_empty(template: &str, date: NaiveDate) -> String {
    finalize(
        &template
            .replace("{month}", &date.month().to_string())
            .replace("{day}", &date.day().to_string()),
    )
}
