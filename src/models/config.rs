//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::EventKind;
use crate::utils::parse_selector;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Municipal calendar day view
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Weather forecast feed
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Auxiliary event-listing pages
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Fixed yearly events keyed by month and day
    #[serde(default = "defaults::default_annual_events")]
    pub annual_events: Vec<AnnualEvent>,

    /// Today-filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Posting behavior
    #[serde(default)]
    pub post: PostConfig,

    /// Local time used to decide what "today" is
    #[serde(default)]
    pub timezone: TimezoneConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.calendar.enabled {
            for placeholder in ["{year}", "{month}", "{day}"] {
                if !self.calendar.url_template.contains(placeholder) {
                    return Err(AppError::validation(format!(
                        "calendar.url_template is missing {placeholder}"
                    )));
                }
            }
        }
        if self.weather.enabled && self.weather.area_code.trim().is_empty() {
            return Err(AppError::validation("weather.area_code is empty"));
        }
        for source in &self.sources {
            if source.label.trim().is_empty() {
                return Err(AppError::validation("source label is empty"));
            }
            url::Url::parse(&source.url)?;
            if let Some(selectors) = &source.selectors {
                let mut all = vec![selectors.item.as_str(), selectors.title.as_str()];
                all.extend(selectors.date.as_deref());
                all.extend(selectors.place.as_deref());
                for s in all {
                    parse_selector(s)?;
                }
            }
        }
        for event in &self.annual_events {
            // 2024 is a leap year, so 2/29 stays valid.
            if NaiveDate::from_ymd_opt(2024, event.month, event.day).is_none() {
                return Err(AppError::validation(format!(
                    "annual event '{}' has invalid date {}/{}",
                    event.title, event.month, event.day
                )));
            }
        }
        if !(-12..=14).contains(&self.timezone.utc_offset_hours) {
            return Err(AppError::validation(
                "timezone.utc_offset_hours must be within -12..=14",
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            calendar: CalendarConfig::default(),
            weather: WeatherConfig::default(),
            sources: defaults::default_sources(),
            annual_events: defaults::default_annual_events(),
            filter: FilterConfig::default(),
            post: PostConfig::default(),
            timezone: TimezoneConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Municipal calendar day-view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Source label attached to calendar records
    #[serde(default = "defaults::calendar_label")]
    pub label: String,

    /// URL with `{year}`, `{month}` and `{day}` placeholders
    #[serde(default = "defaults::calendar_url")]
    pub url_template: String,
}

impl CalendarConfig {
    /// Render the day-view URL for a date.
    pub fn url_for(&self, date: NaiveDate) -> String {
        use chrono::Datelike;

        self.url_template
            .replace("{year}", &date.year().to_string())
            .replace("{month}", &date.month().to_string())
            .replace("{day}", &date.day().to_string())
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            label: defaults::calendar_label(),
            url_template: defaults::calendar_url(),
        }
    }
}

/// Weather forecast feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// URL with an `{area_code}` placeholder
    #[serde(default = "defaults::weather_url")]
    pub url_template: String,

    /// Forecast region code
    #[serde(default = "defaults::area_code")]
    pub area_code: String,
}

impl WeatherConfig {
    /// Render the forecast feed URL.
    pub fn url(&self) -> String {
        self.url_template.replace("{area_code}", &self.area_code)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url_template: defaults::weather_url(),
            area_code: defaults::area_code(),
        }
    }
}

/// An auxiliary event-listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Origin label attached to records
    pub label: String,

    /// Page URL, fetched without query parameters
    pub url: String,

    #[serde(default)]
    pub kind: EventKind,

    /// Site-specific selectors tried before the heuristics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<SourceSelectors>,

    /// Class-name keywords accepted by the container heuristic
    #[serde(default = "defaults::class_keywords")]
    pub class_keywords: Vec<String>,

    /// Text keywords accepted by the full-page scan
    #[serde(default = "defaults::text_keywords")]
    pub text_keywords: Vec<String>,
}

/// CSS selectors for scraping a known listing layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSelectors {
    /// Selector for each event item
    pub item: String,

    /// Selector for the title element within an item
    pub title: String,

    /// Selector for the date element within an item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Selector for a place element within an item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

/// A yearly event that always happens on the same month and day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualEvent {
    pub month: u32,
    pub day: u32,
    pub title: String,
}

/// How date text is compared against today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Substring containment of the four rendered date forms
    #[default]
    Legacy,
    /// Parse dates from the text; fall back to substring matching
    Strict,
}

/// Today-filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Title words that mark an event as happening today
    #[serde(default = "defaults::today_markers")]
    pub today_markers: Vec<String>,

    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            today_markers: defaults::today_markers(),
            match_mode: MatchMode::default(),
        }
    }
}

/// Credential scheme used against the posting endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// OAuth 1.0a user context signed with the four key strings
    #[default]
    Oauth1,
    /// OAuth 2.0 user access token sent as a bearer header
    Bearer,
}

/// Posting behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostConfig {
    /// Endpoint that creates a single text post
    #[serde(default = "defaults::post_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub auth: AuthMode,

    /// Post a fixed message when no event survives the filter
    #[serde(default = "defaults::enabled")]
    pub post_when_empty: bool,

    /// Message with `{month}` and `{day}` placeholders
    #[serde(default = "defaults::empty_message")]
    pub empty_message: String,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::post_endpoint(),
            auth: AuthMode::default(),
            post_when_empty: true,
            empty_message: defaults::empty_message(),
        }
    }
}

/// Local time settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneConfig {
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl TimezoneConfig {
    /// Current calendar date at the configured offset.
    pub fn today(&self) -> NaiveDate {
        let offset = FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or(Utc.fix());
        Utc::now().with_timezone(&offset).date_naive()
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: defaults::utc_offset_hours(),
        }
    }
}

mod defaults {
    use super::{AnnualEvent, EventKind, SourceConfig};

    pub fn enabled() -> bool {
        true
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0".into()
    }
    pub fn timeout() -> u64 {
        10
    }

    // Calendar defaults
    pub fn calendar_label() -> String {
        "福知山市イベントカレンダー".into()
    }
    pub fn calendar_url() -> String {
        "https://www.city.fukuchiyama.lg.jp/calendar/index.php?dsp=1&y={year}&m={month}&d={day}"
            .into()
    }

    // Weather defaults
    pub fn weather_url() -> String {
        "https://www.jma.go.jp/bosai/forecast/data/forecast/{area_code}.json".into()
    }
    pub fn area_code() -> String {
        "260000".into()
    }

    // Listing defaults
    pub fn class_keywords() -> Vec<String> {
        ["event", "calendar", "item", "card", "list"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
    pub fn text_keywords() -> Vec<String> {
        vec!["福知山".into(), "ドッコイセ".into()]
    }
    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                label: "福知山観光協会".to_string(),
                url: "https://www.fukuchiyama-kanko.jp/event/".to_string(),
                kind: EventKind::SpecialEvent,
                selectors: None,
                class_keywords: class_keywords(),
                text_keywords: text_keywords(),
            },
            SourceConfig {
                label: "福知山市".to_string(),
                url: "https://www.city.fukuchiyama.lg.jp/site/event/".to_string(),
                kind: EventKind::SpecialEvent,
                selectors: None,
                class_keywords: class_keywords(),
                text_keywords: text_keywords(),
            },
        ]
    }

    // Annual event defaults
    pub fn default_annual_events() -> Vec<AnnualEvent> {
        vec![
            AnnualEvent {
                month: 8,
                day: 15,
                title: "福知山ドッコイセまつり".to_string(),
            },
            AnnualEvent {
                month: 8,
                day: 16,
                title: "福知山ドッコイセまつり 2日目".to_string(),
            },
        ]
    }

    // Filter defaults
    pub fn today_markers() -> Vec<String> {
        vec![
            "本日".into(),
            "今日".into(),
            "today".into(),
            "this day".into(),
        ]
    }

    // Post defaults
    pub fn post_endpoint() -> String {
        "https://api.twitter.com/2/tweets".into()
    }
    pub fn empty_message() -> String {
        "今日({month}月{day}日)は登録されたイベントがありません".into()
    }

    pub fn utc_offset_hours() -> i32 {
        9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_day() {
        let mut config = Config::default();
        config.calendar.url_template = "https://example.com/?y={year}&m={month}".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_impossible_annual_date() {
        let mut config = Config::default();
        config.annual_events.push(AnnualEvent {
            month: 2,
            day: 30,
            title: "存在しない日".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_source_selector() {
        let mut config = Config::default();
        config.sources[0].selectors = Some(SourceSelectors {
            item: "li.event".into(),
            title: "h3".into(),
            date: Some("[[bad".into()),
            place: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn calendar_url_is_rendered_without_padding() {
        let config = CalendarConfig::default();
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            config.url_for(date),
            "https://www.city.fukuchiyama.lg.jp/calendar/index.php?dsp=1&y=2025&m=3&d=7"
        );
    }

    #[test]
    fn weather_url_uses_area_code() {
        let config = WeatherConfig::default();
        assert!(config.url().ends_with("/forecast/260000.json"));
    }

    #[test]
    fn partial_toml_falls_back_to_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [http]
            timeout_secs = 3

            [filter]
            match_mode = "strict"

            [[annual_events]]
            month = 1
            day = 1
            title = "元日"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.timeout_secs, 3);
        assert_eq!(config.http.user_agent, "Mozilla/5.0");
        assert_eq!(config.filter.match_mode, MatchMode::Strict);
        assert_eq!(config.annual_events.len(), 1);
        assert_eq!(config.sources.len(), 2);
        assert!(config.post.post_when_empty);
    }

    #[test]
    fn load_reads_file_and_load_or_default_recovers() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[weather]\nenabled = false").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert!(!config.weather.enabled);

        let fallback = Config::load_or_default("/nonexistent/config.toml");
        assert!(fallback.weather.enabled);
    }
}
