// src/services/weather.rs

//! Forecast feed parsing.
//!
//! The feed is a JSON array whose first element holds `timeSeries`. Series 0
//! carries the weather text, wind and area name; series 2, when present,
//! carries temperatures. A bare forecast object is accepted as well.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::WeatherSnapshot;
use crate::utils::normalize_whitespace;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Feed {
    Many(Vec<Forecast>),
    One(Forecast),
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(rename = "timeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct TimeSeries {
    #[serde(default)]
    areas: Vec<AreaForecast>,
}

#[derive(Debug, Default, Deserialize)]
struct AreaForecast {
    #[serde(default)]
    area: Option<AreaName>,
    #[serde(default)]
    weathers: Vec<String>,
    #[serde(default)]
    winds: Vec<String>,
    #[serde(default)]
    temps: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AreaName {
    #[serde(default)]
    name: String,
}

/// Parse the forecast feed into a snapshot for the first area.
pub fn parse_forecast(json: &str) -> Result<WeatherSnapshot> {
    let forecast = match serde_json::from_str::<Feed>(json)? {
        Feed::Many(list) => list
            .into_iter()
            .next()
            .ok_or_else(|| AppError::parse("forecast feed is an empty array"))?,
        Feed::One(forecast) => forecast,
    };

    let area = forecast
        .time_series
        .first()
        .and_then(|series| series.areas.first())
        .ok_or_else(|| AppError::parse("forecast has no area in the first series"))?;

    let description = area
        .weathers
        .first()
        .map(|w| normalize_whitespace(w))
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::parse("forecast has no weather text"))?;

    let temperature = forecast
        .time_series
        .get(2)
        .and_then(|series| series.areas.first())
        .and_then(|a| a.temps.first())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(WeatherSnapshot {
        description,
        temperature,
        wind: area
            .winds
            .first()
            .map(|w| normalize_whitespace(w))
            .filter(|w| !w.is_empty()),
        area: area
            .area
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"timeSeries":[{"areas":[{"weathers":["晴れ"],"winds":["北の風"],"area":{"name":"京都府"}}]},{},{"areas":[{"temps":["25"]}]}]}"#;

    #[test]
    fn test_bare_object() {
        let snapshot = parse_forecast(BARE).unwrap();
        assert_eq!(snapshot.description, "晴れ");
        assert_eq!(snapshot.temperature.as_deref(), Some("25"));
        assert_eq!(snapshot.wind.as_deref(), Some("北の風"));
        assert_eq!(snapshot.area, "京都府");
    }

    #[test]
    fn test_array_feed_and_fullwidth_spaces() {
        let json = r#"[{"timeSeries":[{"areas":[
            {"area":{"name":"南部","code":"260010"},"weathers":["くもり　時々　雨"],"winds":["北の風　後　南の風"]},
            {"area":{"name":"北部","code":"260020"},"weathers":["雪"]}
        ]}]},{"timeSeries":[]}]"#;
        let snapshot = parse_forecast(json).unwrap();
        assert_eq!(snapshot.description, "くもり 時々 雨");
        assert_eq!(snapshot.wind.as_deref(), Some("北の風 後 南の風"));
        assert_eq!(snapshot.area, "南部");
        assert!(snapshot.temperature.is_none());
    }

    #[test]
    fn test_missing_weather_text_is_parse_error() {
        let json = r#"{"timeSeries":[{"areas":[{"area":{"name":"京都府"}}]}]}"#;
        assert!(matches!(parse_forecast(json), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_invalid_json_errors() {
        assert!(parse_forecast("<html>").is_err());
    }
}
