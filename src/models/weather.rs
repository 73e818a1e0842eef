//! Weather forecast snapshot.

use serde::{Deserialize, Serialize};

/// One parsed forecast for the configured region and day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeatherSnapshot {
    /// Forecast text (e.g. "晴れ 時々 くもり")
    pub description: String,

    /// Temperature in degrees Celsius, as reported
    #[serde(default)]
    pub temperature: Option<String>,

    /// Wind text
    #[serde(default)]
    pub wind: Option<String>,

    /// Name of the forecast area
    pub area: String,
}
