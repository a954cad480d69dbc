use serde::{Deserialize, Serialize};

/// Provider response mapped into the shape the view consumes.
///
/// Built fresh for every request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeather {
    /// "City, Country".
    pub title: String,
    pub timezone_id: String,
    pub lat: f64,
    pub lon: f64,
    pub current: CurrentConditions,
    pub day: DaySummary,
    pub astro: Astro,
    pub aqi: AirQuality,
    /// Either empty or every hour of the forecast day, in provider order.
    pub hourly: Vec<HourlyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feels_like: f64,
    pub uv: f64,
    pub condition_text: String,
    /// Absolute URL, or empty when the provider sent no icon.
    pub icon_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub uv: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Astro {
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub moon_phase: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQuality {
    /// US-EPA category, nominally 1..=6. Out-of-range values pass through.
    pub us_epa_index: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// "YYYY-MM-DD HH:MM" as sent by the provider.
    pub time: String,
    /// The "HH:MM" part of `time`.
    pub hhmm: String,
    pub temp: f64,
    pub feels_like: f64,
    pub uv: f64,
}

/// The most recent successful lookup: what to show on the chip and what to
/// send when it is reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastQuery {
    pub label: String,
    pub q: String,
}
