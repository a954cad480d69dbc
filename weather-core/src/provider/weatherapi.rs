use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    ErrorDetail, ErrorKind, WeatherError,
    model::{AirQuality, Astro, CurrentConditions, DaySummary, HourlyPoint, NormalizedWeather},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    /// Fails with `UNAUTHORIZED` when the key is blank.
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(WeatherError::new(ErrorKind::Unauthorized, "Invalid or missing API key."));
        }

        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            WeatherError::new(ErrorKind::Network, "Failed to build HTTP client.").with_source(e)
        })?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    #[instrument(skip(self))]
    async fn fetch_weather(&self, query: &str) -> Result<NormalizedWeather, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::validation("City name is required."));
        }

        let url = format!("{}/forecast.json", self.base_url);
        debug!(url = %url, "Requesting one-day forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("days", "1"),
                ("aqi", "yes"),
                ("lang", "en"),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(network_error)?;

        let data: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            debug!(status, body = %truncate_body(&body), "Unparseable WeatherAPI body");
            WeatherError::new(ErrorKind::Parse, "Invalid response.").with_source(e)
        })?;

        let provider_error = data.get("error").filter(|e| !e.is_null());
        if !(200..300).contains(&status) || provider_error.is_some() {
            let body = provider_error
                .and_then(|e| serde_json::from_value::<WaError>(e.clone()).ok())
                .unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let parsed: WaForecastResponse = serde_json::from_value(data).map_err(|e| {
            WeatherError::new(ErrorKind::Parse, "Unexpected response shape.").with_source(e)
        })?;

        normalize_response(parsed)
    }
}

fn network_error(e: reqwest::Error) -> WeatherError {
    WeatherError::new(ErrorKind::Network, "Network error.").with_source(e)
}

/// Provider error codes take precedence over the HTTP status.
fn classify_failure(status: u16, error: WaError) -> WeatherError {
    let kind = match error.code {
        Some(1006) => ErrorKind::NotFound,
        Some(2006..=2008) => ErrorKind::Unauthorized,
        _ => match status {
            401 => ErrorKind::Unauthorized,
            429 => ErrorKind::RateLimit,
            other => ErrorKind::Http(other),
        },
    };

    let message = error
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));

    WeatherError::new(kind, message)
        .with_detail(ErrorDetail { status, provider_code: error.code })
}

fn normalize_response(parsed: WaForecastResponse) -> Result<NormalizedWeather, WeatherError> {
    let day = parsed
        .forecast
        .and_then(|f| f.forecastday.into_iter().next())
        .ok_or_else(|| WeatherError::new(ErrorKind::Data, "No forecast data."))?;

    let (location, current) = match (parsed.location, parsed.current) {
        (Some(location), Some(current)) => (location, current),
        _ => {
            return Err(WeatherError::new(
                ErrorKind::Parse,
                "Response is missing location or current conditions.",
            ));
        }
    };

    let condition = current.condition.unwrap_or_default();
    let summary = day.day.unwrap_or_default();
    let astro = day.astro.unwrap_or_default();

    Ok(NormalizedWeather {
        title: format!("{}, {}", location.name, location.country),
        timezone_id: location.tz_id,
        lat: location.lat,
        lon: location.lon,
        current: CurrentConditions {
            temp: current.temp_c,
            feels_like: current.feelslike_c,
            uv: current.uv,
            condition_text: condition.text,
            icon_url: absolute_icon_url(&condition.icon),
        },
        day: DaySummary { max: summary.maxtemp_c, min: summary.mintemp_c, uv: summary.uv },
        astro: Astro {
            sunrise: non_empty(astro.sunrise),
            sunset: non_empty(astro.sunset),
            moon_phase: non_empty(astro.moon_phase),
        },
        aqi: AirQuality { us_epa_index: current.air_quality.and_then(|a| a.us_epa_index) },
        hourly: day.hour.into_iter().map(hourly_point).collect(),
    })
}

/// weatherapi.com serves icons as `//cdn.weatherapi.com/...`.
fn absolute_icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

fn hourly_point(h: WaHour) -> HourlyPoint {
    let hhmm = h.time.split(' ').nth(1).unwrap_or_default().to_string();
    HourlyPoint { time: h.time, hhmm, temp: h.temp_c, feels_like: h.feelslike_c, uv: h.uv }
}

#[derive(Debug, Default, Deserialize)]
struct WaError {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    tz_id: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WaCondition {
    #[serde(default)]
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaAirQuality {
    #[serde(rename = "us-epa-index")]
    us_epa_index: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    #[serde(default)]
    uv: f64,
    condition: Option<WaCondition>,
    air_quality: Option<WaAirQuality>,
}

#[derive(Debug, Default, Deserialize)]
struct WaDay {
    maxtemp_c: Option<f64>,
    mintemp_c: Option<f64>,
    uv: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct WaAstro {
    sunrise: Option<String>,
    sunset: Option<String>,
    moon_phase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    time: String,
    temp_c: f64,
    feelslike_c: f64,
    #[serde(default)]
    uv: f64,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    day: Option<WaDay>,
    astro: Option<WaAstro>,
    #[serde(default)]
    hour: Vec<WaHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    #[serde(default)]
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: Option<WaLocation>,
    current: Option<WaCurrent>,
    forecast: Option<WaForecast>,
}
