//! Render commands emitted by the view controller.
//!
//! The controller never draws anything itself. A [`Renderer`] receives a
//! stream of commands and maps them onto whatever surface it owns (a terminal,
//! a test recorder, a GUI).

use crate::{
    config::Theme,
    model::{HourlyPoint, NormalizedWeather},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Search,
    Forecast,
}

/// Text slots of the forecast view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    City,
    CurrentTemp,
    MaxTemp,
    MinTemp,
    FeelsLike,
    Uv,
    Condition,
    Sunrise,
    Sunset,
    MoonPhase,
    Aqi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    Temperature,
    Uv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub data: Vec<f64>,
    /// "r,g,b" theme token.
    pub rgb: String,
}

impl Series {
    pub fn rgba(&self, alpha: f32) -> String {
        format!("rgba({}, {alpha})", self.rgb)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub id: ChartId,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    /// Appended to y-axis tick values.
    pub y_suffix: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    ShowView(View),
    SetText { field: Field, text: String },
    SetIcon { src: String, srcset: Option<String>, alt: String },
    /// Search button state while a request is in flight.
    SetBusy { busy: bool, label: String },
    SetSpinner(bool),
    ShowError(String),
    HideError,
    SetInput(String),
    SetInputInvalid(bool),
    SetLocateButton { enabled: bool, label: String },
    /// Chip offering the remembered query; `None` hides it.
    SetLastChip(Option<String>),
    SetFaded(bool),
    ConfigureCharts { text_color: String, font: Option<String> },
    DrawChart(ChartSpec),
    DestroyChart(ChartId),
}

pub trait Renderer: Send {
    fn apply(&mut self, command: RenderCommand);
}

/// Round half up, so -2.5 becomes -2 and 2.5 becomes 3.
pub fn round_half_up(n: f64) -> f64 {
    let floor = n.floor();
    if n - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Whole degrees Celsius with a non-breaking space before the unit.
pub fn deg(n: f64) -> String {
    format!("{}\u{a0}°C", round_half_up(n))
}

fn opt_deg(n: Option<f64>) -> String {
    n.map(deg).unwrap_or_else(|| "-".to_string())
}

/// Text commands for every field of the forecast view.
pub fn field_commands(weather: &NormalizedWeather) -> Vec<RenderCommand> {
    let dash = |s: &Option<String>| s.clone().unwrap_or_else(|| "-".to_string());
    let aqi = weather.aqi.us_epa_index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string());

    [
        (Field::City, weather.title.clone()),
        (Field::CurrentTemp, deg(weather.current.temp)),
        (Field::MaxTemp, opt_deg(weather.day.max)),
        (Field::MinTemp, opt_deg(weather.day.min)),
        (Field::FeelsLike, deg(weather.current.feels_like)),
        (Field::Uv, weather.current.uv.to_string()),
        (Field::Condition, weather.current.condition_text.clone()),
        (Field::Sunrise, format!("Sunrise: {}", dash(&weather.astro.sunrise))),
        (Field::Sunset, format!("Sunset: {}", dash(&weather.astro.sunset))),
        (Field::MoonPhase, format!("Moon phase: {}", dash(&weather.astro.moon_phase))),
        (Field::Aqi, format!("Air Quality (US EPA): {aqi}")),
    ]
    .into_iter()
    .map(|(field, text)| RenderCommand::SetText { field, text })
    .collect()
}

/// Icon command, preferring the provider's 128px variant.
pub fn icon_command(weather: &NormalizedWeather) -> RenderCommand {
    let icon = &weather.current.icon_url;
    let alt = if weather.current.condition_text.is_empty() {
        "weather icon".to_string()
    } else {
        weather.current.condition_text.clone()
    };

    if icon.is_empty() {
        return RenderCommand::SetIcon { src: String::new(), srcset: None, alt };
    }

    let large = icon.replace("/64x64/", "/128x128/");
    RenderCommand::SetIcon { srcset: Some(format!("{icon} 1x, {large} 2x")), src: large, alt }
}

/// Temperature and UV charts for an hourly sequence, or `None` when there is
/// nothing to plot.
pub fn charts_from(hourly: &[HourlyPoint], theme: &Theme) -> Option<(ChartSpec, ChartSpec)> {
    if hourly.is_empty() {
        return None;
    }

    let labels: Vec<String> = hourly.iter().map(|h| h.hhmm.clone()).collect();
    let temps = hourly.iter().map(|h| round_half_up(h.temp)).collect();
    let feels = hourly.iter().map(|h| round_half_up(h.feels_like)).collect();
    let uvs = hourly.iter().map(|h| h.uv).collect();

    let temperature = ChartSpec {
        id: ChartId::Temperature,
        labels: labels.clone(),
        series: vec![
            Series { label: "Temp (°C)".into(), data: temps, rgb: theme.accent_rgb.clone() },
            Series {
                label: "Feels like (°C)".into(),
                data: feels,
                rgb: theme.magenta_rgb.clone(),
            },
        ],
        y_suffix: "°",
    };

    let uv = ChartSpec {
        id: ChartId::Uv,
        labels,
        series: vec![Series { label: "UV index".into(), data: uvs, rgb: theme.violet_rgb.clone() }],
        y_suffix: "",
    };

    Some((temperature, uv))
}
