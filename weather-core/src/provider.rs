use crate::{Config, NormalizedWeather, WeatherError, provider::weatherapi::WeatherApiProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod weatherapi;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// One network round trip for a one-day forecast of `query`.
    async fn fetch_weather(&self, query: &str) -> Result<NormalizedWeather, WeatherError>;
}

/// Construct the weatherapi.com provider from config.
///
/// A missing or blank API key is fatal: without it no lookup can succeed.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for weatherapi.com.\n\
                 Hint: run `weather configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let provider = WeatherApiProvider::new(
        api_key,
        &config.base_url,
        Duration::from_secs(config.timeout_secs),
    )?;

    Ok(Arc::new(provider))
}
