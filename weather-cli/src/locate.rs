//! IP-based stand-in for a device position.
//!
//! A terminal has no GPS, so the position comes from an IP geolocation
//! service. The answer is coarse (city level) but good enough for a forecast.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::debug;
use weather_core::{
    Coordinates, GeoOptions, GeolocationError, Geolocator, config::GeolocationConfig,
};

#[derive(Debug)]
pub struct IpGeolocator {
    http: Client,
    endpoint: String,
    enabled: bool,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl IpGeolocator {
    pub fn new(config: &GeolocationConfig) -> Result<Self> {
        let http = Client::builder().build().context("Failed to build geolocation HTTP client")?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            enabled: config.enabled,
            last_fix: Mutex::new(None),
        })
    }

    fn cached(&self, maximum_age: Duration) -> Option<Coordinates> {
        let guard = self.last_fix.lock().ok()?;
        (*guard).filter(|(at, _)| at.elapsed() <= maximum_age).map(|(_, c)| c)
    }

    fn remember(&self, coords: Coordinates) {
        if let Ok(mut guard) = self.last_fix.lock() {
            *guard = Some((Instant::now(), coords));
        }
    }
}

/// Accepts both ip-api.com (`lat`/`lon`) and ipapi.co (`latitude`/`longitude`)
/// field names.
#[derive(Debug, Deserialize)]
struct IpLookup {
    status: Option<String>,
    message: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

fn classify(e: reqwest::Error) -> GeolocationError {
    if e.is_timeout() { GeolocationError::Timeout } else { GeolocationError::PositionUnavailable }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(
        &self,
        options: &GeoOptions,
    ) -> Result<Coordinates, GeolocationError> {
        if !self.enabled {
            return Err(GeolocationError::PermissionDenied);
        }

        if let Some(coords) = self.cached(options.maximum_age) {
            debug!("Reusing cached position");
            return Ok(coords);
        }

        // IP lookups have a single accuracy level; `high_accuracy` is a no-op.
        let res = self
            .http
            .get(&self.endpoint)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(classify)?;

        if !res.status().is_success() {
            debug!(status = %res.status(), "Geolocation endpoint refused");
            return Err(GeolocationError::PositionUnavailable);
        }

        let body: IpLookup = res.json().await.map_err(classify)?;
        if body.status.as_deref() == Some("fail") {
            debug!(message = ?body.message, "Geolocation lookup failed");
            return Err(GeolocationError::PositionUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => {
                let coords = Coordinates { latitude, longitude };
                self.remember(coords);
                Ok(coords)
            }
            _ => Err(GeolocationError::PositionUnavailable),
        }
    }
}
