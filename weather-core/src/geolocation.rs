//! Position capability used by the "use my location" action.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Coordinate-normalised query for this position.
    pub fn to_query(&self) -> String {
        crate::query::format_coordinates(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// A previously obtained fix younger than this may be returned.
    pub maximum_age: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(8_000),
            maximum_age: Duration::from_millis(300_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timed out")]
    Timeout,
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => "Permission denied. Enable location access.",
            GeolocationError::PositionUnavailable => "Position unavailable.",
            GeolocationError::Timeout => "Timed out. Try again.",
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self, options: &GeoOptions)
    -> Result<Coordinates, GeolocationError>;
}
