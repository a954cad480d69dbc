//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Query classification and resolution (free text, coordinates, "my location")
//! - The weatherapi.com client and its error taxonomy
//! - Persistence of the last successful lookup
//! - The view controller that drives search → result → search and emits
//!   render commands
//!
//! It is used by `weather-cli`, but can also be reused by other front-ends
//! that implement [`Renderer`].

pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod query;
pub mod render;
pub mod store;
pub mod timer;

pub use config::{Config, Theme};
pub use controller::{LocateError, ViewController, ViewModel, ViewState};
pub use error::{ErrorDetail, ErrorKind, WeatherError};
pub use geolocation::{Coordinates, GeoOptions, GeolocationError, Geolocator};
pub use model::{LastQuery, NormalizedWeather};
pub use provider::{WeatherProvider, provider_from_config, weatherapi::WeatherApiProvider};
pub use render::{RenderCommand, Renderer};
pub use store::{FileStore, LastQueryStore, MemoryStore};
