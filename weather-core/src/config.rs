use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
pub const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// timeout_secs = 10
///
/// [theme]
/// accent_rgb = "111,178,255"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// weatherapi.com key; `WEATHER_API_KEY` takes precedence.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            theme: Theme::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

/// Styling tokens handed to the chart renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub text: String,
    pub font: String,
    /// "r,g,b" of the temperature series.
    pub accent_rgb: String,
    /// "r,g,b" of the feels-like series.
    pub magenta_rgb: String,
    /// "r,g,b" of the UV series.
    pub violet_rgb: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: "#e7eefc".to_string(),
            font: String::new(),
            accent_rgb: "111,178,255".to_string(),
            magenta_rgb: "255,117,195".to_string(),
            violet_rgb: "158,123,255".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// When false every position request is answered with "permission denied".
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { enabled: true, endpoint: DEFAULT_GEO_ENDPOINT.to_string() }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path of the remembered last query.
    pub fn last_query_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_local_dir().join("last_query.json"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    /// The effective API key: environment first, then the file. Blank values
    /// count as absent.
    pub fn api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        Self::pick_api_key(from_env.as_deref(), self.api_key.as_deref())
    }

    fn pick_api_key(from_env: Option<&str>, from_file: Option<&str>) -> Option<String> {
        [from_env, from_file]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|k| !k.is_empty())
            .map(str::to_string)
    }
}
