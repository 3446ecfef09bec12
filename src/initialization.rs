use std::{env, fs};
use std::time::Duration;
use serde::Deserialize;
use crate::errors::ConfigError;

pub const WEATHER_KEY_VAR: &str = "OPENWEATHERMAP_API_KEY";
pub const AI_KEY_VAR: &str = "GEMINI_API_KEY";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct General {
    pub log_path: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WebServer {
    pub bind_address: String,
    pub bind_port: u16,
    /// Browser origins allowed to call the api, `*` allows any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WeatherSettings {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_geo_url")]
    pub geo_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AISettings {
    #[serde(default = "default_ai_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_forecast_days")]
    pub forecast_days: usize,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_geolocation_timeout_secs")]
    pub geolocation_timeout_secs: u64,
}

/// Provider credentials, only ever taken from the environment
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub weather: String,
    pub ai: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub general: General,
    pub web_server: WebServer,
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub ai: AISettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(skip)]
    pub keys: ApiKeys,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            geo_url: default_geo_url(),
            timeout_secs: default_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            base_url: default_ai_url(),
            model: default_ai_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DashboardSettings {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            forecast_days: default_forecast_days(),
            refresh_secs: default_refresh_secs(),
            geolocation_timeout_secs: default_geolocation_timeout_secs(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }
fn default_allowed_origins() -> Vec<String> { vec!["http://localhost:5173".to_string()] }
fn default_weather_url() -> String { "https://api.openweathermap.org/data/2.5".to_string() }
fn default_geo_url() -> String { "https://api.openweathermap.org/geo/1.0".to_string() }
fn default_ai_url() -> String { "https://generativelanguage.googleapis.com".to_string() }
fn default_ai_model() -> String { "gemini-1.5-flash".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_retry_delay_ms() -> u64 { 500 }
fn default_forecast_days() -> usize { 5 }
fn default_refresh_secs() -> u64 { 600 }
fn default_geolocation_timeout_secs() -> u64 { 15 }

/// Returns the application configuration
///
/// The config file path is given with `--config=<path>` and defaults to `config.toml`.
/// Provider keys are read from the environment, and a missing key stops the application
/// at startup rather than failing each request.
pub fn config() -> Result<Config, ConfigError> {
    let config_path = env::args()
        .find_map(|a| a.strip_prefix("--config=").map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let text = fs::read_to_string(&config_path)
        .map_err(|e| ConfigError(format!("unable to read {}: {}", config_path, e)))?;

    load_config(&text, |name| env::var(name).ok())
}

/// Parses the toml configuration and attaches api keys from the given lookup
///
/// # Arguments
///
/// * 'text' - toml document
/// * 'lookup' - environment lookup, returns the value of a variable if set
pub fn load_config<F>(text: &str, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(text)?;

    if config.dashboard.forecast_days == 0 {
        return Err(ConfigError::from("dashboard.forecast_days must be at least 1"));
    }
    if let Some(origin) = config.web_server.allowed_origins.iter().find(|o| !is_valid_origin(o)) {
        return Err(ConfigError(format!("web_server.allowed_origins: invalid origin '{}'", origin)));
    }

    config.keys = ApiKeys {
        weather: required_key(&lookup, WEATHER_KEY_VAR)?,
        ai: required_key(&lookup, AI_KEY_VAR)?,
    };

    Ok(config)
}

fn is_valid_origin(origin: &str) -> bool {
    origin == "*"
        || ["http://", "https://"]
            .iter()
            .any(|scheme| origin.strip_prefix(scheme).is_some_and(|host| !host.is_empty() && !host.contains('/')))
}

fn required_key<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError(format!("environment variable {} is required", name))),
    }
}
