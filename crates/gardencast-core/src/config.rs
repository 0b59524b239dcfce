use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "GARDENCAST_CONFIG";

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Directory that relative file paths resolve against
    #[serde(skip)]
    pub config_dir: PathBuf,

    /// Where the garden is
    pub location: LocationConfig,

    /// Watering and reporting parameters
    pub garden: GardenConfig,

    /// Open-Meteo endpoints and windows
    pub weather: WeatherConfig,

    /// Gmail delivery settings
    pub mail: MailConfig,
}

/// Fixed location the report is generated for
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone name, e.g. "America/Chicago"
    pub timezone: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 38.9870,
            longitude: -94.5878,
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl LocationConfig {
    /// Parse the configured timezone name.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the name is not a known IANA zone.
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| ConfigError::Invalid(format!("timezone '{}': {}", self.timezone, e)))
    }
}

/// Parameters for the watering calculation and the report body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// Water the lawn should receive per week, in inches
    pub weekly_target_inches: f64,

    /// Baseline sprinkler application rate, in inches per hour
    pub sprinkler_rate_inches_per_hour: f64,

    /// Multiplier for above-baseline water pressure
    pub pressure_factor: f64,

    /// Trailing rainfall windows in days, printed in this order
    pub rainfall_windows: Vec<u32>,

    /// Free-form notes appended to the end of the report
    pub advice: Vec<String>,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            weekly_target_inches: 1.0,
            sprinkler_rate_inches_per_hour: 0.75,
            pressure_factor: 1.66,
            rainfall_windows: vec![30, 7, 5, 3],
            advice: vec![
                "General Rule: Most lawns need about 1 inch of water per week.".to_string(),
                "Hydrangeas (Front): Poor drainage means check soil before watering."
                    .to_string(),
                "New Grass (Back): Low sun means it holds moisture; avoid overwatering."
                    .to_string(),
            ],
        }
    }
}

impl GardenConfig {
    /// Sprinkler rate corrected for water pressure, in inches per hour
    pub fn adjusted_rate(&self) -> f64 {
        self.sprinkler_rate_inches_per_hour * self.pressure_factor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo forecast endpoint
    pub forecast_url: String,

    /// Open-Meteo historical archive endpoint
    pub archive_url: String,

    /// Days of recent past included in the forecast request
    pub past_days: u32,

    /// Days of forecast, today included
    pub forecast_days: u32,

    /// Days of soil temperature history, ending yesterday
    pub soil_window_days: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            past_days: 31,
            forecast_days: 10,
            soil_window_days: 10,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Subject line of the report email
    pub subject: String,

    /// Cached OAuth token (relative paths resolve against the config dir)
    pub token_cache: PathBuf,

    /// OAuth client descriptor downloaded from the Google Cloud console
    pub client_secrets: PathBuf,

    /// Email the error text when the report could not be generated
    pub send_error_reports: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            subject: "Your Morning Gardening Weather Report".to_string(),
            token_cache: PathBuf::from("token.json"),
            client_secrets: PathBuf::from("credentials.json"),
            send_error_reports: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    /// when no file exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if !config_path.exists() {
            tracing::info!(
                "No config file at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self {
                config_dir,
                ..Self::default()
            });
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;
        config.config_dir = config_dir;

        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !(-90.0..=90.0).contains(&self.location.latitude) {
            result.add_error("location.latitude", "Latitude must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&self.location.longitude) {
            result.add_error("location.longitude", "Longitude must be between -180 and 180");
        }
        if let Err(e) = self.location.tz() {
            result.add_error("location.timezone", e.to_string());
        }

        if self.garden.weekly_target_inches <= 0.0 {
            result.add_error("garden.weekly_target_inches", "Weekly target must be positive");
        }
        if self.garden.adjusted_rate() <= 0.0 {
            result.add_error(
                "garden.sprinkler_rate_inches_per_hour",
                "Sprinkler rate and pressure factor must be positive",
            );
        }
        if self.garden.rainfall_windows.is_empty() {
            result.add_warning("garden.rainfall_windows", "No rainfall windows configured");
        }
        if let Some(w) = self
            .garden
            .rainfall_windows
            .iter()
            .find(|w| **w == 0 || **w > self.weather.past_days)
        {
            result.add_error(
                "garden.rainfall_windows",
                format!(
                    "Window of {} days must be between 1 and weather.past_days ({})",
                    w, self.weather.past_days
                ),
            );
        }

        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        self.validate_url(&self.weather.archive_url, "weather.archive_url", &mut result);

        if self.weather.past_days < 7 {
            result.add_error(
                "weather.past_days",
                "At least 7 past days are required for the watering calculation",
            );
        }
        if self.weather.forecast_days == 0 {
            result.add_warning("weather.forecast_days", "Forecast table will be empty");
        } else if self.weather.forecast_days > 16 {
            result.add_error("weather.forecast_days", "Open-Meteo forecasts at most 16 days");
        }
        if self.weather.soil_window_days == 0 {
            result.add_warning(
                "weather.soil_window_days",
                "Soil temperature will always be unavailable",
            );
        }
        if self.weather.request_timeout_secs == 0 {
            result.add_error("weather.request_timeout_secs", "Timeout must be greater than 0");
        }

        if self.mail.subject.trim().is_empty() {
            result.add_warning("mail.subject", "Email subject is empty");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Resolve a configured path against the config directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// Location of the cached OAuth token
    pub fn token_cache_path(&self) -> PathBuf {
        self.resolve_path(&self.mail.token_cache)
    }

    /// Location of the OAuth client descriptor
    pub fn client_secrets_path(&self) -> PathBuf {
        self.resolve_path(&self.mail.client_secrets)
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("gardencast");

        Ok(config_dir.join("config.toml"))
    }
}
