//! Fetch -> compute -> format, once per run.

use chrono::{DateTime, NaiveDate, Utc};
use gardencast_core::{Config, ConfigError, GardenConfig, LocationConfig};
use gardencast_weather::{WeatherError, WeatherProvider};
use thiserror::Error;

use crate::format::{error_report_text, render_report};
use crate::metrics::GardenMetrics;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A successfully generated report
#[derive(Debug, Clone)]
pub struct GardenReport {
    pub metrics: GardenMetrics,
    pub text: String,
}

/// Result of a report run; a failure still carries text that can be shown
/// (or mailed) in place of the report
#[derive(Debug)]
pub enum ReportOutcome {
    Ready(GardenReport),
    Failed { error: ReportError, text: String },
}

impl ReportOutcome {
    pub fn text(&self) -> &str {
        match self {
            ReportOutcome::Ready(report) => &report.text,
            ReportOutcome::Failed { text, .. } => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ReportOutcome::Failed { .. })
    }
}

/// Calendar date of `now` in the given timezone
pub fn today_at(now: DateTime<Utc>, tz: chrono_tz::Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Current calendar date in the given timezone
pub fn today_in(tz: chrono_tz::Tz) -> NaiveDate {
    today_at(Utc::now(), tz)
}

pub struct ReportGenerator {
    provider: WeatherProvider,
    location: LocationConfig,
    garden: GardenConfig,
    forecast_days: usize,
    soil_window_days: u32,
}

impl ReportGenerator {
    /// # Errors
    /// Fails if the HTTP client for the weather provider cannot be built.
    pub fn new(config: &Config) -> Result<Self, ReportError> {
        Ok(Self {
            provider: WeatherProvider::new(&config.weather)?,
            location: config.location.clone(),
            garden: config.garden.clone(),
            forecast_days: config.weather.forecast_days as usize,
            soil_window_days: config.weather.soil_window_days,
        })
    }

    /// Today's date at the configured location.
    ///
    /// # Errors
    /// Fails if the configured timezone is unknown.
    pub fn today(&self) -> Result<NaiveDate, ReportError> {
        Ok(today_in(self.location.tz()?))
    }

    /// Generate the report for `today`.
    ///
    /// # Errors
    /// Any fetch or parse failure from either weather request.
    pub async fn generate(&self, today: NaiveDate) -> Result<GardenReport, ReportError> {
        tracing::info!(
            "Generating garden report for {} ({}, {})",
            today,
            self.location.latitude,
            self.location.longitude
        );

        let series = self.provider.fetch_daily(&self.location).await?;
        let soil = self.provider.fetch_soil(&self.location, today).await?;

        let metrics = GardenMetrics::compute(
            &series,
            &soil,
            today,
            &self.garden,
            self.forecast_days,
            self.soil_window_days,
        );
        tracing::debug!(
            "Watering recommendation: {} minutes",
            metrics.watering.duration_minutes
        );

        let text = render_report(&metrics, &self.garden.advice);
        Ok(GardenReport { metrics, text })
    }

    /// Run the whole pipeline, turning any failure into error text
    pub async fn run(&self, today: NaiveDate) -> ReportOutcome {
        match self.generate(today).await {
            Ok(report) => {
                tracing::info!("Garden report ready ({} bytes)", report.text.len());
                ReportOutcome::Ready(report)
            }
            Err(error) => {
                tracing::error!("Failed to generate garden report: {}", error);
                let text = error_report_text(&error);
                ReportOutcome::Failed { error, text }
            }
        }
    }
}
