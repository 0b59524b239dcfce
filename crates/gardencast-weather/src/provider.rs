//! Open-Meteo client: one forecast request and one archive request per run.

use chrono::{Duration, NaiveDate};
use gardencast_core::{LocationConfig, WeatherConfig};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::{DailyRecord, SoilRecord, SoilSeries, WeatherError, WeatherSeries};

const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";
const SOIL_FIELD: &str = "soil_temperature_0_to_7cm_mean";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    timezone: &'a str,
    daily: &'a str,
    past_days: u32,
    forecast_days: u32,
}

#[derive(Debug, Serialize)]
struct ArchiveQuery<'a> {
    latitude: f64,
    longitude: f64,
    start_date: String,
    end_date: String,
    daily: &'a str,
    timezone: &'a str,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<ForecastDaily>,
}

#[derive(Debug, Deserialize)]
struct ForecastDaily {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<ArchiveDaily>,
}

#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    #[serde(default)]
    time: Vec<String>,
    soil_temperature_0_to_7cm_mean: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    forecast_url: String,
    archive_url: String,
    past_days: u32,
    forecast_days: u32,
    soil_window_days: u32,
}

impl WeatherProvider {
    /// Build a provider with a bounded per-request timeout.
    ///
    /// # Errors
    /// Returns `WeatherError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WeatherError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            forecast_url: config.forecast_url.clone(),
            archive_url: config.archive_url.clone(),
            past_days: config.past_days,
            forecast_days: config.forecast_days,
            soil_window_days: config.soil_window_days,
        })
    }

    /// Daily max/min temperature and precipitation from `past_days` ago
    /// through `forecast_days` ahead.
    ///
    /// # Errors
    /// Fails on transport errors, non-success status or a malformed body.
    #[instrument(skip(self, location), level = "info")]
    pub async fn fetch_daily(&self, location: &LocationConfig) -> Result<WeatherSeries, WeatherError> {
        let query = ForecastQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            timezone: &location.timezone,
            daily: DAILY_FIELDS,
            past_days: self.past_days,
            forecast_days: self.forecast_days,
        };

        let body = self.execute(self.client.get(&self.forecast_url).query(&query)).await?;
        let series = parse_forecast_response(&body)?;

        tracing::info!("Fetched {} daily weather records", series.len());
        Ok(series)
    }

    /// Mean 0-7cm soil temperature for the `soil_window_days` days ending
    /// yesterday.
    ///
    /// A response without the soil field is not an error; it yields an empty
    /// series.
    ///
    /// # Errors
    /// Fails on transport errors, non-success status or a malformed body.
    #[instrument(skip(self, location), level = "info")]
    pub async fn fetch_soil(
        &self,
        location: &LocationConfig,
        today: NaiveDate,
    ) -> Result<SoilSeries, WeatherError> {
        if self.soil_window_days == 0 {
            return Ok(SoilSeries::default());
        }

        let (start, end) = soil_window(today, self.soil_window_days);
        let query = ArchiveQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            start_date: start.format(DATE_FORMAT).to_string(),
            end_date: end.format(DATE_FORMAT).to_string(),
            daily: SOIL_FIELD,
            timezone: &location.timezone,
        };

        let body = self.execute(self.client.get(&self.archive_url).query(&query)).await?;
        let series = parse_archive_response(&body)?;

        tracing::info!(
            "Fetched {} soil temperature records ({} with data)",
            series.records().len(),
            series.readings().count()
        );
        Ok(series)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, WeatherError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.reason)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        tracing::debug!("Open-Meteo returned {}: {}", status, message);
        Err(WeatherError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// First and last day of a window of `days` days ending the day before `today`
pub fn soil_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let end = today - Duration::days(1);
    let start = today - Duration::days(i64::from(days));
    (start, end)
}

fn parse_date(value: &str) -> Result<NaiveDate, WeatherError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| WeatherError::Parse(format!("invalid date '{}': {}", value, e)))
}

fn check_len(field: &str, len: usize, expected: usize) -> Result<(), WeatherError> {
    if len == expected {
        Ok(())
    } else {
        Err(WeatherError::Parse(format!(
            "daily.{} has {} values, expected {}",
            field, len, expected
        )))
    }
}

fn parse_forecast_response(body: &str) -> Result<WeatherSeries, WeatherError> {
    let payload: ForecastResponse = serde_json::from_str(body)?;
    let daily = payload
        .daily
        .ok_or_else(|| WeatherError::Parse("forecast payload: missing daily".to_string()))?;

    let expected = daily.time.len();
    check_len("temperature_2m_max", daily.temperature_2m_max.len(), expected)?;
    check_len("temperature_2m_min", daily.temperature_2m_min.len(), expected)?;
    check_len("precipitation_sum", daily.precipitation_sum.len(), expected)?;

    let records = daily
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            Ok(DailyRecord {
                date: parse_date(time)?,
                max_temp_c: daily.temperature_2m_max[i],
                min_temp_c: daily.temperature_2m_min[i],
                precipitation_mm: daily.precipitation_sum[i],
            })
        })
        .collect::<Result<Vec<_>, WeatherError>>()?;

    Ok(WeatherSeries::from_records(records))
}

fn parse_archive_response(body: &str) -> Result<SoilSeries, WeatherError> {
    let payload: ArchiveResponse = serde_json::from_str(body)?;

    let Some(daily) = payload.daily else {
        tracing::warn!("Archive response has no daily block");
        return Ok(SoilSeries::default());
    };
    let Some(values) = daily.soil_temperature_0_to_7cm_mean else {
        tracing::warn!("Archive response has no {} field", SOIL_FIELD);
        return Ok(SoilSeries::default());
    };

    check_len(SOIL_FIELD, values.len(), daily.time.len())?;

    let records = daily
        .time
        .iter()
        .zip(values)
        .map(|(time, mean_temp_c)| {
            Ok(SoilRecord {
                date: parse_date(time)?,
                mean_temp_c,
            })
        })
        .collect::<Result<Vec<_>, WeatherError>>()?;

    Ok(SoilSeries::from_records(records))
}
