//! Gardening metrics derived from daily weather records.
//!
//! Everything here is a pure function of its inputs; `today` is always passed
//! in so results do not depend on the wall clock.

use chrono::{Duration, NaiveDate};
use gardencast_core::{GardenConfig, MM_PER_INCH};
use gardencast_weather::{DailyRecord, SoilSeries, WeatherSeries};

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    (celsius * 9.0 / 5.0) + 32.0
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Total precipitation over the half-open range [today - days, today)
pub fn rainfall_since(historical: &[DailyRecord], today: NaiveDate, days: u32) -> f64 {
    let start = today - Duration::days(i64::from(days));
    historical
        .iter()
        .filter(|r| r.date >= start && r.date < today)
        .map(DailyRecord::precipitation_or_zero)
        .sum()
}

/// Mean of the non-missing soil readings, in Fahrenheit
pub fn soil_average_f(soil: &SoilSeries) -> Option<f64> {
    let (sum, count) = soil
        .readings()
        .fold((0.0, 0usize), |(sum, count), c| (sum + c, count + 1));

    if count == 0 {
        None
    } else {
        Some(celsius_to_fahrenheit(sum / count as f64))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RainfallTotal {
    pub days: u32,
    pub millimeters: f64,
}

impl RainfallTotal {
    /// Inches from the unrounded millimeter total
    pub fn inches(&self) -> f64 {
        mm_to_inches(self.millimeters)
    }
}

/// How long to run the sprinkler to reach the weekly target
#[derive(Debug, Clone, PartialEq)]
pub struct WateringPlan {
    pub target_inches: f64,
    pub rainfall_inches: f64,
    pub water_needed_inches: f64,
    pub adjusted_rate: f64,
    pub duration_minutes: u32,
}

impl WateringPlan {
    pub fn from_rainfall(rainfall_7_days_mm: f64, garden: &GardenConfig) -> Self {
        let target_inches = garden.weekly_target_inches;
        let adjusted_rate = garden.adjusted_rate();
        let rainfall_inches = mm_to_inches(rainfall_7_days_mm);
        let water_needed_inches = (target_inches - rainfall_inches).max(0.0);

        let duration_minutes = if water_needed_inches > 0.0 && adjusted_rate > 0.0 {
            ((water_needed_inches / adjusted_rate) * 60.0).floor() as u32
        } else {
            0
        };

        Self {
            target_inches,
            rainfall_inches,
            water_needed_inches,
            adjusted_rate,
            duration_minutes,
        }
    }
}

/// One row of the forecast table, already in imperial units
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub high_f: Option<f64>,
    pub low_f: Option<f64>,
    pub rain_inches: f64,
}

impl From<&DailyRecord> for ForecastDay {
    fn from(record: &DailyRecord) -> Self {
        Self {
            date: record.date,
            high_f: record.max_temp_c.map(celsius_to_fahrenheit),
            low_f: record.min_temp_c.map(celsius_to_fahrenheit),
            rain_inches: mm_to_inches(record.precipitation_or_zero()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GardenMetrics {
    pub rainfall: Vec<RainfallTotal>,
    pub soil_window_days: u32,
    pub soil_average_f: Option<f64>,
    pub watering: WateringPlan,
    /// Configured table length; `forecast` may hold fewer rows
    pub forecast_days: usize,
    pub forecast: Vec<ForecastDay>,
}

impl GardenMetrics {
    /// Compute every report metric for `today`.
    ///
    /// The forecast is capped at `forecast_days` rows.
    pub fn compute(
        series: &WeatherSeries,
        soil: &SoilSeries,
        today: NaiveDate,
        garden: &GardenConfig,
        forecast_days: usize,
        soil_window_days: u32,
    ) -> Self {
        let (historical, upcoming) = series.split_at(today);

        let rainfall = garden
            .rainfall_windows
            .iter()
            .map(|&days| RainfallTotal {
                days,
                millimeters: rainfall_since(historical, today, days),
            })
            .collect();

        let watering = WateringPlan::from_rainfall(rainfall_since(historical, today, 7), garden);

        let forecast = upcoming
            .iter()
            .take(forecast_days)
            .map(ForecastDay::from)
            .collect();

        Self {
            rainfall,
            soil_window_days,
            soil_average_f: soil_average_f(soil),
            watering,
            forecast_days,
            forecast,
        }
    }
}
