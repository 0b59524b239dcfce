use chrono::NaiveDate;
use gardencast_core::{NetworkError, ReqwestErrorExt};
use serde::{Deserialize, Serialize};

/// One calendar day of observed or forecast weather, in the location's timezone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub max_temp_c: Option<f64>,
    pub min_temp_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

impl DailyRecord {
    /// Precipitation with missing values counted as dry
    pub fn precipitation_or_zero(&self) -> f64 {
        self.precipitation_mm.unwrap_or(0.0)
    }
}

/// Mean soil temperature at 0-7cm for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilRecord {
    pub date: NaiveDate,
    pub mean_temp_c: Option<f64>,
}

/// Daily records ordered by date, at most one per date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    records: Vec<DailyRecord>,
}

impl WeatherSeries {
    /// Build a series, sorting by date and keeping the first record of any
    /// duplicated date
    pub fn from_records(mut records: Vec<DailyRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        records.dedup_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split into (historical, forecast): days before `today` and days from
    /// `today` onward
    pub fn split_at(&self, today: NaiveDate) -> (&[DailyRecord], &[DailyRecord]) {
        let boundary = self.records.partition_point(|r| r.date < today);
        self.records.split_at(boundary)
    }
}

/// Soil temperature history; individual days may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilSeries {
    records: Vec<SoilRecord>,
}

impl SoilSeries {
    pub fn from_records(mut records: Vec<SoilRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[SoilRecord] {
        &self.records
    }

    /// Non-missing readings in degrees Celsius
    pub fn readings(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().filter_map(|r| r.mean_temp_c)
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Weather API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Network(e.into_network_error())
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn day(d: &str, rain: Option<f64>) -> DailyRecord {
        DailyRecord {
            date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
            max_temp_c: Some(20.0),
            min_temp_c: Some(10.0),
            precipitation_mm: rain,
        }
    }

    #[test]
    fn test_series_sorted_and_unique() {
        let series = WeatherSeries::from_records(vec![
            day("2025-06-03", Some(3.0)),
            day("2025-06-01", Some(1.0)),
            day("2025-06-02", Some(2.0)),
            day("2025-06-01", Some(9.0)),
        ]);

        let dates: Vec<String> = series.records().iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-06-01", "2025-06-02", "2025-06-03"]);
        assert_eq!(series.records()[0].precipitation_mm, Some(1.0));
    }

    #[test]
    fn test_split_at_today() {
        let series = WeatherSeries::from_records(vec![
            day("2025-06-01", None),
            day("2025-06-02", None),
            day("2025-06-03", None),
            day("2025-06-04", None),
        ]);
        let today = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();

        let (past, future) = series.split_at(today);
        assert_eq!(past.len(), 2);
        assert_eq!(future.len(), 2);
        assert_eq!(future[0].date, today);
        assert!(past.iter().all(|r| r.date < today));
    }

    #[test]
    fn test_split_when_all_in_future() {
        let series = WeatherSeries::from_records(vec![day("2025-06-05", None)]);
        let today = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let (past, future) = series.split_at(today);
        assert!(past.is_empty());
        assert_eq!(future.len(), 1);
    }

    #[test]
    fn test_missing_precipitation_counts_as_zero() {
        assert_eq!(day("2025-06-01", None).precipitation_or_zero(), 0.0);
        assert_eq!(day("2025-06-01", Some(4.2)).precipitation_or_zero(), 4.2);
    }

    #[test]
    fn test_soil_series_readings_skip_missing() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let series = SoilSeries::from_records(vec![
            SoilRecord { date, mean_temp_c: Some(15.0) },
            SoilRecord { date: date.succ_opt().unwrap(), mean_temp_c: None },
        ]);
        assert_eq!(series.readings().collect::<Vec<_>>(), vec![15.0]);

        let all_missing = SoilSeries::from_records(vec![SoilRecord { date, mean_temp_c: None }]);
        assert_eq!(all_missing.readings().count(), 0);
        assert_eq!(SoilSeries::default().readings().count(), 0);
    }
}
