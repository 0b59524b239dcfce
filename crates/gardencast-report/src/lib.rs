//! Gardening report for gardencast
//!
//! Turns raw daily weather into rainfall totals, a soil temperature average
//! and a sprinkler run time, and renders them as a fixed-width text report.

pub mod format;
pub mod metrics;
pub mod pipeline;

pub use format::{error_report_text, render_report};
pub use metrics::{ForecastDay, GardenMetrics, RainfallTotal, WateringPlan};
pub use pipeline::{today_at, today_in, GardenReport, ReportError, ReportGenerator, ReportOutcome};
