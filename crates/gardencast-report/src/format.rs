//! Plain-text rendering of the gardening report.
//!
//! The output is meant for monospace display, so every column width and
//! decimal precision below is part of the contract.

use crate::metrics::{ForecastDay, GardenMetrics, RainfallTotal, WateringPlan};

const SECTION_RULE: &str = "---------------------------------";
const TABLE_RULE: &str = "----------------------------------------------------------------";
const DAY_FORMAT: &str = "%a, %b %d";

/// Render the full report, sections separated by blank lines
pub fn render_report(metrics: &GardenMetrics, advice: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();

    push_rainfall(&mut lines, &metrics.rainfall);
    push_soil(&mut lines, metrics.soil_window_days, metrics.soil_average_f);
    push_watering(&mut lines, &metrics.watering);
    push_forecast(&mut lines, metrics.forecast_days, &metrics.forecast);
    push_advice(&mut lines, advice);

    lines.join("\n")
}

/// Text that stands in for the report when it could not be generated
pub fn error_report_text(error: &impl std::fmt::Display) -> String {
    format!("Error creating weather report: {}", error)
}

fn push_rainfall(lines: &mut Vec<String>, totals: &[RainfallTotal]) {
    lines.push("## 🌧️ Recent Rainfall Totals".to_string());
    lines.push(SECTION_RULE.to_string());
    for total in totals {
        let label = format!("Last {} Days:", total.days);
        lines.push(format!(
            "{:<13} {:.2} mm (~{:.2} inches)",
            label,
            total.millimeters,
            total.inches()
        ));
    }
    lines.push(SECTION_RULE.to_string());
    lines.push(String::new());
}

fn push_soil(lines: &mut Vec<String>, window_days: u32, average_f: Option<f64>) {
    lines.push("## 🌱 Soil Temperature (0-7cm)".to_string());
    lines.push(SECTION_RULE.to_string());
    match average_f {
        Some(avg) => lines.push(format!("{}-Day Average: {:.1}°F", window_days, avg)),
        None => lines.push("Data not available for this period.".to_string()),
    }
    lines.push(SECTION_RULE.to_string());
    lines.push(String::new());
}

fn push_watering(lines: &mut Vec<String>, plan: &WateringPlan) {
    lines.push("## 💧 Watering Calculation".to_string());
    lines.push(SECTION_RULE.to_string());
    lines.push(format!("Weekly Target:        {:.2} inches", plan.target_inches));
    lines.push(format!("Rainfall (7 Days):    {:.2} inches", plan.rainfall_inches));
    lines.push(format!("Water Needed:         {:.2} inches", plan.water_needed_inches));
    lines.push(format!("Sprinkler Rate:       {:.3} in/hr", plan.adjusted_rate));
    if plan.duration_minutes > 0 {
        lines.push(format!("Recommended Watering: {} minutes", plan.duration_minutes));
    } else {
        lines.push("No watering needed this week.".to_string());
    }
    lines.push(SECTION_RULE.to_string());
    lines.push(String::new());
}

fn push_forecast(lines: &mut Vec<String>, forecast_days: usize, days: &[ForecastDay]) {
    lines.push(format!("## ☀️ {}-Day Weather Forecast", forecast_days));
    lines.push(TABLE_RULE.to_string());
    lines.push(format!(
        "{:<15} {:<12} {:<11} {:<15}",
        "Date", "High (°F)", "Low (°F)", "Rainfall (in)"
    ));
    lines.push(TABLE_RULE.to_string());
    for day in days {
        lines.push(format!(
            "{:<15} {:<12} {:<11} {:<15.2}",
            day.date.format(DAY_FORMAT).to_string(),
            format_temp(day.high_f),
            format_temp(day.low_f),
            day.rain_inches
        ));
    }
    lines.push(TABLE_RULE.to_string());
    lines.push(String::new());
}

fn push_advice(lines: &mut Vec<String>, advice: &[String]) {
    if advice.is_empty() {
        return;
    }
    lines.push("## 🪴 Garden Notes".to_string());
    lines.extend(advice.iter().map(|note| format!(" - {}", note)));
}

fn format_temp(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "n/a".to_string(),
    }
}
