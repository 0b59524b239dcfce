//! Weather data for gardencast
//!
//! Fetches daily temperature/precipitation and soil temperature history from
//! the Open-Meteo forecast and archive APIs.

pub mod provider;
pub mod types;

pub use provider::WeatherProvider;
pub use types::*;
