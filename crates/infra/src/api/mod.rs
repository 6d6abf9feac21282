//! Clients for the protected backend API

pub mod forecast;

pub use forecast::{ForecastRepository, WeatherForecast};
