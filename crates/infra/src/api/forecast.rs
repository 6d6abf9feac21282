//! Weather forecast endpoint of the protected backend API

use chrono::{DateTime, FixedOffset};
use oidc_session_common::auth::SecureStorage;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::InfraError;
use crate::http::AuthenticatedClient;

const FORECAST_PATH: &str = "WeatherForecast";

/// Forecast returned by the backend API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: DateTime<FixedOffset>,
    pub temperature_c: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_f: Option<i32>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl WeatherForecast {
    /// Fahrenheit as sent by the API, or derived from Celsius when absent
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn fahrenheit(&self) -> i32 {
        self.temperature_f.unwrap_or_else(|| 32 + (f64::from(self.temperature_c) / 0.5556) as i32)
    }
}

/// Reads forecasts through the bearer-authenticated client
pub struct ForecastRepository<S: SecureStorage> {
    client: AuthenticatedClient<S>,
    endpoint: Url,
}

impl<S: SecureStorage> ForecastRepository<S> {
    /// Repository for the forecast resource under `api_url`
    ///
    /// # Errors
    /// Returns `InfraError::Url` if `api_url` is not an absolute URL.
    pub fn new(client: AuthenticatedClient<S>, api_url: &str) -> Result<Self, InfraError> {
        let mut base = Url::parse(api_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(FORECAST_PATH)?;
        Ok(Self { client, endpoint })
    }

    /// Resolved forecast URL
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch the forecast with the current bearer
    ///
    /// # Errors
    /// Returns `InfraError::Status` on a non-success status, otherwise the
    /// transport or JSON error.
    #[instrument(skip(self), fields(url = %self.endpoint))]
    pub async fn get_forecast(&self) -> Result<WeatherForecast, InfraError> {
        let request = self.client.request(Method::GET, self.endpoint.clone());
        let response = self.client.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "forecast request rejected");
            return Err(InfraError::from_status(status));
        }

        let body = response.text().await?;
        let forecast: WeatherForecast = serde_json::from_str(&body)?;
        debug!(date = %forecast.date, "forecast received");
        Ok(forecast)
    }
}
