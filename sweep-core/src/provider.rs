use crate::{
    Config, Location, Observation,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
    task::TaskKind,
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod openweather;
pub mod weatherapi;

/// Per-request timeout applied by the bundled providers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    /// Environment variable that overrides the stored API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::WeatherApi => "WEATHERAPI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// Fetches one (location, window) unit from an external weather service.
///
/// An `Err` is a terminal failure for that unit; callers do not retry.
#[async_trait]
pub trait MetricsProvider: Send + Sync + Debug {
    async fn fetch(&self, location: &Location, kind: TaskKind) -> anyhow::Result<Observation>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn MetricsProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-sweep configure {id}` or set {}.",
            id.api_key_env()
        )
    })?;

    let provider: Arc<dyn MetricsProvider> = match id {
        ProviderId::OpenWeather => Arc::new(OpenWeatherProvider::new(api_key.to_owned())?),
        ProviderId::WeatherApi => Arc::new(WeatherApiProvider::new(api_key.to_owned())?),
    };

    Ok(provider)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn MetricsProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Send a prepared GET, fail on non-success status, and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    what: &str,
) -> anyhow::Result<T> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send {what} request"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

/// Round to two decimal places, as values are presented.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
