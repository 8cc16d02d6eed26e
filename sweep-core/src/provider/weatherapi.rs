use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::{Location, Observation, task::TaskKind};

use super::{DEFAULT_TIMEOUT, MetricsProvider, get_json, http_client};

const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: http_client(DEFAULT_TIMEOUT)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_current(&self, location: &Location) -> Result<Observation> {
        let url = format!("{}/v1/current.json", self.base_url);
        let req = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", location.query.as_str())]);

        let parsed: WaResponse = get_json(req, "WeatherAPI current").await?;

        Ok(Observation {
            temperature_c: parsed.current.temp_c,
            humidity_pct: parsed.current.humidity,
            rainfall_mm: parsed.current.precip_mm.unwrap_or(0.0),
            wind_speed_ms: kph_to_ms(parsed.current.wind_kph),
        })
    }

    /// history.json and forecast.json share a response shape; only the
    /// endpoint differs.
    async fn fetch_day(
        &self,
        location: &Location,
        date: NaiveDate,
        is_forecast: bool,
    ) -> Result<Observation> {
        let endpoint = if is_forecast { "forecast" } else { "history" };
        let url = format!("{}/v1/{endpoint}.json", self.base_url);
        let dt = date.format("%Y-%m-%d").to_string();
        let req = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", location.query.as_str()), ("dt", dt.as_str())]);

        let what = format!("WeatherAPI {endpoint}");
        let parsed: WaForecastResponse = get_json(req, &what).await?;

        let day = parsed
            .forecast
            .forecastday
            .iter()
            .find(|d| d.date == date)
            .ok_or_else(|| anyhow!("WeatherAPI {endpoint} response contained no data for {date}"))?;

        Ok(Observation {
            temperature_c: day.day.avgtemp_c,
            humidity_pct: day.day.avghumidity,
            rainfall_mm: day.day.totalprecip_mm.unwrap_or(0.0),
            wind_speed_ms: kph_to_ms(day.day.maxwind_kph),
        })
    }
}

fn kph_to_ms(kph: f64) -> f64 {
    super::round2(kph / 3.6)
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: f64,
    wind_kph: f64,
    precip_mm: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    avghumidity: f64,
    maxwind_kph: f64,
    totalprecip_mm: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

#[async_trait]
impl MetricsProvider for WeatherApiProvider {
    async fn fetch(&self, location: &Location, kind: TaskKind) -> Result<Observation> {
        match kind {
            TaskKind::Current => self.fetch_current(location).await,
            TaskKind::History(date) => self.fetch_day(location, date, false).await,
            TaskKind::Forecast(date) => self.fetch_day(location, date, true).await,
        }
    }
}
