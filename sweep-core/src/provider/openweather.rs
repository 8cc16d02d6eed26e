use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{Location, Observation, task::TaskKind};

use super::{DEFAULT_TIMEOUT, MetricsProvider, get_json, http_client, round2};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather: `/data/2.5/weather` for current conditions, One Call 3.0 for
/// history (`timemachine`) and daily forecast.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: http_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// Point the client at another host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_current(&self, location: &Location) -> Result<Observation> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let req = self.http.get(url).query(&[
            ("q", location.query.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);

        let parsed: OwCurrentResponse = get_json(req, "OpenWeather current").await?;
        let rain = parsed.rain.and_then(|r| r.one_hour.or(r.three_hours)).unwrap_or(0.0);

        Ok(Observation {
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            rainfall_mm: rain,
            wind_speed_ms: parsed.wind.speed,
        })
    }

    async fn fetch_history(&self, location: &Location, date: NaiveDate) -> Result<Observation> {
        let url = format!("{}/data/3.0/onecall/timemachine", self.base_url);
        let dt = date.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or_default();
        let req = self.http.get(url).query(&[
            ("lat", location.coord.lat.to_string()),
            ("lon", location.coord.lon.to_string()),
            ("dt", dt.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);

        let parsed: OwTimemachineResponse = get_json(req, "OpenWeather history").await?;
        let hours = if parsed.data.is_empty() { parsed.hourly } else { parsed.data };

        daily_from_hourly(&hours)
            .ok_or_else(|| anyhow!("OpenWeather history for {date} contained no usable hourly data"))
    }

    async fn fetch_forecast(&self, location: &Location, date: NaiveDate) -> Result<Observation> {
        let url = format!("{}/data/3.0/onecall", self.base_url);
        let req = self.http.get(url).query(&[
            ("lat", location.coord.lat.to_string()),
            ("lon", location.coord.lon.to_string()),
            ("exclude", "current,minutely,hourly,alerts".to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);

        let parsed: OwOneCallResponse = get_json(req, "OpenWeather forecast").await?;

        let day = parsed
            .daily
            .iter()
            .find(|d| unix_to_utc(d.dt).map(|t| t.date_naive()) == Some(date))
            .ok_or_else(|| anyhow!("OpenWeather forecast does not cover {date}"))?;

        Ok(Observation {
            temperature_c: day.temp.day,
            humidity_pct: day.humidity,
            rainfall_mm: day.rain.unwrap_or(0.0),
            wind_speed_ms: day.wind_speed,
        })
    }
}

/// Collapse hourly readings into one daily observation.
///
/// Temperature, humidity and wind are means; rain is summed. Returns `None`
/// when any of the averaged metrics has no reading at all.
fn daily_from_hourly(hours: &[OwHourly]) -> Option<Observation> {
    fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
        let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| round2(sum / n as f64))
    }

    let rain: f64 = hours
        .iter()
        .filter_map(|h| h.rain.as_ref().and_then(|r| r.one_hour.or(r.three_hours)))
        .sum();

    Some(Observation {
        temperature_c: mean(hours.iter().filter_map(|h| h.temp))?,
        humidity_pct: mean(hours.iter().filter_map(|h| h.humidity))?,
        rainfall_mm: round2(rain),
        wind_speed_ms: mean(hours.iter().filter_map(|h| h.wind_speed))?,
    })
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    wind: OwWind,
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    temp: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwTimemachineResponse {
    #[serde(default)]
    data: Vec<OwHourly>,
    #[serde(default)]
    hourly: Vec<OwHourly>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    day: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    humidity: f64,
    wind_speed: f64,
    rain: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    #[serde(default)]
    daily: Vec<OwDaily>,
}

#[async_trait]
impl MetricsProvider for OpenWeatherProvider {
    async fn fetch(&self, location: &Location, kind: TaskKind) -> Result<Observation> {
        match kind {
            TaskKind::Current => self.fetch_current(location).await,
            TaskKind::History(date) => self.fetch_history(location, date).await,
            TaskKind::Forecast(date) => self.fetch_forecast(location, date).await,
        }
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour(temp: Option<f64>, rain: Option<f64>) -> OwHourly {
        OwHourly {
            temp,
            humidity: Some(60.0),
            wind_speed: Some(2.0),
            rain: rain.map(|v| OwRain { one_hour: Some(v), three_hours: None }),
        }
    }

    #[test]
    fn daily_from_hourly_averages_and_sums() {
        let obs = daily_from_hourly(&[
            hour(Some(20.0), Some(0.4)),
            hour(Some(25.0), None),
            hour(None, Some(1.1)),
        ])
        .unwrap();

        assert_eq!(obs.temperature_c, 22.5);
        assert_eq!(obs.humidity_pct, 60.0);
        assert_eq!(obs.rainfall_mm, 1.5);
        assert_eq!(obs.wind_speed_ms, 2.0);
    }

    #[test]
    fn daily_from_hourly_without_rain_is_zero() {
        let obs = daily_from_hourly(&[hour(Some(18.0), None)]).unwrap();
        assert_eq!(obs.rainfall_mm, 0.0);
    }

    #[test]
    fn daily_from_hourly_without_temperature_fails() {
        assert!(daily_from_hourly(&[hour(None, None)]).is_none());
        assert!(daily_from_hourly(&[]).is_none());
    }

    #[test]
    fn current_rain_prefers_one_hour_total() {
        let parsed: OwCurrentResponse = serde_json::from_str(
            r#"{"main":{"temp":31.2,"humidity":66},"wind":{"speed":4.1},"rain":{"1h":0.7,"3h":2.0}}"#,
        )
        .unwrap();
        let rain = parsed.rain.and_then(|r| r.one_hour.or(r.three_hours));
        assert_eq!(rain, Some(0.7));
    }
}
