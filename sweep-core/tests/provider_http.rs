//! Provider clients against a mock HTTP server.

use chrono::NaiveDate;
use weather_sweep_core::{
    Coord, Location, MetricsProvider, TaskKind,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn madurai() -> Location {
    Location {
        name: "Madurai".into(),
        query: "Madurai, Tamil Nadu, IN".into(),
        coord: Coord { lat: 9.9252, lon: 78.1198 },
    }
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

fn openweather(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new("test-key".into()).unwrap().with_base_url(server.uri())
}

fn weatherapi(server: &MockServer) -> WeatherApiProvider {
    WeatherApiProvider::new("test-key".into()).unwrap().with_base_url(server.uri())
}

#[tokio::test]
async fn openweather_current_without_rain_reports_zero() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Madurai, Tamil Nadu, IN"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "coord": { "lat": 9.92, "lon": 78.12 },
            "main": { "temp": 31.4, "feels_like": 35.0, "humidity": 58 },
            "wind": { "speed": 4.6 },
            "dt": 1792400000
        })))
        .mount(&server)
        .await;

    let obs = openweather(&server).fetch(&madurai(), TaskKind::Current).await.unwrap();

    assert_eq!(obs.temperature_c, 31.4);
    assert_eq!(obs.humidity_pct, 58.0);
    assert_eq!(obs.wind_speed_ms, 4.6);
    assert_eq!(obs.rainfall_mm, 0.0);
}

#[tokio::test]
async fn openweather_history_reduces_hourly_data() {
    let server = MockServer::start().await;
    // 2026-10-17T00:00:00Z
    let midnight = date(17).and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/timemachine"))
        .and(query_param("dt", midnight.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lat": 9.9252,
            "lon": 78.1198,
            "data": [
                { "dt": midnight, "temp": 26.0, "humidity": 80, "wind_speed": 2.0, "rain": { "1h": 0.5 } },
                { "dt": midnight + 3600, "temp": 27.0, "humidity": 70, "wind_speed": 3.0 }
            ]
        })))
        .mount(&server)
        .await;

    let obs = openweather(&server)
        .fetch(&madurai(), TaskKind::History(date(17)))
        .await
        .unwrap();

    assert_eq!(obs.temperature_c, 26.5);
    assert_eq!(obs.humidity_pct, 75.0);
    assert_eq!(obs.wind_speed_ms, 2.5);
    assert_eq!(obs.rainfall_mm, 0.5);
}

#[tokio::test]
async fn openweather_forecast_picks_requested_day() {
    let server = MockServer::start().await;
    let noon = |d: u32| date(d).and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp();

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .and(query_param("exclude", "current,minutely,hourly,alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "daily": [
                { "dt": noon(20), "temp": { "day": 30.0 }, "humidity": 60, "wind_speed": 5.0, "rain": 1.2 },
                { "dt": noon(21), "temp": { "day": 28.5 }, "humidity": 72, "wind_speed": 4.0 }
            ]
        })))
        .mount(&server)
        .await;

    let provider = openweather(&server);

    let obs = provider.fetch(&madurai(), TaskKind::Forecast(date(21))).await.unwrap();
    assert_eq!(obs.temperature_c, 28.5);
    assert_eq!(obs.rainfall_mm, 0.0);

    let err = provider.fetch(&madurai(), TaskKind::Forecast(date(27))).await.unwrap_err();
    assert!(err.to_string().contains("does not cover 2026-10-27"));
}

#[tokio::test]
async fn openweather_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall/timemachine"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"cod":401,"message":"Please note that using One Call 3.0 requires a separate subscription"}"#,
        ))
        .mount(&server)
        .await;

    let err = openweather(&server)
        .fetch(&madurai(), TaskKind::History(date(17)))
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("401"), "{msg}");
    assert!(msg.contains("separate subscription"), "{msg}");
}

#[tokio::test]
async fn openweather_malformed_payload_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": { "humidity": 58 },
            "wind": { "speed": 4.6 }
        })))
        .mount(&server)
        .await;

    let err = openweather(&server).fetch(&madurai(), TaskKind::Current).await.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse OpenWeather current JSON"));
}

#[tokio::test]
async fn weatherapi_current_converts_wind() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "Madurai", "country": "India" },
            "current": { "temp_c": 32.0, "humidity": 55, "wind_kph": 18.0, "precip_mm": 0.2 }
        })))
        .mount(&server)
        .await;

    let obs = weatherapi(&server).fetch(&madurai(), TaskKind::Current).await.unwrap();

    assert_eq!(obs.temperature_c, 32.0);
    assert_eq!(obs.wind_speed_ms, 5.0);
    assert_eq!(obs.rainfall_mm, 0.2);
}

#[tokio::test]
async fn weatherapi_history_uses_day_summary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/history.json"))
        .and(query_param("dt", "2026-10-17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "forecast": { "forecastday": [
                { "date": "2026-10-17",
                  "day": { "avgtemp_c": 27.3, "avghumidity": 77, "maxwind_kph": 21.6, "totalprecip_mm": 4.1 } }
            ] }
        })))
        .mount(&server)
        .await;

    let obs = weatherapi(&server)
        .fetch(&madurai(), TaskKind::History(date(17)))
        .await
        .unwrap();

    assert_eq!(obs.temperature_c, 27.3);
    assert_eq!(obs.humidity_pct, 77.0);
    assert_eq!(obs.wind_speed_ms, 6.0);
    assert_eq!(obs.rainfall_mm, 4.1);
}

#[tokio::test]
async fn weatherapi_forecast_without_matching_day_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "forecast": { "forecastday": [] }
        })))
        .mount(&server)
        .await;

    let err = weatherapi(&server)
        .fetch(&madurai(), TaskKind::Forecast(date(22)))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no data for 2026-10-22"));
}
