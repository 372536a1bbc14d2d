//! Open-Meteo weather lookup
//!
//! Produces the weather features the crop model needs, plus the hourly
//! precipitation reported by the standalone weather lookup:
//!
//! - current temperature from the forecast endpoint's `current_weather`
//! - relative humidity and precipitation from the hourly series, at the
//!   hour nearest the request time (see [`pick_nearest_hourly`])
//! - year-to-date precipitation summed from the archive endpoint
//!
//! A forecast failure fails the lookup. An archive failure only blanks the
//! rainfall field.

use crate::config::AgriConfig;
use crate::error::{AgriError, AgriResult};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Weather features for one location; any of them may be unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature_c: Option<f64>,
    pub relative_humidity_percent: Option<f64>,
    /// Hourly precipitation at the request time
    pub precipitation_mm: Option<f64>,
    pub annual_precip_mm: Option<f64>,
}

impl WeatherReport {
    /// `(temperature, humidity, rainfall)` when all three are present
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        Some((
            self.temperature_c?,
            self.relative_humidity_percent?,
            self.annual_precip_mm?,
        ))
    }
}

/// Anything that can report weather for a coordinate
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Weather at (`lat`, `lon`) for an ISO-8601 `timestamp`, or now when
    /// absent or unparseable
    async fn get_weather(
        &self,
        lat: f64,
        lon: f64,
        timestamp: Option<&str>,
    ) -> AgriResult<WeatherReport>;
}

/// Parse the request time, keeping the wall-clock reading of any offset
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` and a bare date.
pub fn parse_request_time(timestamp: Option<&str>) -> NaiveDateTime {
    let now = || Utc::now().naive_utc();
    let Some(raw) = timestamp.map(str::trim).filter(|s| !s.is_empty()) else {
        return now();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_local();
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return dt;
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return dt;
    }

    debug!(timestamp = raw, "unparseable timestamp, using current time");
    now()
}

fn hour_key(iso: &str) -> &str {
    iso.get(..13).unwrap_or(iso)
}

/// Value of an hourly series at the sample nearest `target_key`
///
/// Hour keys (`YYYY-MM-DDTHH`) are compared as strings. The last sample not
/// later than the target wins; a target before every sample falls back to the
/// first one. Returns `None` for an empty series, a short value list or a
/// non-numeric value.
pub fn pick_nearest_hourly(times: &[String], values: &[Value], target_key: &str) -> Option<f64> {
    if times.is_empty() {
        return None;
    }
    let target = hour_key(target_key);

    let idx = times
        .iter()
        .take_while(|ts| hour_key(ts) <= target)
        .count()
        .saturating_sub(1);

    match values.get(idx)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current_weather: Option<CurrentWeather>,
    #[serde(default)]
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    relativehumidity_2m: Vec<Value>,
    #[serde(default)]
    precipitation: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    daily: Option<DailyBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

/// Open-Meteo forecast + archive client
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    forecast_url: String,
    archive_url: String,
    archive_timeout: Duration,
}

impl OpenMeteoClient {
    pub fn new(
        forecast_url: impl Into<String>,
        archive_url: impl Into<String>,
        timeout: Duration,
        archive_timeout: Duration,
    ) -> AgriResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgriError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            forecast_url: forecast_url.into(),
            archive_url: archive_url.into(),
            archive_timeout,
        })
    }

    pub fn from_config(config: &AgriConfig) -> AgriResult<Self> {
        Self::new(
            config.open_meteo_url.clone(),
            config.open_meteo_archive_url.clone(),
            config.weather_timeout,
            config.archive_timeout,
        )
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64) -> AgriResult<ForecastResponse> {
        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("hourly", "relativehumidity_2m,precipitation".to_string()),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgriError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AgriError::Parse(format!("Invalid forecast response: {e}")))
    }

    /// Total daily precipitation from Jan 1 of `year` through today (UTC)
    pub async fn fetch_year_to_date_precip(
        &self,
        lat: f64,
        lon: f64,
        year: i32,
    ) -> AgriResult<f64> {
        let end = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&self.archive_url)
            .timeout(self.archive_timeout)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("start_date", format!("{year}-01-01")),
                ("end_date", end),
                ("daily", "precipitation_sum".to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let archive: ArchiveResponse = response
            .json()
            .await
            .map_err(|e| AgriError::Parse(format!("Invalid archive response: {e}")))?;

        Ok(archive
            .daily
            .map(|d| d.precipitation_sum.into_iter().flatten().sum())
            .unwrap_or(0.0))
    }

    /// Weather at a fixed wall-clock time
    pub async fn get_weather_at(
        &self,
        lat: f64,
        lon: f64,
        at: NaiveDateTime,
    ) -> AgriResult<WeatherReport> {
        let forecast = self
            .fetch_forecast(lat, lon)
            .await
            .map_err(|e| AgriError::Weather(format!("open-meteo request failed: {e}")))?;

        let temperature_c = forecast.current_weather.and_then(|c| c.temperature);
        let target = at.format("%Y-%m-%dT%H:%M:%S").to_string();
        let hourly = forecast.hourly.unwrap_or_default();
        let relative_humidity_percent =
            pick_nearest_hourly(&hourly.time, &hourly.relativehumidity_2m, &target);
        let precipitation_mm = pick_nearest_hourly(&hourly.time, &hourly.precipitation, &target);

        let annual_precip_mm = match self.fetch_year_to_date_precip(lat, lon, at.year()).await {
            Ok(total) => Some(total),
            Err(e) => {
                warn!(lat, lon, error = %e, "archive fetch failed, rainfall unavailable");
                None
            }
        };

        let report = WeatherReport {
            temperature_c,
            relative_humidity_percent,
            precipitation_mm,
            annual_precip_mm,
        };
        debug!(lat, lon, ?report, "weather fetched");
        Ok(report)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn get_weather(
        &self,
        lat: f64,
        lon: f64,
        timestamp: Option<&str>,
    ) -> AgriResult<WeatherReport> {
        self.get_weather_at(lat, lon, parse_request_time(timestamp))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn times(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ========== Nearest Hourly Lookup ==========

    #[test]
    fn test_pick_nearest_empty_times() {
        assert_eq!(pick_nearest_hourly(&[], &[json!(50)], "2024-05-01T10"), None);
    }

    #[test]
    fn test_pick_nearest_exact_match() {
        let t = times(&["2024-05-01T09:00", "2024-05-01T10:00", "2024-05-01T11:00"]);
        let v = vec![json!(40), json!(55.5), json!(70)];
        assert_eq!(pick_nearest_hourly(&t, &v, "2024-05-01T10:42:13"), Some(55.5));
    }

    #[test]
    fn test_pick_nearest_before_first_sample() {
        let t = times(&["2024-05-01T09:00", "2024-05-01T10:00"]);
        let v = vec![json!(40), json!(55)];
        assert_eq!(pick_nearest_hourly(&t, &v, "2024-04-30T23:00:00"), Some(40.0));
    }

    #[test]
    fn test_pick_nearest_after_last_sample() {
        let t = times(&["2024-05-01T09:00", "2024-05-01T10:00"]);
        let v = vec![json!(40), json!(55)];
        assert_eq!(pick_nearest_hourly(&t, &v, "2024-05-02T03:00:00"), Some(55.0));
    }

    #[test]
    fn test_pick_nearest_missing_or_bad_value() {
        let t = times(&["2024-05-01T09:00", "2024-05-01T10:00"]);
        assert_eq!(pick_nearest_hourly(&t, &[json!(40)], "2024-05-01T10"), None);
        assert_eq!(
            pick_nearest_hourly(&t, &[json!(40), Value::Null], "2024-05-01T10"),
            None
        );
        assert_eq!(
            pick_nearest_hourly(&t, &[json!(40), json!("61")], "2024-05-01T10"),
            Some(61.0)
        );
    }

    // ========== Request Time ==========

    #[test]
    fn test_parse_request_time() {
        let keep_offset = parse_request_time(Some("2024-03-05T14:30:00+05:30"));
        assert_eq!(keep_offset.format("%Y-%m-%dT%H").to_string(), "2024-03-05T14");

        let naive = parse_request_time(Some("2023-12-31T23:10"));
        assert_eq!(naive.year(), 2023);

        let date_only = parse_request_time(Some("2022-07-01"));
        assert_eq!(date_only.format("%H").to_string(), "00");

        let fallback = parse_request_time(Some("yesterday"));
        assert_eq!(fallback.year(), Utc::now().naive_utc().year());
    }

    #[test]
    fn test_report_complete() {
        let mut report = WeatherReport {
            temperature_c: Some(30.0),
            relative_humidity_percent: Some(60.0),
            precipitation_mm: None,
            annual_precip_mm: Some(400.0),
        };
        assert_eq!(report.complete(), Some((30.0, 60.0, 400.0)));
        report.annual_precip_mm = None;
        assert_eq!(report.complete(), None);
    }

    // ========== HTTP ==========

    fn client(server: &MockServer) -> OpenMeteoClient {
        OpenMeteoClient::new(
            format!("{}/v1/forecast", server.uri()),
            format!("{}/v1/archive", server.uri()),
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn at(raw: &str) -> NaiveDateTime {
        parse_request_time(Some(raw))
    }

    #[tokio::test]
    async fn test_get_weather_combines_forecast_and_archive() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("hourly", "relativehumidity_2m,precipitation"))
            .and(query_param("current_weather", "true"))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current_weather": { "temperature": 31.4 },
                "hourly": {
                    "time": ["2024-06-10T08:00", "2024-06-10T09:00", "2024-06-10T10:00"],
                    "relativehumidity_2m": [70, 65, 60],
                    "precipitation": [0.0, 1.2, 0.4]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .and(query_param("start_date", "2024-01-01"))
            .and(query_param("daily", "precipitation_sum"))
            .and(query_param("timezone", "UTC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "daily": { "precipitation_sum": [1.5, null, 2.5, 0.0] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = client(&server)
            .get_weather_at(26.9, 75.8, at("2024-06-10T09:30:00"))
            .await
            .unwrap();

        assert_eq!(
            report,
            WeatherReport {
                temperature_c: Some(31.4),
                relative_humidity_percent: Some(65.0),
                precipitation_mm: Some(1.2),
                annual_precip_mm: Some(4.0),
            }
        );
    }

    #[tokio::test]
    async fn test_archive_failure_blanks_rainfall_only() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current_weather": { "temperature": 20.0 },
                "hourly": { "time": ["2024-01-01T00:00"], "relativehumidity_2m": [80] }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let report = client(&server)
            .get_weather_at(0.0, 0.0, at("2024-01-01T05:00:00"))
            .await
            .unwrap();

        assert_eq!(report.temperature_c, Some(20.0));
        assert_eq!(report.relative_humidity_percent, Some(80.0));
        assert_eq!(report.annual_precip_mm, None);
        assert_eq!(report.complete(), None);
    }

    #[tokio::test]
    async fn test_forecast_failure_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client(&server).get_weather(10.0, 10.0, None).await;
        assert!(matches!(result, Err(AgriError::Weather(_))));
    }

    #[tokio::test]
    async fn test_missing_blocks_are_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let report = client(&server).get_weather(10.0, 10.0, None).await.unwrap();
        assert_eq!(report.temperature_c, None);
        assert_eq!(report.relative_humidity_percent, None);
        assert_eq!(report.precipitation_mm, None);
        assert_eq!(report.annual_precip_mm, Some(0.0));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_real_open_meteo() {
        let client = OpenMeteoClient::from_config(&AgriConfig::default()).unwrap();
        let report = client.get_weather(26.9124, 75.7873, None).await.unwrap();
        assert!(report.temperature_c.is_some());
    }
}
