use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{
    error::FetchError,
    model::{ForecastSample, LocationQuery, WeatherSnapshot},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the provider at another deployment of the same API.
    pub fn with_base_url(api_key: String, base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &LocationQuery,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());

        let mut params: Vec<(&str, String)> = match query {
            LocationQuery::City(name) => vec![("q", name.clone())],
            LocationQuery::Coordinates { latitude, longitude } => {
                vec![("lat", latitude.to_string()), ("lon", longitude.to_string())]
            }
        };
        params.push(("units", "metric".to_string()));
        params.push(("appid", self.api_key.clone()));

        tracing::debug!(?endpoint, %query, "requesting OpenWeather");

        let res = self.http.get(&url).query(&params).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(
                ?endpoint,
                %status,
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );

            if matches!(endpoint, Endpoint::Current) && is_not_found(status) {
                if let LocationQuery::City(name) = query {
                    return Err(FetchError::LocationNotFound(name.clone()));
                }
            }

            return Err(FetchError::Unavailable(provider_message(&body)));
        }

        serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(?endpoint, %err, "failed to parse OpenWeather response");
            FetchError::Unavailable(None)
        })
    }
}

/// Statuses that mean "no such place" for a city lookup. Auth and quota
/// problems are reported as unavailability instead.
fn is_not_found(status: StatusCode) -> bool {
    status.is_client_error()
        && !matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        )
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwError>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
}

#[derive(Debug, Deserialize)]
struct OwError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

fn build_snapshot(
    query: &LocationQuery,
    current: OwCurrentResponse,
    forecast: OwForecastResponse,
) -> WeatherSnapshot {
    let (description, icon) = condition(&current.weather);

    let location_name = if current.name.is_empty() {
        query.to_string()
    } else {
        current.name
    };

    let forecast = forecast
        .list
        .into_iter()
        .filter_map(|entry| {
            let timestamp = unix_to_utc(entry.dt)?;
            let (description, icon) = condition(&entry.weather);
            Some(ForecastSample {
                timestamp,
                temperature_c: entry.main.temp,
                description,
                icon,
            })
        })
        .collect();

    WeatherSnapshot {
        location_name,
        country: current.sys.country.unwrap_or_default(),
        temperature_c: current.main.temp,
        feels_like_c: current.main.feels_like.unwrap_or(current.main.temp),
        humidity_pct: current.main.humidity,
        wind_speed_mps: current.wind.speed,
        description,
        icon,
        forecast,
        fetched_at: Utc::now(),
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        let (current, forecast) = match query {
            // A missing city is only detectable on the current-conditions
            // call, so it goes first.
            LocationQuery::City(_) => {
                let current = self
                    .request::<OwCurrentResponse>(Endpoint::Current, query)
                    .await?;
                let forecast = self
                    .request::<OwForecastResponse>(Endpoint::Forecast, query)
                    .await?;
                (current, forecast)
            }
            LocationQuery::Coordinates { .. } => {
                let (current, forecast) = tokio::join!(
                    self.request::<OwCurrentResponse>(Endpoint::Current, query),
                    self.request::<OwForecastResponse>(Endpoint::Forecast, query),
                );
                (current?, forecast?)
            }
        };

        let snapshot = build_snapshot(query, current, forecast);
        tracing::info!(
            location = %snapshot.location_label(),
            samples = snapshot.forecast.len(),
            "fetched weather"
        );
        Ok(snapshot)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
