use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    Config,
    error::WeatherError,
    model::{CurrentConditions, Forecast, Location, WeatherCondition, WeatherReport},
};

use super::{GeocodingProvider, WeatherProvider};

const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weathercode,windspeed_10m_max";

/// Client for the Open-Meteo geocoding and forecast APIs (no key required).
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    geocoding_url: String,
    weather_url: String,
    http: Client,
}

impl OpenMeteoClient {
    pub fn new(
        geocoding_url: impl Into<String>,
        weather_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Open-Meteo")?;

        Ok(Self { geocoding_url: geocoding_url.into(), weather_url: weather_url.into(), http })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.geocoding_url, &config.weather_url, config.request_timeout())
    }

    async fn get_text(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, WeatherError> {
        debug!(%url, ?query, "open-meteo {what} request");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| WeatherError::Network(format!("Failed to send {what} request: {err}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|err| {
            WeatherError::Network(format!("Failed to read {what} response body: {err}"))
        })?;

        if !status.is_success() {
            return Err(WeatherError::Network(format!(
                "Open-Meteo {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OmSearchResponse {
    results: Option<Vec<OmPlace>>,
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    windspeed: f64,
    #[serde(rename = "windGust")]
    wind_gust: Option<f64>,
    weathercode: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    #[serde(default)]
    weathercode: Vec<i32>,
    #[serde(default)]
    windspeed_10m_max: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current_weather: Option<OmCurrentWeather>,
    daily: Option<OmDaily>,
}

#[async_trait]
impl GeocodingProvider for OpenMeteoClient {
    async fn search(&self, query: &str, count: u32) -> Result<Vec<Location>, WeatherError> {
        let url = endpoint(&self.geocoding_url, "search");
        let count = count.to_string();

        let body = self
            .get_text("geocoding", &url, &[("name", query), ("count", count.as_str())])
            .await?;

        let parsed: OmSearchResponse = serde_json::from_str(&body).map_err(|err| {
            WeatherError::MalformedResponse(format!("Failed to parse geocoding JSON: {err}"))
        })?;

        let results = parsed.results.ok_or_else(|| {
            WeatherError::MalformedResponse("geocoding response has no `results`".to_string())
        })?;

        Ok(results
            .into_iter()
            .filter_map(|place| {
                Some(Location {
                    name: place.name?,
                    latitude: place.latitude,
                    longitude: place.longitude,
                })
            })
            .collect())
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<WeatherReport, WeatherError> {
        let url = endpoint(&self.weather_url, "forecast");
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();

        let body = self
            .get_text(
                "forecast",
                &url,
                &[
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("current_weather", "true"),
                    ("daily", DAILY_FIELDS),
                    ("timezone", "auto"),
                ],
            )
            .await?;

        let parsed: OmForecastResponse = serde_json::from_str(&body).map_err(|err| {
            WeatherError::MalformedResponse(format!("Failed to parse forecast JSON: {err}"))
        })?;

        shape_report(parsed)
    }
}

fn shape_report(parsed: OmForecastResponse) -> Result<WeatherReport, WeatherError> {
    let current = parsed.current_weather.ok_or_else(|| {
        WeatherError::MalformedResponse("forecast response has no `current_weather`".to_string())
    })?;
    let daily = parsed.daily.ok_or_else(|| {
        WeatherError::MalformedResponse("forecast response has no `daily`".to_string())
    })?;

    let dates = daily
        .time
        .iter()
        .map(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d"))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            WeatherError::MalformedResponse(format!("Invalid date in daily forecast: {err}"))
        })?;

    let conditions = CurrentConditions {
        temperature: current.temperature,
        windspeed: current.windspeed,
        wind_gust: current.wind_gust,
        condition: current.weathercode.map(WeatherCondition::from_wmo_code),
    };

    let forecast = Forecast::from_daily(
        dates,
        daily.temperature_2m_max,
        daily.temperature_2m_min,
        daily.weathercode,
        daily.windspeed_10m_max,
    );

    Ok(WeatherReport { conditions, forecast })
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{path}", base.trim_end_matches('/'))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
