use crate::{
    Config, WeatherReport,
    error::WeatherError,
    model::Location,
    provider::open_meteo::OpenMeteoClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod open_meteo;

/// How many raw results we ask the geocoder for before deduplicating.
pub const GEOCODING_RESULT_COUNT: u32 = 10;

/// Turns a free-text place name into candidate locations.
#[async_trait]
pub trait GeocodingProvider: Send + Sync + Debug {
    /// Results in the collaborator's order, not yet deduplicated.
    async fn search(&self, query: &str, count: u32) -> Result<Vec<Location>, WeatherError>;
}

/// Current conditions plus a daily forecast for a coordinate pair.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<WeatherReport, WeatherError>;
}

/// Both collaborators, backed by the endpoints named in `config`.
pub fn providers_from_config(
    config: &Config,
) -> anyhow::Result<(Arc<dyn GeocodingProvider>, Arc<dyn WeatherProvider>)> {
    let client = Arc::new(OpenMeteoClient::from_config(config)?);
    let geocoding: Arc<dyn GeocodingProvider> = client.clone();
    let weather: Arc<dyn WeatherProvider> = client;
    Ok((geocoding, weather))
}
