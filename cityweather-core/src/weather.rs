use std::sync::Arc;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{Location, WeatherReport},
    provider::WeatherProvider,
};

/// Fetches and shapes weather for a location. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherFetcher {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// `Ok(None)` without any request when the location lacks usable
    /// coordinates. One attempt, no retry.
    pub async fn fetch(&self, location: &Location) -> Result<Option<WeatherReport>, WeatherError> {
        let Some((latitude, longitude)) = location.coordinates() else {
            debug!(name = %location.name, "skipping weather fetch: no coordinates");
            return Ok(None);
        };

        debug!(name = %location.name, latitude, longitude, "fetching weather");
        self.provider.forecast(latitude, longitude).await.map(Some)
    }
}
