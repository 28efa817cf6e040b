//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - City search against a geocoding API, deduplicated and sequenced
//! - Weather fetching and shaping (current conditions + 5-day forecast)
//! - A small persisted history of recently viewed cities
//! - The selection controller that ties these together
//! - Best-effort telemetry of selection events
//!
//! It is used by `cityweather-cli`, but the controller and services don't
//! depend on any particular front end.

pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod search;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod weather;

pub use config::Config;
pub use controller::{ControllerClosed, SelectionController, SelectionHandle};
pub use error::WeatherError;
pub use history::HistoryStore;
pub use model::{
    CandidateSet, CurrentConditions, Forecast, ForecastDay, HistoryList, Location,
    SelectionPhase, SelectionState, WeatherCondition, WeatherReport,
};
pub use provider::{GeocodingProvider, WeatherProvider};
pub use search::CitySearchService;
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use telemetry::{SelectionEvent, TelemetryEmitter, TelemetryWorker};
pub use weather::WeatherFetcher;
