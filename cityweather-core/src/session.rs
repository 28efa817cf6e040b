use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::{
    Config,
    controller::{SelectionController, SelectionHandle},
    history::HistoryStore,
    provider::providers_from_config,
    search::CitySearchService,
    store::FileStore,
    telemetry::{TelemetryEmitter, TelemetryWorker},
    weather::WeatherFetcher,
};

/// Everything wired up from a [`Config`]: search service, running selection
/// controller, and the telemetry worker.
#[derive(Debug)]
pub struct Session {
    pub search: Arc<CitySearchService>,
    pub selection: SelectionHandle,
    controller: JoinHandle<()>,
    telemetry: Option<TelemetryWorker>,
}

impl Session {
    /// Must be called inside a tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let (geocoding, weather) = providers_from_config(config)?;

        let history = HistoryStore::open(Arc::new(FileStore::new(config.data_dir()?)));

        let (emitter, telemetry) = match config.telemetry_endpoint() {
            Some(endpoint) => {
                let (emitter, worker) =
                    TelemetryEmitter::spawn(endpoint, config.request_timeout())?;
                (emitter, Some(worker))
            }
            None => (TelemetryEmitter::disabled(), None),
        };

        let (selection, controller) =
            SelectionController::spawn(history, WeatherFetcher::new(weather), emitter);

        Ok(Self {
            search: Arc::new(CitySearchService::new(geocoding)),
            selection,
            controller,
            telemetry,
        })
    }

    /// Stops the controller and gives queued telemetry up to `grace` to go out.
    /// Clones of the selection handle must already be dropped.
    pub async fn shutdown(self, grace: Duration) {
        let Self { selection, controller, telemetry, .. } = self;
        drop(selection);

        match tokio::time::timeout(grace, controller).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "selection controller panicked"),
            Err(_) => warn!("selection controller still running at shutdown"),
        }

        if let Some(worker) = telemetry {
            worker.finish(grace).await;
        }
    }
}
