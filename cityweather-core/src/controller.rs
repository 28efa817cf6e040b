//! Selection state machine.
//!
//! The controller runs as its own task and is the only writer of
//! [`SelectionState`]. Callers talk to it through a [`SelectionHandle`]:
//! commands go in over an mpsc channel, and every change is published as a
//! fresh snapshot on a watch channel.
//!
//! Each selection bumps a generation counter. Weather results carry the
//! generation they were started for and are dropped unless it is still the
//! current one, so a slow fetch for an old selection can't overwrite a newer
//! one. In-flight requests are not cancelled.

use chrono::Utc;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    history::HistoryStore,
    model::{Location, SelectionState, WeatherReport},
    telemetry::TelemetryEmitter,
    weather::WeatherFetcher,
};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug)]
enum Command {
    Select { location: Location, reply: oneshot::Sender<SelectionState> },
    ToggleExpand { name: String, reply: oneshot::Sender<SelectionState> },
}

#[derive(Debug)]
struct WeatherOutcome {
    generation: u64,
    name: String,
    result: Result<Option<WeatherReport>, WeatherError>,
}

#[derive(Debug, thiserror::Error)]
#[error("selection controller has shut down")]
pub struct ControllerClosed;

pub struct SelectionController {
    state: SelectionState,
    generation: u64,
    history: HistoryStore,
    weather: WeatherFetcher,
    telemetry: TelemetryEmitter,
    snapshots: watch::Sender<SelectionState>,
    outcomes_tx: mpsc::UnboundedSender<WeatherOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<WeatherOutcome>,
}

impl SelectionController {
    /// Starts the controller task. It stops once every handle is dropped.
    pub fn spawn(
        history: HistoryStore,
        weather: WeatherFetcher,
        telemetry: TelemetryEmitter,
    ) -> (SelectionHandle, JoinHandle<()>) {
        let state = SelectionState { history: history.list().clone(), ..Default::default() };
        let (snapshots, snapshot_rx) = watch::channel(state.clone());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        let controller = Self {
            state,
            generation: 0,
            history,
            weather,
            telemetry,
            snapshots,
            outcomes_tx,
            outcomes_rx,
        };
        let task = tokio::spawn(controller.run(command_rx));

        (SelectionHandle { commands: command_tx, snapshots: snapshot_rx }, task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle(command);
                }
                Some(outcome) = self.outcomes_rx.recv() => {
                    if self.apply_outcome(outcome) {
                        self.publish();
                    }
                }
            }
        }
        debug!("selection controller stopped");
    }

    fn handle(&mut self, command: Command) {
        let reply = match command {
            Command::Select { location, reply } => {
                self.select_city(location);
                reply
            }
            Command::ToggleExpand { name, reply } => {
                self.toggle_expand(name);
                reply
            }
        };
        self.publish();
        // The caller may have stopped waiting.
        let _ = reply.send(self.state.clone());
    }

    /// Returns `false` when the location was rejected and nothing changed.
    fn select_city(&mut self, location: Location) -> bool {
        if location.coordinates().is_none() {
            let err = WeatherError::Validation(format!("'{}' has no coordinates", location.name));
            warn!(error = %err, "ignoring selection");
            return false;
        }

        self.generation += 1;
        info!(name = %location.name, generation = self.generation, "city selected");

        self.state.selected_location = Some(location.clone());
        self.state.conditions = None;
        self.state.forecast = None;
        self.state.is_loading = true;

        self.state.history = self.history.record(location.clone());
        self.telemetry.emit(&location, Utc::now());

        let fetcher = self.weather.clone();
        let outcomes = self.outcomes_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = fetcher.fetch(&location).await;
            // Closed only when the controller is gone.
            let _ = outcomes.send(WeatherOutcome { generation, name: location.name, result });
        });

        true
    }

    fn toggle_expand(&mut self, name: String) {
        if self.state.is_expanded(&name) {
            self.state.expanded_location_name = None;
            return;
        }

        if self.state.is_selected(&name) {
            self.state.expanded_location_name = Some(name);
            return;
        }

        let Some(location) = self.history.find(&name).cloned() else {
            warn!(%name, "no history entry to expand");
            return;
        };

        if self.select_city(location) {
            self.state.expanded_location_name = Some(name);
        }
    }

    /// Returns `true` when the state changed.
    fn apply_outcome(&mut self, outcome: WeatherOutcome) -> bool {
        if outcome.generation != self.generation || !self.state.is_selected(&outcome.name) {
            debug!(
                name = %outcome.name,
                generation = outcome.generation,
                current = self.generation,
                "discarding stale weather result"
            );
            return false;
        }

        self.state.is_loading = false;
        match outcome.result {
            Ok(Some(report)) => {
                debug!(name = %outcome.name, days = report.forecast.len(), "weather ready");
                self.state.conditions = Some(report.conditions);
                self.state.forecast = Some(report.forecast);
            }
            Ok(None) => debug!(name = %outcome.name, "weather fetch skipped"),
            Err(err) => warn!(name = %outcome.name, error = %err, "weather fetch failed"),
        }
        true
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.clone());
    }
}

/// Cloneable front end of a running [`SelectionController`].
#[derive(Debug, Clone)]
pub struct SelectionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SelectionState>,
}

impl SelectionHandle {
    /// Selects `location` and returns the state right after the selection was
    /// applied (normally loading). Use [`SelectionHandle::settled`] to wait for
    /// the weather.
    pub async fn select_city(
        &self,
        location: Location,
    ) -> Result<SelectionState, ControllerClosed> {
        self.request(|reply| Command::Select { location, reply }).await
    }

    /// Expands or collapses a history row.
    pub async fn toggle_expand(
        &self,
        name: impl Into<String>,
    ) -> Result<SelectionState, ControllerClosed> {
        let name = name.into();
        self.request(|reply| Command::ToggleExpand { name, reply }).await
    }

    pub fn snapshot(&self) -> SelectionState {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.snapshots.clone()
    }

    /// Waits until no fetch is pending and returns that state.
    pub async fn settled(&self) -> Result<SelectionState, ControllerClosed> {
        let mut snapshots = self.snapshots.clone();
        let state =
            snapshots.wait_for(|state| !state.is_loading).await.map_err(|_| ControllerClosed)?;
        Ok(state.clone())
    }

    async fn request(
        &self,
        command: impl FnOnce(oneshot::Sender<SelectionState>) -> Command,
    ) -> Result<SelectionState, ControllerClosed> {
        let (reply, response) = oneshot::channel();
        self.commands.send(command(reply)).await.map_err(|_| ControllerClosed)?;
        response.await.map_err(|_| ControllerClosed)
    }
}
