//! Best-effort selection logging.
//!
//! Events go onto an unbounded queue drained by a background worker, so a
//! slow or failing sink can never hold up the caller.

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::model::Location;

/// Body of `POST /log`. The sink answers 400 unless both fields are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub city: String,
    /// RFC 3339 with milliseconds, UTC (`2024-06-03T12:00:00.000Z`).
    pub timestamp: String,
}

impl SelectionEvent {
    pub fn new(location: &Location, at: DateTime<Utc>) -> Self {
        Self {
            city: location.name.clone(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryEmitter {
    queue: Option<mpsc::UnboundedSender<SelectionEvent>>,
}

impl TelemetryEmitter {
    /// Emitter that drops every event.
    pub fn disabled() -> Self {
        Self { queue: None }
    }

    /// Starts the worker posting to `endpoint`. Must run inside a tokio runtime.
    pub fn spawn(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<(Self, TelemetryWorker)> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for telemetry")?;

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(http, endpoint.into(), rx));

        Ok((Self { queue: Some(tx) }, TelemetryWorker { handle }))
    }

    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    /// Queues a selection event. Never blocks and never fails.
    pub fn emit(&self, location: &Location, timestamp: DateTime<Utc>) {
        let Some(queue) = &self.queue else {
            debug!(city = %location.name, "telemetry disabled; dropping event");
            return;
        };

        if location.name.trim().is_empty() {
            warn!("dropping selection event without a city name");
            return;
        }

        if queue.send(SelectionEvent::new(location, timestamp)).is_err() {
            debug!(city = %location.name, "telemetry worker has stopped; dropping event");
        }
    }
}

/// Handle to the background poster.
#[derive(Debug)]
pub struct TelemetryWorker {
    handle: JoinHandle<()>,
}

impl TelemetryWorker {
    /// Waits up to `grace` for queued events to be sent. The worker only
    /// finishes once every [`TelemetryEmitter`] clone has been dropped.
    pub async fn finish(self, grace: Duration) {
        match tokio::time::timeout(grace, self.handle).await {
            Ok(Ok(())) => debug!("telemetry queue drained"),
            Ok(Err(err)) => warn!(error = %err, "telemetry worker failed"),
            Err(_) => debug!("telemetry queue not drained in time; giving up"),
        }
    }
}

async fn run_worker(
    http: Client,
    endpoint: String,
    mut events: mpsc::UnboundedReceiver<SelectionEvent>,
) {
    while let Some(event) = events.recv().await {
        match http.post(&endpoint).json(&event).send().await {
            Ok(res) if res.status().is_success() => {
                debug!(city = %event.city, "selection logged");
            }
            Ok(res) => {
                warn!(city = %event.city, status = %res.status(), "telemetry sink rejected event");
            }
            Err(err) => {
                warn!(city = %event.city, error = %err, "telemetry sink unreachable");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn event_timestamp_is_iso_8601_with_millis() {
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let event = SelectionEvent::new(&Location::new("London", 51.5, -0.12), at);

        assert_eq!(event.city, "London");
        assert_eq!(event.timestamp, "2024-06-03T12:00:00.000Z");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"city": "London", "timestamp": "2024-06-03T12:00:00.000Z"})
        );
    }

    #[test]
    fn disabled_emitter_drops_silently() {
        let emitter = TelemetryEmitter::disabled();
        assert!(!emitter.is_enabled());
        emitter.emit(&Location::new("Oslo", 59.9, 10.7), Utc::now());
    }

    #[tokio::test]
    async fn unreachable_sink_never_fails_the_caller() {
        let (emitter, worker) =
            TelemetryEmitter::spawn("http://127.0.0.1:9/log", Duration::from_millis(200)).unwrap();

        emitter.emit(&Location::new("Oslo", 59.9, 10.7), Utc::now());
        drop(emitter);

        worker.finish(Duration::from_secs(5)).await;
    }

    #[tokio::test]
    async fn events_without_a_city_name_never_reach_the_sink() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/log"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (emitter, worker) =
            TelemetryEmitter::spawn(format!("{}/log", server.uri()), Duration::from_secs(1))
                .unwrap();

        let at = Utc::now();
        emitter.emit(&Location::new("", 1.0, 1.0), at);
        emitter.emit(&Location::new("  ", 1.0, 1.0), at);
        emitter.emit(&Location::new("Oslo", 59.9, 10.7), at);
        drop(emitter);
        worker.finish(Duration::from_secs(5)).await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let event: SelectionEvent = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(event.city, "Oslo");
    }
}
