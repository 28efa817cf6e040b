use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    model::CandidateSet,
    provider::{GEOCODING_RESULT_COUNT, GeocodingProvider},
};

/// Query-to-candidates service.
///
/// Every dispatched lookup takes the next sequence number. Only the response
/// to the most recently dispatched lookup may replace the last known set; an
/// older response is dropped and its caller gets the current set back.
#[derive(Debug)]
pub struct CitySearchService {
    provider: Arc<dyn GeocodingProvider>,
    dispatched: AtomicU64,
    last_known: Mutex<CandidateSet>,
}

impl CitySearchService {
    pub fn new(provider: Arc<dyn GeocodingProvider>) -> Self {
        Self { provider, dispatched: AtomicU64::new(0), last_known: Mutex::default() }
    }

    pub fn last_known(&self) -> CandidateSet {
        self.last_known.lock().clone()
    }

    pub async fn search(&self, query: &str) -> CandidateSet {
        if query.trim().is_empty() {
            return self.last_known();
        }

        let sequence = self.dispatched.fetch_add(1, Ordering::SeqCst) + 1;

        let candidates = match self.provider.search(query, GEOCODING_RESULT_COUNT).await {
            Ok(results) => CandidateSet::from_results(results),
            Err(err @ WeatherError::MalformedResponse(_)) => {
                debug!(query, error = %err, "no usable geocoding results");
                CandidateSet::default()
            }
            Err(err) => {
                warn!(query, error = %err, "city search failed");
                CandidateSet::default()
            }
        };

        let mut last_known = self.last_known.lock();
        if sequence != self.dispatched.load(Ordering::SeqCst) {
            debug!(query, sequence, "discarding stale search response");
            return last_known.clone();
        }

        *last_known = candidates.clone();
        candidates
    }
}
