/// Failures the core recovers from locally.
///
/// None of these reach the user as an error: every component maps them to a
/// safe fallback (empty candidates, no weather, skipped fetch, empty history)
/// and logs them.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// Collaborator unreachable, timed out, or answered with a non-2xx status.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body is missing fields we rely on or could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Input rejected before any call was made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored history could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl WeatherError {
    pub fn is_network(&self) -> bool {
        matches!(self, WeatherError::Network(_))
    }
}
