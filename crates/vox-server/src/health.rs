//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Whether the transcription model is loaded and ready.
    pub transcription_model_loaded: bool,
    /// Whether the separation model is loaded and ready.
    pub separation_model_loaded: bool,
}

/// Build a health response from live state.
pub fn health_check(
    start_time: Instant,
    transcription_loaded: bool,
    separation_loaded: bool,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        transcription_model_loaded: transcription_loaded,
        separation_model_loaded: separation_loaded,
    }
}
