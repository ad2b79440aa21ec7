//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics`
/// endpoint, or `None` if a recorder is already installed (tests,
/// repeated init).
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "metrics recorder not installed, /metrics disabled");
            None
        }
    }
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across crates.

/// HTTP requests total (counter, labels: endpoint).
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// Request duration seconds (histogram, labels: endpoint).
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
/// Requests short-circuited by the silence gate (counter).
pub const SILENCE_SKIPS_TOTAL: &str = "silence_skips_total";
/// Requests currently in the inference stage (gauge).
pub const INFERENCE_IN_FLIGHT: &str = "inference_in_flight";
