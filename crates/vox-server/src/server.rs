//! `VoxServer` — Axum HTTP server over the transcription pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use vox_engine::ModelRegistry;
use vox_pipeline::{InferencePool, SpeakerPipeline, TranscriptionService};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::routes;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Single-speaker transcription service.
    pub transcription: TranscriptionService,
    /// Separation + per-speaker transcription pipeline.
    pub pipeline: SpeakerPipeline,
    /// Model registry, for health reporting.
    pub registry: Arc<ModelRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The main vox server.
pub struct VoxServer {
    config: ServerConfig,
    state: AppState,
}

impl VoxServer {
    /// Create a new server over a model registry and inference pool.
    pub fn new(
        config: ServerConfig,
        registry: Arc<ModelRegistry>,
        pool: InferencePool,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let transcription = TranscriptionService::new(registry.clone(), pool);
        let pipeline = SpeakerPipeline::new(transcription.clone());
        let state = AppState {
            transcription,
            pipeline,
            registry,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics,
        };
        Self { config, state }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/transcription/", post(routes::transcribe_handler))
            .route("/transcription/separation", post(routes::separation_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and start serving.
    ///
    /// Returns the bound address (useful with port `0`) and the serve
    /// task handle. The task runs until the shutdown coordinator fires.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the address cannot be bound.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let token = self.state.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server task exited with error");
            }
        });

        info!(%local_addr, "listening");
        Ok((local_addr, handle))
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /
async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Speech Transcription API" }))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.registry.recognizer_loaded(),
        state.registry.separator_loaded(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics {
        Some(ref handle) => (StatusCode::OK, crate::metrics::render(handle)),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed\n".to_string(),
        ),
    }
}
