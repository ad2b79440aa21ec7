//! # vox-server
//!
//! Axum HTTP server exposing the transcription backend:
//!
//! - `POST /transcription/` — transcribe raw f32 PCM
//! - `POST /transcription/separation` — separate speakers, transcribe each
//! - `GET /health` — liveness plus model-load state
//! - `GET /metrics` — Prometheus text format
//!
//! Request lifecycle is received → validated → processed → responded,
//! with no retries. Inference failures are reported in-band in the
//! response envelope; HTTP 400 is reserved for malformed requests.

pub mod config;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use routes::{SeparatedTranscriptionResponse, SpeakerEntry, TranscriptionResponse};
pub use server::{AppState, VoxServer};
pub use shutdown::ShutdownCoordinator;
