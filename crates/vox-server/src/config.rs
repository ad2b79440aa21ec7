//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the vox HTTP server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Max request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 0,
            max_body_bytes: 100 * 1024 * 1024, // 100 MB of raw PCM
        }
    }
}
