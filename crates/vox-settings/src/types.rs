//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON
//! file format. Each type implements [`Default`] with production default
//! values, and `#[serde(default)]` allows partial JSON: missing fields
//! get their default value during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings type for the vox backend.
///
/// Loaded from `~/.vox/settings.json` with defaults applied for missing
/// fields. `VOX_*` environment variables override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "server": { "port": 9000 },
///   "models": { "cacheDir": "/var/lib/vox/models" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoxSettings {
    /// Settings schema version.
    pub version: String,
    /// HTTP server network settings.
    pub server: ServerSettings,
    /// Pretrained model sources and cache location.
    pub models: ModelSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for VoxSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            models: ModelSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// HTTP server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port. `0` asks the OS for a free port.
    pub port: u16,
    /// Maximum number of model inferences running at once.
    pub max_concurrent_inference: usize,
    /// Request body size cap in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_concurrent_inference: 2,
            max_body_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Pretrained model sources and cache location.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Hugging Face repo id for the transcription model.
    pub transcription_source: String,
    /// Hugging Face repo id for the separation model.
    pub separation_source: String,
    /// Local directory model files are downloaded into. Empty string
    /// means the built-in default (`~/.vox/models`).
    pub cache_dir: String,
    /// Sample rate the separation model was trained at, in Hz.
    pub separation_sample_rate: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            transcription_source: "istupakov/parakeet-tdt-0.6b-v3-onnx".to_string(),
            separation_source: "speechbrain/sepformer-whamr16k".to_string(),
            cache_dir: String::new(),
            separation_sample_rate: 16_000,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default tracing filter directive (`error`..`trace`, or a full
    /// `EnvFilter` expression).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(VoxSettings::default()).unwrap();
        assert!(json["server"]["maxConcurrentInference"].is_number());
        assert!(json["models"]["transcriptionSource"].is_string());
        assert!(json["models"]["separationSampleRate"].is_number());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: VoxSettings =
            serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.models.separation_sample_rate, 16_000);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn roundtrip_preserves_values() {
        let mut settings = VoxSettings::default();
        settings.server.max_concurrent_inference = 8;
        settings.models.cache_dir = "/tmp/models".to_string();
        let json = serde_json::to_string(&settings).unwrap();
        let back: VoxSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.max_concurrent_inference, 8);
        assert_eq!(back.models.cache_dir, "/tmp/models");
    }
}
