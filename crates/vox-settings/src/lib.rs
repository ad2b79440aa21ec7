//! # vox-settings
//!
//! Configuration management with layered sources for the vox backend.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`VoxSettings::default()`]
//! 2. **User file** — `~/.vox/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `VOX_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use vox_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("listen port: {}", settings.server.port);
//! ```

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{LoggingSettings, ModelSettings, ServerSettings, VoxSettings};

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. Loaded from
/// `~/.vox/settings.json` with env var overrides, or compiled defaults
/// if loading fails.
static SETTINGS: OnceLock<VoxSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.vox/settings.json` with env
/// var overrides. On subsequent calls, returns the cached value. If
/// loading fails, returns compiled defaults.
pub fn get_settings() -> &'static VoxSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = VoxSettings::default();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.server.max_concurrent_inference, 2);
        assert_eq!(
            settings.models.transcription_source,
            "istupakov/parakeet-tdt-0.6b-v3-onnx"
        );
        assert_eq!(
            settings.models.separation_source,
            "speechbrain/sepformer-whamr16k"
        );
        assert!(settings.models.cache_dir.is_empty());
    }

    #[test]
    fn get_settings_caches_one_instance() {
        let first = get_settings();
        let second = get_settings();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn deep_merge_re_exported() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"y": 2});
        let merged = deep_merge(a, b);
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }
}
