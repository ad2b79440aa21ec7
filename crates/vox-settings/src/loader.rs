//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`VoxSettings::default()`]
//! 2. If `~/.vox/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::VoxSettings;

/// Resolve the path to the settings file (`~/.vox/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".vox").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<VoxSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<VoxSettings> {
    let defaults = serde_json::to_value(VoxSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: VoxSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut VoxSettings) {
    if let Some(v) = read_env_string("VOX_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("VOX_PORT", 0, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_usize("VOX_MAX_CONCURRENT_INFERENCE", 1, 256) {
        settings.server.max_concurrent_inference = v;
    }
    if let Some(v) = read_env_usize("VOX_MAX_BODY_BYTES", 1024, 1_073_741_824) {
        settings.server.max_body_bytes = v;
    }
    if let Some(v) = read_env_string("VOX_TRANSCRIPTION_SOURCE") {
        settings.models.transcription_source = v;
    }
    if let Some(v) = read_env_string("VOX_SEPARATION_SOURCE") {
        settings.models.separation_source = v;
    }
    if let Some(v) = read_env_string("VOX_MODEL_DIR") {
        settings.models.cache_dir = v;
    }
    if let Some(v) = read_env_string("VOX_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}
