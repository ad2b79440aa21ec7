//! # voxd
//!
//! Vox transcription server binary — wires settings, models, the
//! inference pool, and the HTTP server together.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vox_engine::{ModelRegistry, ModelSource, RegistryConfig, default_cache_dir};
use vox_pipeline::InferencePool;
use vox_server::{ServerConfig, VoxServer};
use vox_settings::VoxSettings;

/// Vox transcription server.
#[derive(Parser, Debug)]
#[command(name = "voxd", about = "Speech transcription and separation server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Directory model files are cached in.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Download and load both models at startup instead of on first
    /// request.
    #[arg(long)]
    preload: bool,
}

/// Build the model registry config from settings plus CLI overrides.
fn registry_config(settings: &VoxSettings, model_dir: Option<PathBuf>) -> RegistryConfig {
    let cache_dir = model_dir.unwrap_or_else(|| {
        if settings.models.cache_dir.is_empty() {
            default_cache_dir()
        } else {
            PathBuf::from(&settings.models.cache_dir)
        }
    });
    RegistryConfig {
        transcription_source: ModelSource::transcription(&settings.models.transcription_source),
        separation_source: ModelSource::separation(&settings.models.separation_source),
        cache_dir,
        separation_sample_rate: settings.models.separation_sample_rate,
        ..RegistryConfig::default()
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("VOX_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Settings first: the log level lives there.
    let settings = vox_settings::get_settings();
    init_tracing(&settings.logging.level);

    let metrics_handle = vox_server::metrics::install_recorder();

    let registry = Arc::new(ModelRegistry::new(registry_config(
        settings,
        args.model_dir,
    )));
    if args.preload {
        tracing::info!("preloading models");
        let _ = registry
            .recognizer()
            .await
            .context("Failed to load transcription model")?;
        let _ = registry
            .separator()
            .await
            .context("Failed to load separation model")?;
    }

    let config = ServerConfig {
        host: args.host.unwrap_or_else(|| settings.server.host.clone()),
        port: args.port.unwrap_or(settings.server.port),
        max_body_bytes: settings.server.max_body_bytes,
    };
    let pool = InferencePool::new(settings.server.max_concurrent_inference);

    let server = VoxServer::new(config, registry, pool, metrics_handle);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!("voxd listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(vec![handle], None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["voxd"]);
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.model_dir.is_none());
        assert!(!cli.preload);
    }

    #[test]
    fn cli_overrides_parse() {
        let cli = Cli::parse_from([
            "voxd",
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--model-dir",
            "/tmp/models",
            "--preload",
        ]);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9100));
        assert_eq!(cli.model_dir.as_deref(), Some(std::path::Path::new("/tmp/models")));
        assert!(cli.preload);
    }

    #[test]
    fn registry_config_uses_settings_sources() {
        let settings = VoxSettings::default();
        let cfg = registry_config(&settings, None);
        assert_eq!(
            cfg.transcription_source.repo,
            settings.models.transcription_source
        );
        assert_eq!(cfg.separation_source.repo, settings.models.separation_source);
        assert!(cfg.cache_dir.to_string_lossy().contains(".vox"));
    }

    #[test]
    fn registry_config_model_dir_override_wins() {
        let mut settings = VoxSettings::default();
        settings.models.cache_dir = "/opt/from-settings".to_string();
        let cfg = registry_config(&settings, Some(PathBuf::from("/opt/from-cli")));
        assert_eq!(cfg.cache_dir, PathBuf::from("/opt/from-cli"));
    }

    #[test]
    fn registry_config_settings_cache_dir() {
        let mut settings = VoxSettings::default();
        settings.models.cache_dir = "/opt/from-settings".to_string();
        let cfg = registry_config(&settings, None);
        assert_eq!(cfg.cache_dir, PathBuf::from("/opt/from-settings"));
    }
}
