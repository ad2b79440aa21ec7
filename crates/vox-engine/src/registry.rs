//! Once-only model registry.
//!
//! Holds at most one loaded instance of each model for the lifetime of
//! the process. First use constructs the engine; concurrent first
//! calls still produce exactly one construction (`tokio::sync::OnceCell`
//! serializes initializers). There is no reload, swap, or teardown
//! path — models change via redeploy.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::asr::AsrEngine;
use crate::model::{self, ModelSource};
use crate::separation::SeparationEngine;
use crate::traits::{SpeechRecognizer, SpeechSeparator};
use crate::types::EngineError;

/// Where models come from and how the separation variant behaves.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Source for the transcription model.
    pub transcription_source: ModelSource,
    /// Source for the separation model.
    pub separation_source: ModelSource,
    /// Local cache directory; each model gets its own subdirectory.
    pub cache_dir: PathBuf,
    /// Sample rate of the separation model variant (8 kHz or 16 kHz).
    pub separation_sample_rate: u32,
    /// Source count of the separation model variant.
    pub separation_sources: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            transcription_source: ModelSource::transcription(model::DEFAULT_TRANSCRIPTION_REPO),
            separation_source: ModelSource::separation(model::DEFAULT_SEPARATION_REPO),
            cache_dir: model::default_cache_dir(),
            separation_sample_rate: 16_000,
            separation_sources: 2,
        }
    }
}

/// Owns the two model singletons and loads each on first use.
pub struct ModelRegistry {
    config: RegistryConfig,
    recognizer: OnceCell<Arc<dyn SpeechRecognizer>>,
    separator: OnceCell<Arc<dyn SpeechSeparator>>,
}

impl ModelRegistry {
    /// Registry that lazily loads engines per `config`.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            recognizer: OnceCell::new(),
            separator: OnceCell::new(),
        }
    }

    /// Registry over prebuilt model instances (dependency injection
    /// for tests and for eager startup loading).
    pub fn with_models(
        recognizer: Arc<dyn SpeechRecognizer>,
        separator: Arc<dyn SpeechSeparator>,
    ) -> Self {
        Self {
            config: RegistryConfig::default(),
            recognizer: OnceCell::new_with(Some(recognizer)),
            separator: OnceCell::new_with(Some(separator)),
        }
    }

    /// The shared transcription model, constructed on first call.
    pub async fn recognizer(&self) -> Result<Arc<dyn SpeechRecognizer>, EngineError> {
        self.recognizer_with(|| async {
            let dir = self.config.cache_dir.join("transcription");
            self.config.transcription_source.ensure(&dir).await?;
            let engine = tokio::task::spawn_blocking(move || AsrEngine::load(&dir))
                .await
                .map_err(|e| EngineError::Inference(format!("load task join: {e}")))??;
            info!("transcription model loaded");
            Ok(Arc::new(engine) as Arc<dyn SpeechRecognizer>)
        })
        .await
    }

    /// The shared separation model, constructed on first call.
    pub async fn separator(&self) -> Result<Arc<dyn SpeechSeparator>, EngineError> {
        self.separator_with(|| async {
            let dir = self.config.cache_dir.join("separation");
            self.config.separation_source.ensure(&dir).await?;
            let rate = self.config.separation_sample_rate;
            let sources = self.config.separation_sources;
            let engine =
                tokio::task::spawn_blocking(move || SeparationEngine::load(&dir, rate, sources))
                    .await
                    .map_err(|e| EngineError::Inference(format!("load task join: {e}")))??;
            info!("separation model loaded");
            Ok(Arc::new(engine) as Arc<dyn SpeechSeparator>)
        })
        .await
    }

    /// Once-only init seam for the recognizer cell. At most one `init`
    /// ever runs to completion, no matter how many callers race here.
    async fn recognizer_with<F, Fut>(&self, init: F) -> Result<Arc<dyn SpeechRecognizer>, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn SpeechRecognizer>, EngineError>>,
    {
        self.recognizer.get_or_try_init(init).await.cloned()
    }

    /// Once-only init seam for the separator cell.
    async fn separator_with<F, Fut>(&self, init: F) -> Result<Arc<dyn SpeechSeparator>, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn SpeechSeparator>, EngineError>>,
    {
        self.separator.get_or_try_init(init).await.cloned()
    }

    /// Whether the transcription model has been constructed.
    pub fn recognizer_loaded(&self) -> bool {
        self.recognizer.initialized()
    }

    /// Whether the separation model has been constructed.
    pub fn separator_loaded(&self) -> bool {
        self.separator.initialized()
    }
}
