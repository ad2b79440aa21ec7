//! Model file management — Hugging Face download and path resolution.
//!
//! Model identifiers and the cache directory are configuration, not
//! build-time constants; defaults live in [`ModelSource::transcription`]
//! and [`ModelSource::separation`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::types::EngineError;

/// Default Hugging Face repository for the transcription model.
pub const DEFAULT_TRANSCRIPTION_REPO: &str = "istupakov/parakeet-tdt-0.6b-v3-onnx";

/// Default Hugging Face repository for the separation model.
pub const DEFAULT_SEPARATION_REPO: &str = "speechbrain/sepformer-whamr16k";

/// Files required by the transcription engine.
const TRANSCRIPTION_FILES: &[&str] = &[
    "nemo128.onnx",
    "encoder-model.onnx",
    "encoder-model.onnx.data",
    "decoder_joint-model.onnx",
    "vocab.txt",
];

/// Files required by the separation engine.
const SEPARATION_FILES: &[&str] = &["model.onnx"];

/// Default model cache directory under `~/.vox/models/`.
pub fn default_cache_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".vox").join("models")
}

/// A pretrained model identified by its Hugging Face repo and file set.
#[derive(Debug, Clone)]
pub struct ModelSource {
    /// Hugging Face repository id (`owner/name`).
    pub repo: String,
    /// Files the engine needs from that repo.
    pub files: Vec<String>,
}

impl ModelSource {
    /// Source for the transcription model (override the default repo
    /// via configuration).
    pub fn transcription(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            files: TRANSCRIPTION_FILES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Source for the separation model.
    pub fn separation(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            files: SEPARATION_FILES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Full paths of the required files under `dir`.
    pub fn paths(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        self.files.iter().map(|f| dir.join(f)).collect()
    }

    /// Whether all required files exist locally under `dir`.
    pub fn is_cached(&self, dir: impl AsRef<Path>) -> bool {
        self.paths(dir).iter().all(|p| p.exists())
    }

    /// Download any missing files into `dir`.
    ///
    /// Uses `hf-hub`'s sync API on a blocking thread; files land in
    /// the hub cache and are copied into `dir`.
    pub async fn ensure(&self, dir: impl AsRef<Path>) -> Result<(), EngineError> {
        let dir = dir.as_ref().to_path_buf();

        if self.is_cached(&dir) {
            debug!(repo = %self.repo, "model files already cached at {}", dir.display());
            return Ok(());
        }

        info!(repo = %self.repo, "downloading model files from HuggingFace...");
        std::fs::create_dir_all(&dir).map_err(EngineError::Io)?;

        let source = self.clone();
        tokio::task::spawn_blocking(move || source.download_files(&dir))
            .await
            .map_err(|e| EngineError::ModelNotAvailable(format!("task join error: {e}")))?
    }

    fn download_files(&self, dir: &Path) -> Result<(), EngineError> {
        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| EngineError::ModelNotAvailable(format!("HF API init: {e}")))?;
        let repo = api.model(self.repo.clone());

        for filename in &self.files {
            let target = dir.join(filename);
            if target.exists() {
                debug!("skipping {filename} (already exists)");
                continue;
            }

            info!("downloading {filename}...");
            match repo.get(filename) {
                Ok(cached_path) => {
                    // hf-hub caches to its own dir; copy to ours
                    if cached_path != target {
                        let _ = std::fs::copy(&cached_path, &target).map_err(|e| {
                            EngineError::ModelNotAvailable(format!(
                                "failed to copy {filename}: {e}"
                            ))
                        })?;
                    }
                    debug!("downloaded {filename}");
                }
                Err(e) => {
                    warn!("failed to download {filename}: {e}");
                    return Err(EngineError::ModelNotAvailable(format!(
                        "download failed for {filename}: {e}"
                    )));
                }
            }
        }

        info!("all model files ready at {}", dir.display());
        Ok(())
    }
}

/// Load a SentencePiece vocabulary (one token per line).
pub fn load_vocab(vocab_path: &Path) -> Result<Vec<String>, EngineError> {
    let content = std::fs::read_to_string(vocab_path)
        .map_err(|e| EngineError::ModelNotAvailable(format!("failed to read vocab.txt: {e}")))?;
    Ok(content.lines().map(String::from).collect())
}
