//! Pipeline error taxonomy and in-band result formatting.

use vox_audio::AudioError;
use vox_engine::EngineError;

/// Sentinel returned instead of invoking a model on silent input.
pub const BLANK_AUDIO: &str = "[BLANK_AUDIO]";

/// Errors inside the transcription/separation pipeline.
///
/// These never propagate past the service layer as-is: the
/// single-speaker path formats them into `[ERROR]`-prefixed strings
/// via [`PipelineError::into_transcription_text`], and the separation
/// path via [`PipelineError::into_separation_text`]. The one exception
/// is [`PipelineError::UnsupportedSpeakerCount`], which the HTTP layer
/// fails fast on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Decode or resample failure.
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Model load or inference failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The blocking-task pool failed to run the model call.
    #[error("inference task failed: {0}")]
    Pool(String),

    /// A caller-requested speaker count the loaded model cannot honor.
    #[error("unsupported speaker count: requested {requested}, model produces {supported}")]
    UnsupportedSpeakerCount {
        /// Speaker count the caller asked for.
        requested: usize,
        /// Source count fixed by the loaded model.
        supported: usize,
    },
}

impl PipelineError {
    /// Whether the failure happened in audio marshaling rather than in
    /// a model call.
    fn is_audio(&self) -> bool {
        matches!(self, Self::Audio(_))
    }

    /// The underlying failure message, without the enum's own category
    /// wrapping — the `[ERROR]` prefix carries the category instead.
    fn message(&self) -> String {
        match self {
            Self::Audio(e) => e.to_string(),
            Self::Engine(EngineError::Inference(m) | EngineError::ModelNotAvailable(m)) => {
                m.clone()
            }
            Self::Engine(EngineError::Io(e)) => e.to_string(),
            Self::Pool(m) => m.clone(),
            Self::UnsupportedSpeakerCount { .. } => self.to_string(),
        }
    }

    /// In-band text for the single-speaker transcription path.
    pub fn into_transcription_text(self) -> String {
        if self.is_audio() {
            format!("[ERROR] Audio processing failed: {}", self.message())
        } else {
            format!("[ERROR] Transcription failed: {}", self.message())
        }
    }

    /// In-band text for the separation path.
    pub fn into_separation_text(self) -> String {
        if self.is_audio() {
            format!("[ERROR] Speech Separation processing failed: {}", self.message())
        } else {
            format!("[ERROR] Separation failed: {}", self.message())
        }
    }
}
