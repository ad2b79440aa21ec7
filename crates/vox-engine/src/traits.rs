//! Model traits — the seam between pipeline services and loaded models.
//!
//! Both traits are synchronous and CPU-heavy; callers are expected to
//! run them on a blocking thread (see `vox-pipeline::InferencePool`).
//! Implementations must be read-only after construction so a single
//! instance can serve all concurrent requests.

use crate::types::EngineError;

/// A loaded speech-to-text model.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe a mono sample sequence already at [`Self::sample_rate`].
    ///
    /// The sequence is a single unpadded utterance; the whole of it is
    /// real audio.
    fn transcribe(&self, samples: &[f32]) -> Result<String, EngineError>;

    /// Sample rate the model was trained on, in Hz.
    fn sample_rate(&self) -> u32;
}

/// A loaded source-separation model.
pub trait SpeechSeparator: Send + Sync {
    /// Split a mixed-speaker sequence (at [`Self::sample_rate`]) into
    /// one independent sequence per source, in model emission order.
    ///
    /// Always returns exactly [`Self::num_sources`] sequences.
    fn separate(&self, samples: &[f32]) -> Result<Vec<Vec<f32>>, EngineError>;

    /// Sample rate the model was trained on, in Hz.
    fn sample_rate(&self) -> u32;

    /// Number of sources the model emits — fixed by the loaded model,
    /// not configurable per call.
    fn num_sources(&self) -> usize;
}
