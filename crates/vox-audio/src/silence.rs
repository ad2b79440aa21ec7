//! RMS silence gate.
//!
//! Near-silent input makes ASR models hallucinate text, and inference
//! is expensive. Callers check the gate before invoking a model and
//! substitute a sentinel instead.

/// RMS amplitude below which audio is classified as silence.
///
/// A fixed design parameter, not derived from input statistics.
pub const SILENCE_RMS_THRESHOLD: f32 = 0.01;

/// Root-mean-square amplitude of a sample sequence.
///
/// An empty sequence has RMS 0.0.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean_sq = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    mean_sq.sqrt()
}

/// Whether a sample sequence is too quiet to be worth transcribing.
pub fn is_silence(samples: &[f32]) -> bool {
    let loudness = rms(samples);
    if loudness < SILENCE_RMS_THRESHOLD {
        tracing::debug!(rms = loudness, "no voice detected");
        return true;
    }
    false
}
