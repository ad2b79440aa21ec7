//! Source-separation engine over ONNX Runtime.
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::traits::SpeechSeparator;
use crate::types::{EngineError, ResultExt};

/// Intra-op thread count for the separator session.
const SEPARATOR_THREADS: usize = 4;

/// Separation engine holding a single ONNX session.
///
/// The exported graph takes a mixed waveform `mix` shaped `[1, N]` and
/// emits `est_sources` shaped `[1, N, K]` with the per-source signals
/// packed along the trailing axis. `K` is fixed by the model variant
/// (2 for the sepformer exports this backend targets).
#[derive(Debug)]
pub struct SeparationEngine {
    session: Mutex<Session>,
    sample_rate: u32,
    num_sources: usize,
}

impl SeparationEngine {
    /// Load the engine from a directory containing `model.onnx`.
    ///
    /// `sample_rate` and `num_sources` describe the model variant
    /// (8 kHz or 16 kHz; K speakers) and come from configuration.
    pub fn load(model_dir: &Path, sample_rate: u32, num_sources: usize) -> Result<Self, EngineError> {
        let path = model_dir.join("model.onnx");
        info!("loading separation model from {}...", path.display());

        let session = Session::builder()
            .inference("session builder")?
            .with_intra_threads(SEPARATOR_THREADS)
            .inference("set threads")?
            .commit_from_file(&path)
            .map_err(|e| EngineError::ModelNotAvailable(format!("load {}: {e}", path.display())))?;

        info!(sample_rate, num_sources, "separation engine ready");
        Ok(Self {
            session: Mutex::new(session),
            sample_rate,
            num_sources,
        })
    }
}

impl SpeechSeparator for SeparationEngine {
    fn separate(&self, samples: &[f32]) -> Result<Vec<Vec<f32>>, EngineError> {
        let n = samples.len();
        let mut session = self.session.lock().inference("separator lock")?;

        let outputs = session
            .run(ort::inputs![
                "mix" => Tensor::from_array(([1i64, n as i64], samples.to_vec()))
                    .inference("mix tensor")?,
            ])
            .inference("separator run")?;

        let (shape, data) = outputs["est_sources"]
            .try_extract_tensor::<f32>()
            .inference("extract est_sources")?;

        // [1, N, K] with sources interleaved along the trailing axis
        let frames = shape[1] as usize;
        let sources = shape[2] as usize;
        if sources != self.num_sources {
            return Err(EngineError::Inference(format!(
                "separator emitted {sources} sources, expected {}",
                self.num_sources
            )));
        }
        if data.len() != frames * sources {
            return Err(EngineError::Inference(format!(
                "est_sources size {} does not match shape [1, {frames}, {sources}]",
                data.len()
            )));
        }

        let mut channels: Vec<Vec<f32>> =
            (0..sources).map(|_| Vec::with_capacity(frames)).collect();
        for frame in data.chunks_exact(sources) {
            for (k, &sample) in frame.iter().enumerate() {
                channels[k].push(sample);
            }
        }

        debug!(frames, sources, "separated mixed waveform");
        Ok(channels)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn num_sources(&self) -> usize {
        self.num_sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_requires_model_file() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SeparationEngine::load(tmp.path(), 16_000, 2);
        assert!(result.is_err());
    }

    #[test]
    fn missing_model_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SeparationEngine::load(tmp.path(), 16_000, 2).unwrap_err();
        assert!(err.to_string().contains("model.onnx"));
    }
}
