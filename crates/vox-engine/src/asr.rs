//! Encoder-decoder ASR engine over ONNX Runtime.
#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array2, Array3};
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::decoder;
use crate::model;
use crate::traits::SpeechRecognizer;
use crate::types::{EngineError, ResultExt};
use crate::TRANSCRIPTION_SAMPLE_RATE;

/// Intra-op thread count for preprocessor and encoder sessions.
const PARALLEL_THREADS: usize = 4;
/// The decoder loop is sequential; one thread is enough.
const DECODER_THREADS: usize = 1;

/// Transcription engine holding three ONNX sessions (mel preprocessor,
/// encoder, decoder+joint) and the SentencePiece vocabulary.
///
/// Sessions sit behind `Mutex` since `Session::run` takes `&mut self`.
/// Construction is expensive (hundreds of MB of weights) and happens
/// at most once per process via the model registry.
#[derive(Debug)]
pub struct AsrEngine {
    preprocessor: Mutex<Session>,
    encoder: Mutex<Session>,
    decoder_joint: Mutex<Session>,
    vocab: Vec<String>,
    blank_idx: usize,
}

impl AsrEngine {
    /// Load the engine from a directory containing the model files.
    ///
    /// CPU-intensive; callers run this on a blocking thread.
    pub fn load(model_dir: &Path) -> Result<Self, EngineError> {
        info!("loading transcription model from {}...", model_dir.display());

        let preprocessor = build_session(&model_dir.join("nemo128.onnx"), PARALLEL_THREADS)?;
        debug!("loaded preprocessor");
        let encoder = build_session(&model_dir.join("encoder-model.onnx"), PARALLEL_THREADS)?;
        debug!("loaded encoder");
        let decoder_joint =
            build_session(&model_dir.join("decoder_joint-model.onnx"), DECODER_THREADS)?;
        debug!("loaded decoder_joint");

        let vocab = model::load_vocab(&model_dir.join("vocab.txt"))?;
        let blank_idx = vocab.len(); // blank token sits at index == vocab_size

        info!(
            vocab_size = vocab.len(),
            blank_idx, "transcription engine ready"
        );

        Ok(Self {
            preprocessor: Mutex::new(preprocessor),
            encoder: Mutex::new(encoder),
            decoder_joint: Mutex::new(decoder_joint),
            vocab,
            blank_idx,
        })
    }

    /// Mel features from raw waveform samples: `[1, N]` in, `[1, 128, T]` out.
    ///
    /// The waveform length input tells the model how much of the batch
    /// is real audio; every call here is a single unpadded utterance,
    /// so the full length is passed.
    fn run_preprocessor(&self, samples: &[f32]) -> Result<(Array3<f32>, i64), EngineError> {
        let n = samples.len();
        let mut session = self.preprocessor.lock().inference("preprocessor lock")?;

        let outputs = session
            .run(ort::inputs![
                "waveforms" => Tensor::from_array(([1i64, n as i64], samples.to_vec()))
                    .inference("waveform tensor")?,
                "waveforms_lens" => Tensor::from_array(([1i64], vec![n as i64]))
                    .inference("waveform_lens tensor")?,
            ])
            .inference("preprocessor run")?;

        let (shape, data) = outputs["features"]
            .try_extract_tensor::<f32>()
            .inference("extract features")?;
        let (_, lens) = outputs["features_lens"]
            .try_extract_tensor::<i64>()
            .inference("extract features_lens")?;

        let features = Array3::from_shape_vec(
            (shape[0] as usize, shape[1] as usize, shape[2] as usize),
            data.to_vec(),
        )
        .inference("reshape features")?;

        Ok((features, lens[0]))
    }

    /// Encoder output from mel features, squeezed to `[T', H]`.
    fn run_encoder(
        &self,
        features: &Array3<f32>,
        features_len: i64,
    ) -> Result<Array2<f32>, EngineError> {
        let shape = features.shape();
        let flat: Vec<f32> = features.iter().copied().collect();
        let mut session = self.encoder.lock().inference("encoder lock")?;

        let outputs = session
            .run(ort::inputs![
                "audio_signal" => Tensor::from_array(
                    ([shape[0] as i64, shape[1] as i64, shape[2] as i64], flat)
                )
                .inference("audio_signal tensor")?,
                "length" => Tensor::from_array(([1i64], vec![features_len]))
                    .inference("length tensor")?,
            ])
            .inference("encoder run")?;

        let (enc_shape, enc_data) = outputs["outputs"]
            .try_extract_tensor::<f32>()
            .inference("extract encoder output")?;

        // Squeeze batch dim: [1, T', H] → [T', H]
        Array2::from_shape_vec(
            (enc_shape[1] as usize, enc_shape[2] as usize),
            enc_data.to_vec(),
        )
        .inference("reshape encoder output")
    }
}

fn build_session(path: &Path, threads: usize) -> Result<Session, EngineError> {
    Session::builder()
        .inference("session builder")?
        .with_intra_threads(threads)
        .inference("set threads")?
        .commit_from_file(path)
        .map_err(|e| EngineError::ModelNotAvailable(format!("load {}: {e}", path.display())))
}

impl SpeechRecognizer for AsrEngine {
    fn transcribe(&self, samples: &[f32]) -> Result<String, EngineError> {
        let (features, features_len) = self.run_preprocessor(samples)?;
        debug!("mel features: {:?}, len={features_len}", features.shape());

        let encoder_out = self.run_encoder(&features, features_len)?;
        debug!("encoder output: {:?}", encoder_out.shape());

        let mut decoder_joint = self.decoder_joint.lock().inference("decoder lock")?;
        decoder::greedy_decode(&encoder_out, &mut decoder_joint, &self.vocab, self.blank_idx)
    }

    fn sample_rate(&self) -> u32 {
        TRANSCRIPTION_SAMPLE_RATE
    }
}
