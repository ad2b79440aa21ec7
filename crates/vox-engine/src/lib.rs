//! # vox-engine
//!
//! ONNX Runtime engines behind the vox backend, plus the once-only
//! model registry that owns them for the life of the process.
//!
//! # Architecture
//!
//! ```text
//! 16kHz mono f32 → preprocessor.onnx → mel features [1, 128, T]
//! → encoder.onnx → encoder output [1, T', H]
//! → TDT greedy decode (decoder_joint.onnx in loop) → token IDs
//! → vocab lookup → text
//!
//! mix [1, N] → separator.onnx → sources [1, N, K] → K sample vectors
//! ```
//!
//! Engines implement the [`SpeechRecognizer`] / [`SpeechSeparator`]
//! traits so services can be tested against mock models.

pub mod asr;
pub mod decoder;
pub mod model;
pub mod registry;
pub mod separation;
pub mod traits;
pub mod types;

pub use asr::AsrEngine;
pub use model::{ModelSource, default_cache_dir};
pub use registry::{ModelRegistry, RegistryConfig};
pub use separation::SeparationEngine;
pub use traits::{SpeechRecognizer, SpeechSeparator};
pub use types::EngineError;

/// Sample rate the transcription model was trained on, in Hz.
pub const TRANSCRIPTION_SAMPLE_RATE: u32 = 16_000;
