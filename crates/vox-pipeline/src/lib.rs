//! # vox-pipeline
//!
//! Request-level services over the model registry: single-speaker
//! transcription, speaker separation, and the separate-then-transcribe
//! orchestrator.
//!
//! Failures never escape a service as errors the HTTP layer has to
//! interpret: transcription results are plain strings carrying either
//! text, the `[BLANK_AUDIO]` sentinel, or an `[ERROR]`-prefixed
//! category + message. All model calls go through a bounded
//! [`InferencePool`] so heavy inference cannot starve the async
//! runtime or pile up without limit.

pub mod pool;
pub mod service;
pub mod types;

pub use pool::InferencePool;
pub use service::{SeparatedSpeech, SpeakerPipeline, SpeakerTranscript, TranscriptionService};
pub use types::{BLANK_AUDIO, PipelineError};
