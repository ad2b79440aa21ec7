//! # vox-audio
//!
//! Audio marshaling for the vox backend: raw little-endian f32 PCM
//! decoding, band-limited resampling, and the RMS silence gate.
//!
//! Everything here runs on plain `&[f32]` slices; a [`Pcm`] carries a
//! sample vector tagged with its current rate. Models consume audio at
//! a fixed trained rate, so [`resample`] is the single place rate
//! mismatches are corrected.

pub mod codec;
pub mod silence;

pub use codec::{AudioError, Pcm, decode_f32le, resample};
pub use silence::{SILENCE_RMS_THRESHOLD, is_silence, rms};
