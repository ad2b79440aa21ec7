//! PCM decoding and resampling.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Size of one sample on the wire (little-endian f32).
const SAMPLE_BYTES: usize = 4;

/// A single-channel sample sequence tagged with its current rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    /// Samples in the conventional `[-1.0, 1.0]` range.
    pub samples: Vec<f32>,
    /// Rate the samples are currently at, in Hz.
    pub sample_rate: u32,
}

impl Pcm {
    /// Decode a raw byte buffer at the stated source rate.
    pub fn decode(raw: &[u8], sample_rate: u32) -> Result<Self, AudioError> {
        Ok(Self {
            samples: decode_f32le(raw)?,
            sample_rate,
        })
    }

    /// Return this sequence resampled to `target_rate`.
    ///
    /// No-op (no new allocation) when the rate already matches.
    pub fn into_rate(self, target_rate: u32) -> Result<Self, AudioError> {
        if self.sample_rate == target_rate {
            return Ok(self);
        }
        let samples = resample(&self.samples, self.sample_rate, target_rate)?;
        Ok(Self {
            samples,
            sample_rate: target_rate,
        })
    }
}

/// Errors from PCM decoding or resampling.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Byte length is not a multiple of the 4-byte sample size.
    #[error("misaligned audio buffer: {0} bytes is not a whole number of f32 samples")]
    Misaligned(usize),

    /// Resampler construction or processing failure.
    #[error("resample error: {0}")]
    Resample(String),
}

/// Reinterpret a byte buffer as consecutive little-endian f32 samples.
///
/// The buffer is one channel of PCM. A misaligned length is rejected
/// rather than truncated, so a caller streaming partial floats hears
/// about it instead of silently losing the tail. An empty buffer
/// decodes to an empty sample vector.
pub fn decode_f32le(raw: &[u8]) -> Result<Vec<f32>, AudioError> {
    if raw.len() % SAMPLE_BYTES != 0 {
        return Err(AudioError::Misaligned(raw.len()));
    }
    Ok(raw
        .chunks_exact(SAMPLE_BYTES)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Resample mono audio from `from_rate` to `to_rate` using rubato.
///
/// Identity when the rates already match. Otherwise band-limited sinc
/// resampling, processed in fixed-size chunks with the final chunk
/// zero-padded.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| AudioError::Resample(format!("init: {e}")))?;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize + 1024);

    for chunk in samples.chunks(chunk_size) {
        let input = if chunk.len() < chunk_size {
            // Pad last chunk with zeros
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            vec![padded]
        } else {
            vec![chunk.to_vec()]
        };

        let resampled = resampler
            .process(&input, None)
            .map_err(|e| AudioError::Resample(format!("process: {e}")))?;

        if let Some(channel) = resampled.first() {
            output.extend_from_slice(channel);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_bytes(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn decode_empty_is_empty() {
        assert_eq!(decode_f32le(b"").unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn decode_roundtrips_samples() {
        let samples = [0.0f32, 0.5, -0.5, 1.0, -1.0];
        let decoded = decode_f32le(&to_bytes(&samples)).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn decode_rejects_misaligned() {
        for len in [1, 2, 3, 5, 7] {
            let raw = vec![0u8; len];
            let err = decode_f32le(&raw).unwrap_err();
            assert!(matches!(err, AudioError::Misaligned(n) if n == len), "len {len}");
        }
    }

    #[test]
    fn misaligned_error_names_length() {
        let err = decode_f32le(&[0u8; 6]).unwrap_err();
        assert!(err.to_string().contains("6 bytes"));
    }

    #[test]
    fn pcm_decode_tags_rate() {
        let pcm = Pcm::decode(&to_bytes(&[0.25, -0.25]), 44_100).unwrap();
        assert_eq!(pcm.sample_rate, 44_100);
        assert_eq!(pcm.samples.len(), 2);
    }

    #[test]
    fn into_rate_same_rate_is_identity() {
        let pcm = Pcm {
            samples: vec![0.1, 0.2, 0.3],
            sample_rate: 16_000,
        };
        let out = pcm.clone().into_rate(16_000).unwrap();
        assert_eq!(out, pcm);
    }

    #[test]
    fn resample_identity_rate_returns_input() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let result = resample(&samples, 16_000, 16_000).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn resample_downsample_ratio() {
        // 48kHz → 16kHz should produce ~1/3 the samples
        let samples: Vec<f32> = (0..48_000).map(|i| (i as f32 / 48_000.0).sin()).collect();
        let result = resample(&samples, 48_000, 16_000).unwrap();
        let ratio = result.len() as f64 / samples.len() as f64;
        assert!((ratio - 1.0 / 3.0).abs() < 0.05, "ratio: {ratio}");
    }

    #[test]
    fn resample_upsample_ratio() {
        // 8kHz → 16kHz should roughly double the sample count
        let samples: Vec<f32> = (0..8_000).map(|i| (i as f32 / 8_000.0).sin()).collect();
        let result = resample(&samples, 8_000, 16_000).unwrap();
        let ratio = result.len() as f64 / samples.len() as f64;
        assert!((ratio - 2.0).abs() < 0.2, "ratio: {ratio}");
    }

    #[test]
    fn into_rate_retags_sequence() {
        let samples: Vec<f32> = (0..44_100).map(|i| (i as f32 / 44_100.0).sin()).collect();
        let pcm = Pcm {
            samples,
            sample_rate: 44_100,
        };
        let out = pcm.into_rate(16_000).unwrap();
        assert_eq!(out.sample_rate, 16_000);
        assert!(!out.samples.is_empty());
    }
}
