//! Transcription and separation services.
//!
//! Both services share one [`ModelRegistry`] (the model singletons)
//! and one [`InferencePool`]. Per request: decode and gate on the
//! async task, then resample + model call together on a pooled
//! blocking thread.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use vox_audio::{Pcm, is_silence};
use vox_engine::{ModelRegistry, SpeechRecognizer};

use crate::pool::InferencePool;
use crate::types::{BLANK_AUDIO, PipelineError};

/// K per-source sample sequences plus the rate they were produced at.
#[derive(Debug, Clone)]
pub struct SeparatedSpeech {
    /// One sequence per source, in model emission order.
    pub sources: Vec<Vec<f32>>,
    /// Sample rate of every source sequence, in Hz.
    pub sample_rate: u32,
}

/// One speaker's transcription in the separated pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTranscript {
    /// 1-based position in the separation model's emission order.
    ///
    /// Not an identity across calls — the model does no cross-utterance
    /// speaker tracking.
    pub speaker_id: String,
    /// Transcribed text, `[BLANK_AUDIO]`, or an `[ERROR]`-prefixed
    /// failure message local to this speaker.
    pub text: String,
}

/// Single-speaker transcription: decode → silence gate → resample →
/// recognizer.
#[derive(Clone)]
pub struct TranscriptionService {
    registry: Arc<ModelRegistry>,
    pool: InferencePool,
}

impl TranscriptionService {
    /// Service over a shared registry and inference pool.
    pub fn new(registry: Arc<ModelRegistry>, pool: InferencePool) -> Self {
        Self { registry, pool }
    }

    /// Transcribe raw f32 LE PCM bytes at the stated source rate.
    ///
    /// Never fails: every failure path returns an `[ERROR]`-prefixed
    /// string, silence returns the `[BLANK_AUDIO]` sentinel without a
    /// model call.
    #[instrument(skip(self, raw), fields(bytes = raw.len(), source_rate))]
    pub async fn transcribe(&self, raw: &[u8], source_rate: u32) -> String {
        match self.transcribe_inner(raw, source_rate).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "transcription failed");
                e.into_transcription_text()
            }
        }
    }

    async fn transcribe_inner(
        &self,
        raw: &[u8],
        source_rate: u32,
    ) -> Result<String, PipelineError> {
        let pcm = Pcm::decode(raw, source_rate)?;
        if is_silence(&pcm.samples) {
            debug!("silence gate tripped, skipping inference");
            return Ok(BLANK_AUDIO.to_string());
        }

        let recognizer = self.registry.recognizer().await?;
        run_recognizer(&self.pool, recognizer, pcm).await
    }

    pub(crate) fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub(crate) fn pool(&self) -> &InferencePool {
        &self.pool
    }
}

/// Resample to the recognizer's trained rate and transcribe, on a
/// pooled blocking thread.
async fn run_recognizer(
    pool: &InferencePool,
    recognizer: Arc<dyn SpeechRecognizer>,
    pcm: Pcm,
) -> Result<String, PipelineError> {
    let target_rate = recognizer.sample_rate();
    pool.run(move || {
        let pcm = pcm.into_rate(target_rate)?;
        recognizer.transcribe(&pcm.samples).map_err(Into::into)
    })
    .await
}

/// Speaker separation plus per-speaker transcription.
#[derive(Clone)]
pub struct SpeakerPipeline {
    transcription: TranscriptionService,
}

impl SpeakerPipeline {
    /// Pipeline sharing the transcription service's registry and pool.
    pub fn new(transcription: TranscriptionService) -> Self {
        Self { transcription }
    }

    /// Split raw mixed-speaker PCM into per-source sequences.
    ///
    /// Decode → resample to the separator's rate → separator call.
    /// Returns the packed sources and the rate they were produced at.
    #[instrument(skip(self, raw), fields(bytes = raw.len(), source_rate))]
    pub async fn separate(
        &self,
        raw: &[u8],
        source_rate: u32,
    ) -> Result<SeparatedSpeech, PipelineError> {
        let pcm = Pcm::decode(raw, source_rate)?;
        let separator = self.transcription.registry().separator().await?;
        let model_rate = separator.sample_rate();

        let sources = self
            .transcription
            .pool()
            .run(move || {
                let pcm = pcm.into_rate(model_rate)?;
                separator.separate(&pcm.samples).map_err(Into::into)
            })
            .await?;

        debug!(sources = sources.len(), model_rate, "separation complete");
        Ok(SeparatedSpeech {
            sources,
            sample_rate: model_rate,
        })
    }

    /// Separate, then transcribe each source in emission order.
    ///
    /// Entries carry 1-based `speaker_id`s `"1"`, `"2"`, ... with no
    /// gaps. A single speaker's failure produces that entry's own
    /// `[ERROR]` text and never aborts the batch; silent sources get
    /// the `[BLANK_AUDIO]` sentinel without a model call.
    ///
    /// `expected_speakers` fails fast when it cannot be honored — the
    /// source count is fixed by the loaded model.
    #[instrument(skip(self, raw), fields(bytes = raw.len(), source_rate))]
    pub async fn run(
        &self,
        raw: &[u8],
        source_rate: u32,
        expected_speakers: Option<usize>,
    ) -> Result<Vec<SpeakerTranscript>, PipelineError> {
        if let Some(requested) = expected_speakers {
            let supported = self
                .transcription
                .registry()
                .separator()
                .await?
                .num_sources();
            if requested != supported {
                return Err(PipelineError::UnsupportedSpeakerCount {
                    requested,
                    supported,
                });
            }
        }

        let separated = self.separate(raw, source_rate).await?;

        let mut transcripts = Vec::with_capacity(separated.sources.len());
        for (i, source) in separated.sources.into_iter().enumerate() {
            let text = self.transcribe_source(source, separated.sample_rate).await;
            transcripts.push(SpeakerTranscript {
                speaker_id: (i + 1).to_string(),
                text,
            });
        }
        Ok(transcripts)
    }

    /// Gate + transcribe one already-separated source. Failures are
    /// formatted in-band so they stay local to this speaker.
    async fn transcribe_source(&self, samples: Vec<f32>, sample_rate: u32) -> String {
        if is_silence(&samples) {
            debug!("silent source, skipping inference");
            return BLANK_AUDIO.to_string();
        }

        let pcm = Pcm {
            samples,
            sample_rate,
        };
        let result = match self.transcription.registry().recognizer().await {
            Ok(recognizer) => run_recognizer(self.transcription.pool(), recognizer, pcm).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "per-speaker transcription failed");
                e.into_transcription_text()
            }
        }
    }
}
