//! Transcription endpoint handlers and response envelopes.
//!
//! Both POST endpoints take raw little-endian f32 PCM bytes as the
//! request body, with the source sample rate in an `X-Sample-Rate`
//! header (default 16 000 Hz). HTTP 400 is reserved for request-shape
//! problems (empty body, malformed headers, unsupported speaker
//! count); codec and inference failures travel in-band as
//! `[ERROR]`-prefixed text so existing callers keep working.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use chrono::Utc;
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tracing::{info, warn};

use vox_engine::TRANSCRIPTION_SAMPLE_RATE;
use vox_pipeline::{BLANK_AUDIO, PipelineError};

use crate::metrics::{
    HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL, INFERENCE_IN_FLIGHT, SILENCE_SKIPS_TOTAL,
};
use crate::server::AppState;

/// Envelope for `POST /transcription/`.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResponse {
    /// `false` only for request-shape failures.
    pub success: bool,
    /// Transcribed text, `[BLANK_AUDIO]`, or `[ERROR]`-prefixed text.
    pub transcription: String,
    /// Unix seconds at completion; `null` on failure envelopes.
    pub timestamp: Option<i64>,
    /// Request-shape error message; `null` otherwise.
    pub error: Option<String>,
}

/// One speaker's entry on the separation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SpeakerEntry {
    /// 1-based position in the separation model's output order.
    pub speaker_id: String,
    /// Transcribed text for that source.
    pub text: String,
}

/// Envelope for `POST /transcription/separation`.
#[derive(Debug, Clone, Serialize)]
pub struct SeparatedTranscriptionResponse {
    /// `false` for request-shape failures and separation-stage errors.
    pub success: bool,
    /// One entry per separated source, in model output order.
    pub speakers: Vec<SpeakerEntry>,
    /// Unix seconds at completion; `null` on failure envelopes.
    pub timestamp: Option<i64>,
    /// Error message; `null` on success.
    pub error: Option<String>,
}

impl TranscriptionResponse {
    fn ok(transcription: String) -> Self {
        Self {
            success: true,
            transcription,
            timestamp: Some(Utc::now().timestamp()),
            error: None,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transcription: String::new(),
            timestamp: None,
            error: Some(error.into()),
        }
    }
}

impl SeparatedTranscriptionResponse {
    fn ok(speakers: Vec<SpeakerEntry>) -> Self {
        Self {
            success: true,
            speakers,
            timestamp: Some(Utc::now().timestamp()),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            speakers: Vec::new(),
            timestamp: None,
            error: Some(error.into()),
        }
    }
}

/// Parse a positive integer header, defaulting when absent.
///
/// `Err` carries the ready-to-send message for the 400 envelope.
fn header_u32(headers: &HeaderMap, name: &str, default: u32) -> Result<u32, String> {
    let Some(value) = headers.get(name) else {
        return Ok(default);
    };
    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| format!("Invalid {name} header"))
}

/// Optional positive integer header.
fn header_opt_usize(headers: &HeaderMap, name: &str) -> Result<Option<usize>, String> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .map(Some)
        .ok_or_else(|| format!("Invalid {name} header"))
}

/// POST /transcription/
pub async fn transcribe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<TranscriptionResponse>) {
    counter!(HTTP_REQUESTS_TOTAL, "endpoint" => "transcription").increment(1);
    let started = Instant::now();

    if body.is_empty() {
        warn!("rejecting empty transcription request");
        return (
            StatusCode::BAD_REQUEST,
            Json(TranscriptionResponse::rejected("Empty audio data received")),
        );
    }

    let sample_rate = match header_u32(&headers, "X-Sample-Rate", TRANSCRIPTION_SAMPLE_RATE) {
        Ok(rate) => rate,
        Err(msg) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TranscriptionResponse::rejected(msg)),
            );
        }
    };

    gauge!(INFERENCE_IN_FLIGHT).increment(1.0);
    let text = state.transcription.transcribe(&body, sample_rate).await;
    gauge!(INFERENCE_IN_FLIGHT).decrement(1.0);
    if text == BLANK_AUDIO {
        counter!(SILENCE_SKIPS_TOTAL).increment(1);
    }
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "endpoint" => "transcription")
        .record(started.elapsed().as_secs_f64());
    info!(
        bytes = body.len(),
        sample_rate,
        chars = text.len(),
        "transcription request complete"
    );

    (StatusCode::OK, Json(TranscriptionResponse::ok(text)))
}

/// POST /transcription/separation
pub async fn separation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<SeparatedTranscriptionResponse>) {
    counter!(HTTP_REQUESTS_TOTAL, "endpoint" => "separation").increment(1);
    let started = Instant::now();

    if body.is_empty() {
        warn!("rejecting empty separation request");
        return (
            StatusCode::BAD_REQUEST,
            Json(SeparatedTranscriptionResponse::failed(
                "Empty audio data received",
            )),
        );
    }

    let sample_rate = match header_u32(&headers, "X-Sample-Rate", TRANSCRIPTION_SAMPLE_RATE) {
        Ok(rate) => rate,
        Err(msg) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SeparatedTranscriptionResponse::failed(msg)),
            );
        }
    };
    let num_speakers = match header_opt_usize(&headers, "X-Num-Speakers") {
        Ok(n) => n,
        Err(msg) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SeparatedTranscriptionResponse::failed(msg)),
            );
        }
    };

    gauge!(INFERENCE_IN_FLIGHT).increment(1.0);
    let result = state.pipeline.run(&body, sample_rate, num_speakers).await;
    gauge!(INFERENCE_IN_FLIGHT).decrement(1.0);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "endpoint" => "separation")
        .record(started.elapsed().as_secs_f64());

    match result {
        Ok(transcripts) => {
            info!(
                bytes = body.len(),
                sample_rate,
                speakers = transcripts.len(),
                "separation request complete"
            );
            let speakers = transcripts
                .into_iter()
                .map(|t| SpeakerEntry {
                    speaker_id: t.speaker_id,
                    text: t.text,
                })
                .collect();
            (
                StatusCode::OK,
                Json(SeparatedTranscriptionResponse::ok(speakers)),
            )
        }
        Err(PipelineError::UnsupportedSpeakerCount {
            requested,
            supported,
        }) => (
            StatusCode::BAD_REQUEST,
            Json(SeparatedTranscriptionResponse::failed(format!(
                "Unsupported speaker count: requested {requested}, model produces {supported}"
            ))),
        ),
        Err(e) => {
            warn!(error = %e, "separation request failed");
            (
                StatusCode::OK,
                Json(SeparatedTranscriptionResponse::failed(
                    e.into_separation_text(),
                )),
            )
        }
    }
}
