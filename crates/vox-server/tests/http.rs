//! End-to-end HTTP tests against the router with injected mock engines.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use vox_engine::{EngineError, ModelRegistry, SpeechRecognizer, SpeechSeparator};
use vox_pipeline::InferencePool;
use vox_server::{ServerConfig, VoxServer};

struct FixedRecognizer(&'static str);

impl SpeechRecognizer for FixedRecognizer {
    fn transcribe(&self, _samples: &[f32]) -> Result<String, EngineError> {
        Ok(self.0.to_string())
    }
    fn sample_rate(&self) -> u32 {
        16_000
    }
}

struct FailingRecognizer;

impl SpeechRecognizer for FailingRecognizer {
    fn transcribe(&self, _samples: &[f32]) -> Result<String, EngineError> {
        Err(EngineError::Inference("boom".into()))
    }
    fn sample_rate(&self) -> u32 {
        16_000
    }
}

struct TwoWaySeparator;

impl SpeechSeparator for TwoWaySeparator {
    fn separate(&self, samples: &[f32]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(vec![samples.to_vec(), vec![0.0; samples.len()]])
    }
    fn sample_rate(&self) -> u32 {
        16_000
    }
    fn num_sources(&self) -> usize {
        2
    }
}

struct FailingSeparator;

impl SpeechSeparator for FailingSeparator {
    fn separate(&self, _samples: &[f32]) -> Result<Vec<Vec<f32>>, EngineError> {
        Err(EngineError::Inference("sep boom".into()))
    }
    fn sample_rate(&self) -> u32 {
        16_000
    }
    fn num_sources(&self) -> usize {
        2
    }
}

fn router_with(
    recognizer: Arc<dyn SpeechRecognizer>,
    separator: Arc<dyn SpeechSeparator>,
) -> axum::Router {
    let registry = Arc::new(ModelRegistry::with_models(recognizer, separator));
    VoxServer::new(
        ServerConfig::default(),
        registry,
        InferencePool::new(2),
        None,
    )
    .router()
}

fn speech_body() -> Vec<u8> {
    [0.0f32, 0.5, -0.5, 1.0, -1.0]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

fn silence_body() -> Vec<u8> {
    vec![0u8; 16_000 * 4]
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn transcription_happy_path() {
    let app = router_with(Arc::new(FixedRecognizer("hello world")), Arc::new(TwoWaySeparator));

    let resp = app.oneshot(post("/transcription/", speech_body())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["transcription"], "hello world");
    assert!(json["timestamp"].is_number());
    assert!(json["error"].is_null());
}

#[tokio::test]
async fn transcription_empty_body_is_400() {
    let app = router_with(Arc::new(FixedRecognizer("x")), Arc::new(TwoWaySeparator));

    let resp = app.oneshot(post("/transcription/", Vec::new())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = json_body(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["transcription"], "");
    assert!(json["timestamp"].is_null());
    assert_eq!(json["error"], "Empty audio data received");
}

#[tokio::test]
async fn transcription_silence_returns_sentinel() {
    let app = router_with(Arc::new(FixedRecognizer("never")), Arc::new(TwoWaySeparator));

    let resp = app.oneshot(post("/transcription/", silence_body())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["transcription"], "[BLANK_AUDIO]");
}

#[tokio::test]
async fn transcription_model_failure_stays_http_200() {
    let app = router_with(Arc::new(FailingRecognizer), Arc::new(TwoWaySeparator));

    let resp = app.oneshot(post("/transcription/", speech_body())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["transcription"], "[ERROR] Transcription failed: boom");
    assert!(json["error"].is_null());
}

#[tokio::test]
async fn transcription_bad_sample_rate_is_400() {
    let app = router_with(Arc::new(FixedRecognizer("x")), Arc::new(TwoWaySeparator));

    let req = Request::builder()
        .method("POST")
        .uri("/transcription/")
        .header("X-Sample-Rate", "not-a-rate")
        .body(Body::from(speech_body()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = json_body(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Invalid X-Sample-Rate header");
}

#[tokio::test]
async fn transcription_custom_sample_rate_accepted() {
    let app = router_with(Arc::new(FixedRecognizer("resampled")), Arc::new(TwoWaySeparator));

    // 8 kHz source, loud enough to pass the gate after resampling
    let body: Vec<u8> = vec![0.5f32; 8_000]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let req = Request::builder()
        .method("POST")
        .uri("/transcription/")
        .header("X-Sample-Rate", "8000")
        .body(Body::from(body))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["transcription"], "resampled");
}

#[tokio::test]
async fn separation_happy_path() {
    let app = router_with(Arc::new(FixedRecognizer("speech")), Arc::new(TwoWaySeparator));

    // Loud source so the first separated channel passes the gate;
    // the mock's second channel is pure silence.
    let body: Vec<u8> = vec![0.5f32; 1_600]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let resp = app
        .oneshot(post("/transcription/separation", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp).await;
    assert_eq!(json["success"], true);
    assert!(json["timestamp"].is_number());
    let speakers = json["speakers"].as_array().unwrap();
    assert_eq!(speakers.len(), 2);
    assert_eq!(speakers[0]["speaker_id"], "1");
    assert_eq!(speakers[0]["text"], "speech");
    assert_eq!(speakers[1]["speaker_id"], "2");
    assert_eq!(speakers[1]["text"], "[BLANK_AUDIO]");
}

#[tokio::test]
async fn separation_empty_body_is_400() {
    let app = router_with(Arc::new(FixedRecognizer("x")), Arc::new(TwoWaySeparator));

    let resp = app
        .oneshot(post("/transcription/separation", Vec::new()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = json_body(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["speakers"].as_array().unwrap().len(), 0);
    assert_eq!(json["error"], "Empty audio data received");
}

#[tokio::test]
async fn separation_failure_is_in_band_http_200() {
    let app = router_with(Arc::new(FixedRecognizer("x")), Arc::new(FailingSeparator));

    let resp = app
        .oneshot(post("/transcription/separation", speech_body()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["speakers"].as_array().unwrap().len(), 0);
    assert_eq!(json["error"], "[ERROR] Separation failed: sep boom");
    assert!(json["timestamp"].is_null());
}

#[tokio::test]
async fn separation_unsupported_speaker_count_is_400() {
    let app = router_with(Arc::new(FixedRecognizer("x")), Arc::new(TwoWaySeparator));

    let req = Request::builder()
        .method("POST")
        .uri("/transcription/separation")
        .header("X-Num-Speakers", "5")
        .body(Body::from(speech_body()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = json_body(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(
        json["error"],
        "Unsupported speaker count: requested 5, model produces 2"
    );
}

#[tokio::test]
async fn separation_matching_speaker_count_accepted() {
    let app = router_with(Arc::new(FixedRecognizer("ok")), Arc::new(TwoWaySeparator));

    let body: Vec<u8> = vec![0.5f32; 1_600]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let req = Request::builder()
        .method("POST")
        .uri("/transcription/separation")
        .header("X-Num-Speakers", "2")
        .body(Body::from(body))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["success"], true);
}
