//! TDT greedy decoding over the decoder+joint ONNX session.
//!
//! ONNX tensor shapes use `i64` dimensions while Rust indexing needs
//! `usize`. These casts are safe because tensor dimensions are always
//! small positive values.
#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use crate::types::{EngineError, ResultExt};

/// TDT duration buckets: encoder frames to advance per decode step.
const DURATIONS: [usize; 5] = [0, 1, 2, 3, 4];

/// LSTM hidden state width of the prediction network.
const STATE_DIM: usize = 640;

/// Prediction-network state carried between decode steps.
struct DecoderState {
    prev_token: usize,
    state1: Vec<f32>,
    state2: Vec<f32>,
}

impl DecoderState {
    fn new(blank_idx: usize) -> Self {
        Self {
            prev_token: blank_idx,
            state1: vec![0.0; STATE_DIM],
            state2: vec![0.0; STATE_DIM],
        }
    }
}

/// Greedy TDT decode: walk encoder output frame-by-frame, emitting the
/// highest-logit token at each step (unless blank) and advancing by the
/// predicted duration.
pub fn greedy_decode(
    encoder_out: &Array2<f32>,
    decoder_joint: &mut Session,
    vocab: &[String],
    blank_idx: usize,
) -> Result<String, EngineError> {
    let time_steps = encoder_out.shape()[0];
    let hidden_dim = encoder_out.shape()[1];
    let vocab_size = vocab.len();

    let mut state = DecoderState::new(blank_idx);
    let mut tokens: Vec<usize> = Vec::new();

    let mut step: usize = 0;
    let max_steps = time_steps * 5; // safety limit
    let mut total_steps = 0;

    while step < time_steps {
        total_steps += 1;
        if total_steps > max_steps {
            debug!("TDT decode hit step limit at frame {step}/{time_steps}");
            break;
        }

        let frame = encoder_out.row(step).to_vec();
        let outputs = decoder_joint
            .run(ort::inputs![
                "encoder_outputs" => Tensor::from_array(([1i64, 1, hidden_dim as i64], frame))
                    .inference("encoder frame tensor")?,
                "targets" => Tensor::from_array(([1i64, 1], vec![state.prev_token as i64]))
                    .inference("target tensor")?,
                "target_length" => Tensor::from_array(([1i64], vec![1i64]))
                    .inference("target_length tensor")?,
                "input_states_1" =>
                    Tensor::from_array(([1i64, 1, STATE_DIM as i64], state.state1.clone()))
                        .inference("state1 tensor")?,
                "input_states_2" =>
                    Tensor::from_array(([1i64, 1, STATE_DIM as i64], state.state2.clone()))
                        .inference("state2 tensor")?,
            ])
            .inference("decoder_joint run")?;

        let (_, logits) = outputs["outputs"]
            .try_extract_tensor::<f32>()
            .inference("extract logits")?;
        if logits.len() < vocab_size + DURATIONS.len() {
            return Err(EngineError::Inference(format!(
                "logits too short: {} < {} + {}",
                logits.len(),
                vocab_size,
                DURATIONS.len()
            )));
        }

        let (_, s1) = outputs["output_states_1"]
            .try_extract_tensor::<f32>()
            .inference("extract state1")?;
        state.state1 = s1.to_vec();
        let (_, s2) = outputs["output_states_2"]
            .try_extract_tensor::<f32>()
            .inference("extract state2")?;
        state.state2 = s2.to_vec();

        let token = argmax(&logits[..vocab_size]);
        let duration_idx = argmax(&logits[vocab_size..vocab_size + DURATIONS.len()]);

        if token != blank_idx {
            tokens.push(token);
            state.prev_token = token;
        }

        let advance = DURATIONS[duration_idx];
        // Anti-stuck: a predicted duration of 0 still advances one frame
        step += advance.max(1);
    }

    let text = tokens_to_text(&tokens, vocab);
    debug!(
        "decoded {} tokens from {} frames into {} chars",
        tokens.len(),
        time_steps,
        text.len()
    );
    Ok(text)
}

/// Map token IDs through the vocab, turning SentencePiece `▁` markers
/// into spaces.
fn tokens_to_text(tokens: &[usize], vocab: &[String]) -> String {
    tokens
        .iter()
        .filter_map(|&t| vocab.get(t).map(String::as_str))
        .collect::<String>()
        .replace('\u{2581}', " ")
        .trim()
        .to_string()
}

/// Index of the maximum value in a slice.
fn argmax(slice: &[f32]) -> usize {
    slice
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(i, _)| i)
}
