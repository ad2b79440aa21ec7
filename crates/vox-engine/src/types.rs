//! Engine error types.

/// Errors from model loading or inference.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Model files not found or failed to download.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// ONNX Runtime session creation or inference failure.
    #[error("inference error: {0}")]
    Inference(String),

    /// I/O error (file read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Attach inference context to arbitrary error types.
pub trait ResultExt<T> {
    /// Wrap the error as [`EngineError::Inference`] with a context label.
    fn inference(self, context: &str) -> Result<T, EngineError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn inference(self, context: &str) -> Result<T, EngineError> {
        self.map_err(|e| EngineError::Inference(format!("{context}: {e}")))
    }
}
