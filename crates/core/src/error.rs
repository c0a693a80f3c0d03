//! Error types for the lectio reading-order engine.

use thiserror::Error;

/// Failure reported by a ranking signal backend.
///
/// All variants are recoverable: the orchestrator answers each of them by
/// switching the page to the spatial fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("ranking signal unavailable: {0}")]
    Unavailable(String),

    #[error("ranking signal inference failed: {0}")]
    Inference(String),

    #[error("{count} regions exceed the ranking signal capacity of {max}")]
    CapacityExceeded { count: usize, max: usize },
}

/// Primary error type for reading-order operations.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("invalid geometry on page {page}: {msg}")]
    InvalidGeometry { page: usize, msg: String },

    #[error("{count} regions exceed the maximum of {max}")]
    CapacityExceeded { count: usize, max: usize },

    #[error("ranking signal unavailable: {0}")]
    SignalUnavailable(String),

    #[error("ranking signal inference failed: {0}")]
    InferenceError(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SignalError> for OrderError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::Unavailable(msg) => Self::SignalUnavailable(msg),
            SignalError::Inference(msg) => Self::InferenceError(msg),
            SignalError::CapacityExceeded { count, max } => Self::CapacityExceeded { count, max },
        }
    }
}

/// Convenience Result type alias for OrderError.
pub type Result<T> = std::result::Result<T, OrderError>;
