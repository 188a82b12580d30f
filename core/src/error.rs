use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by an inference engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("failed to load model from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    #[error("model is missing required {kind} tensor `{name}`")]
    IncompatibleModel { kind: &'static str, name: &'static str },

    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("no `{0}` tensor in inference results")]
    MissingOutput(&'static str),

    #[error("output tensor `{name}` has {actual} elements, expected {expected}")]
    OutputShape {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0}")]
    Backend(String),
}

/// Error taxonomy of a VAD session.
#[derive(Error, Debug)]
pub enum VadError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("model load failed: {0}")]
    ModelLoadFailure(#[source] EngineError),

    #[error("invalid input size: expected {expected} samples, got {actual}")]
    InvalidInputSize { expected: usize, actual: usize },

    #[error("inference failed: {0}")]
    InferenceFailure(#[source] EngineError),
}

/// Fieldless discriminant of [`VadError`], used to map errors onto result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfiguration,
    ModelLoadFailure,
    InvalidInputSize,
    InferenceFailure,
}

impl VadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::ModelLoadFailure(_) => ErrorKind::ModelLoadFailure,
            Self::InvalidInputSize { .. } => ErrorKind::InvalidInputSize,
            Self::InferenceFailure(_) => ErrorKind::InferenceFailure,
        }
    }

    /// Whether the same session can keep being used after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidInputSize { .. } | Self::InferenceFailure(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VadError>;
