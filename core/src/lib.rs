//! Stateful voice-activity detection on top of the Silero VAD ONNX model.
//!
//! A [`VadSession`] turns fixed-size windows of mono `f32` audio into speech
//! probabilities, carrying the model's recurrent state from one window to the
//! next.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod vad;

pub use audio::{decode_f32le, SampleRate};
pub use config::{Config, ConfigError, EngineConfig, OptimizationLevel, SessionConfig};
pub use engine::{InferenceEngine, InferenceRequest, InferenceResponse, OrtEngine};
pub use error::{EngineError, ErrorKind, VadError};
pub use vad::{RecurrentState, VadSession};
