//! Inference engine seam.
//!
//! The session talks to the model through [`InferenceEngine`]: one call is one
//! forward pass with three named inputs and two named outputs. [`OrtEngine`] is
//! the ONNX Runtime implementation.

pub mod onnx;

pub use onnx::OrtEngine;

use crate::error::EngineError;

/// Input tensor names, in the order the graph expects them.
pub const INPUT_NAMES: [&str; 3] = ["input", "state", "sr"];

/// Output tensor names: speech probability, then the updated recurrent state.
pub const OUTPUT_NAMES: [&str; 2] = ["output", "stateN"];

/// Shape of the recurrent state tensor.
pub const STATE_SHAPE: [usize; 3] = [2, 1, 128];

/// Number of elements in the recurrent state tensor.
pub const STATE_LEN: usize = STATE_SHAPE[0] * STATE_SHAPE[1] * STATE_SHAPE[2];

/// Borrowed tensors for a single forward pass.
///
/// `input` is shaped `[1, input.len()]`, `state` is shaped [`STATE_SHAPE`] and
/// `sample_rate` is a one-element int64 tensor.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub input: &'a [f32],
    pub state: &'a [f32; STATE_LEN],
    pub sample_rate: i64,
}

impl InferenceRequest<'_> {
    pub fn input_shape(&self) -> [usize; 2] {
        [1, self.input.len()]
    }
}

/// Owned results of a single forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    /// Value of the `output` tensor
    pub probability: f32,
    /// Contents of the `stateN` tensor; checked for length by the session
    pub state: Vec<f32>,
}

/// A loaded model that can run one synchronous forward pass at a time.
///
/// `run` takes `&mut self`, so an engine is never entered concurrently unless the
/// caller wraps it in its own lock.
pub trait InferenceEngine {
    fn run(&mut self, request: &InferenceRequest<'_>) -> Result<InferenceResponse, EngineError>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn run(&mut self, request: &InferenceRequest<'_>) -> Result<InferenceResponse, EngineError> {
        (**self).run(request)
    }
}
