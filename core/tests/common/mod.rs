// Common test helpers for vadlite-core integration tests
//
// This module provides:
// - Scripted inference engines that stand in for the ONNX model
// - Synthetic audio windows

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vadlite_core::engine::STATE_LEN;
use vadlite_core::{EngineError, InferenceEngine, InferenceRequest, InferenceResponse};

/// Deterministic stand-in for a recurrent model.
///
/// The probability mixes the window energy with the incoming state, and the new
/// state decays the old one towards the energy, so outputs depend on history.
pub struct RecurrentToyEngine;

impl InferenceEngine for RecurrentToyEngine {
    fn run(&mut self, request: &InferenceRequest<'_>) -> Result<InferenceResponse, EngineError> {
        let energy = rms(request.input);
        let memory = request.state.iter().sum::<f32>() / STATE_LEN as f32;
        let probability = 1.0 / (1.0 + (-(8.0 * energy + 2.0 * memory - 2.0)).exp());

        let state = request
            .state
            .iter()
            .enumerate()
            .map(|(i, v)| 0.7 * v + 0.3 * energy * (1.0 + i as f32 / STATE_LEN as f32))
            .collect();

        Ok(InferenceResponse { probability, state })
    }
}

/// Wraps another engine and fails while the shared switch is on.
pub struct SwitchableEngine<E> {
    pub inner: E,
    pub failing: Arc<AtomicBool>,
}

impl<E> SwitchableEngine<E> {
    pub fn new(inner: E) -> (Self, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner,
                failing: Arc::clone(&failing),
            },
            failing,
        )
    }
}

impl<E: InferenceEngine> InferenceEngine for SwitchableEngine<E> {
    fn run(&mut self, request: &InferenceRequest<'_>) -> Result<InferenceResponse, EngineError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Backend("injected engine failure".to_string()));
        }
        self.inner.run(request)
    }
}

/// Returns a `stateN` of the wrong length.
pub struct TruncatedStateEngine;

impl InferenceEngine for TruncatedStateEngine {
    fn run(&mut self, _request: &InferenceRequest<'_>) -> Result<InferenceResponse, EngineError> {
        Ok(InferenceResponse {
            probability: 0.9,
            state: vec![1.0; STATE_LEN / 2],
        })
    }
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

pub fn silence(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

/// Sine tone of `frequency` Hz, starting at phase zero.
pub fn tone(len: usize, sample_rate: u32, frequency: f32, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}
