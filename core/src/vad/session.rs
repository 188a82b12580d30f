use std::path::Path;

use tracing::{debug, info, trace, warn};

use super::state::RecurrentState;
use crate::audio::SampleRate;
use crate::config::EngineConfig;
use crate::engine::{InferenceEngine, InferenceRequest, OrtEngine};
use crate::error::{EngineError, Result, VadError};

/// Stateful speech-probability estimator for one audio stream.
///
/// Each call to [`predict`](VadSession::predict) consumes exactly
/// [`window_size_samples`](VadSession::window_size_samples) samples and feeds the
/// recurrent state produced by the previous call back into the model. Windows
/// must therefore be contiguous and in order; use [`reset`](VadSession::reset)
/// before starting an unrelated stream.
///
/// A session has a single writer: `predict` and `reset` take `&mut self`. Wrap it
/// in a `Mutex` to share it between threads, or give each stream its own session.
///
/// # Example
///
/// ```ignore
/// use vadlite_core::VadSession;
///
/// let mut vad = VadSession::new("silero_vad.onnx", 16000)?;
/// let window = vec![0.0f32; vad.window_size_samples()];
/// let probability = vad.predict(&window)?;
/// ```
pub struct VadSession<E = OrtEngine> {
    engine: E,
    sample_rate: SampleRate,
    window_size_samples: usize,
    state: RecurrentState,
}

impl VadSession<OrtEngine> {
    /// Open a session on the model at `model_path` with the default engine config.
    pub fn new(model_path: impl AsRef<Path>, sample_rate_hz: i64) -> Result<Self> {
        Self::with_config(model_path, sample_rate_hz, &EngineConfig::default())
    }

    /// Open a session on the model at `model_path`.
    ///
    /// # Arguments
    /// * `model_path` - Location of the ONNX artifact
    /// * `sample_rate_hz` - 8000 or 16000
    /// * `engine_config` - Passed through to ONNX Runtime
    ///
    /// # Errors
    /// * `VadError::InvalidConfiguration` for any other sample rate; the model is not touched
    /// * `VadError::ModelLoadFailure` if the model is missing, corrupt or has the wrong tensors
    pub fn with_config(
        model_path: impl AsRef<Path>,
        sample_rate_hz: i64,
        engine_config: &EngineConfig,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        Self::open(sample_rate_hz, || OrtEngine::load(model_path, engine_config))
    }
}

impl<E: InferenceEngine> VadSession<E> {
    /// Validate `sample_rate_hz`, then call `load_engine`.
    ///
    /// The loader only runs once the rate is known to be valid, so a bad rate never
    /// acquires engine resources.
    pub fn open<F>(sample_rate_hz: i64, load_engine: F) -> Result<Self>
    where
        F: FnOnce() -> std::result::Result<E, EngineError>,
    {
        let sample_rate = SampleRate::from_hz(sample_rate_hz)?;
        let engine = load_engine().map_err(|e| {
            warn!("Failed to load VAD model: {}", e);
            VadError::ModelLoadFailure(e)
        })?;
        Ok(Self::from_engine(engine, sample_rate))
    }

    /// Wrap an already loaded engine.
    pub fn from_engine(engine: E, sample_rate: SampleRate) -> Self {
        let window_size_samples = sample_rate.window_size_samples();

        info!(
            "VAD session ready (sample_rate={}, window_size_samples={})",
            sample_rate.as_hz(),
            window_size_samples
        );

        Self {
            engine,
            sample_rate,
            window_size_samples,
            state: RecurrentState::zeroed(),
        }
    }

    /// Speech probability for one window.
    ///
    /// # Arguments
    /// * `window` - Exactly `window_size_samples()` mono samples, nominally in [-1.0, 1.0]
    ///
    /// # Returns
    /// The model's `output` value, unclamped
    ///
    /// # Errors
    /// * `VadError::InvalidInputSize` if the window has the wrong length
    /// * `VadError::InferenceFailure` if the engine fails; the recurrent state is
    ///   left exactly as it was, so the same window can be resubmitted
    pub fn predict(&mut self, window: &[f32]) -> Result<f32> {
        if window.len() != self.window_size_samples {
            return Err(VadError::InvalidInputSize {
                expected: self.window_size_samples,
                actual: window.len(),
            });
        }

        let request = InferenceRequest {
            input: window,
            state: self.state.as_array(),
            sample_rate: i64::from(self.sample_rate.as_hz()),
        };

        let response = self.engine.run(&request).map_err(|e| {
            warn!("VAD inference failed: {}", e);
            VadError::InferenceFailure(e)
        })?;

        self.state.replace_with(&response.state).map_err(|e| {
            warn!("VAD inference returned a malformed state: {}", e);
            VadError::InferenceFailure(e)
        })?;

        trace!("Speech probability: {:.4}", response.probability);
        Ok(response.probability)
    }

    /// Zero the recurrent state so the next window starts a fresh stream.
    pub fn reset(&mut self) {
        self.state.reset();
        debug!("VAD state reset");
    }

    pub fn window_size_samples(&self) -> usize {
        self.window_size_samples
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Current recurrent state.
    pub fn state(&self) -> &RecurrentState {
        &self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{InferenceResponse, STATE_LEN};
    use crate::error::ErrorKind;

    /// Engine whose outputs depend on the input and on the incoming state.
    struct Accumulator {
        calls: usize,
    }

    impl InferenceEngine for Accumulator {
        fn run(
            &mut self,
            request: &InferenceRequest<'_>,
        ) -> std::result::Result<InferenceResponse, EngineError> {
            self.calls += 1;
            let energy: f32 = request.input.iter().map(|s| s.abs()).sum::<f32>()
                / request.input.len() as f32;
            let carried = request.state[0];
            Ok(InferenceResponse {
                probability: (energy + carried).min(1.0),
                state: vec![carried * 0.5 + energy; STATE_LEN],
            })
        }
    }

    fn session(hz: i64) -> VadSession<Accumulator> {
        VadSession::open(hz, || Ok(Accumulator { calls: 0 })).unwrap()
    }

    #[test]
    fn test_window_size_per_rate() {
        assert_eq!(session(8000).window_size_samples(), 256);
        assert_eq!(session(16000).window_size_samples(), 512);
    }

    #[test]
    fn test_sample_rate_accessor() {
        assert_eq!(session(8000).sample_rate(), SampleRate::Rate8kHz);
        assert_eq!(session(16000).sample_rate().as_hz(), 16000);
    }

    #[test]
    fn test_fresh_state_is_zero() {
        assert!(session(16000).state().is_zeroed());
    }

    #[test]
    fn test_invalid_rate_skips_loader() {
        let mut loaded = false;
        let result = VadSession::<Accumulator>::open(44100, || {
            loaded = true;
            Ok(Accumulator { calls: 0 })
        });
        assert_eq!(result.err().unwrap().kind(), ErrorKind::InvalidConfiguration);
        assert!(!loaded);
    }

    #[test]
    fn test_loader_failure_is_model_load_failure() {
        let result = VadSession::<Accumulator>::open(16000, || {
            Err(EngineError::Backend("corrupt graph".into()))
        });
        let err = result.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ModelLoadFailure);
        assert!(err.to_string().contains("corrupt graph"));
    }

    #[test]
    fn test_wrong_size_never_reaches_engine() {
        let mut vad = session(8000);
        let err = vad.predict(&[0.0; 512]).unwrap_err();
        assert!(matches!(
            err,
            VadError::InvalidInputSize {
                expected: 256,
                actual: 512
            }
        ));
        assert_eq!(vad.engine().calls, 0);
        assert!(vad.state().is_zeroed());
    }

    #[test]
    fn test_predict_updates_state() {
        let mut vad = session(8000);
        vad.predict(&[0.5; 256]).unwrap();
        assert_eq!(vad.state().as_slice(), &[0.5; STATE_LEN][..]);
        assert_eq!(vad.engine().calls, 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut vad = session(16000);
        vad.predict(&[0.2; 512]).unwrap();
        assert!(!vad.state().is_zeroed());
        vad.reset();
        assert!(vad.state().is_zeroed());
    }
}
