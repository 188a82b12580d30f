//! ONNX Runtime backed engine for the Silero VAD graph.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::{Tensor, TensorRef};
use tracing::{debug, info};

use super::{
    InferenceEngine, InferenceRequest, InferenceResponse, INPUT_NAMES, OUTPUT_NAMES, STATE_SHAPE,
};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Loaded ONNX session.
///
/// `Session::run` needs exclusive access, so calls through one `OrtEngine` are
/// serialized by the borrow checker. Separate streams should use separate
/// engines.
pub struct OrtEngine {
    session: Session,
    model_path: PathBuf,
}

impl OrtEngine {
    /// Load the model at `model_path` and check its tensor names.
    ///
    /// # Arguments
    /// * `model_path` - Location of the `.onnx` artifact
    /// * `config` - Thread counts and optimization level, passed through as-is
    ///
    /// # Errors
    /// * `EngineError::ModelNotFound` if the file does not exist
    /// * `EngineError::Load` if ONNX Runtime rejects the file
    /// * `EngineError::IncompatibleModel` if a required input or output is missing
    pub fn load(model_path: &Path, config: &EngineConfig) -> Result<Self, EngineError> {
        if !model_path.is_file() {
            return Err(EngineError::ModelNotFound(model_path.to_path_buf()));
        }

        debug!(
            "Creating ONNX session: inter_op_threads={}, intra_op_threads={}, optimization_level={:?}",
            config.inter_op_threads, config.intra_op_threads, config.optimization_level
        );

        let session =
            Self::create_session(model_path, config).map_err(|source| EngineError::Load {
                path: model_path.to_path_buf(),
                source,
            })?;

        Self::validate_model_io(&session)?;

        info!("Model loaded from {:?}", model_path);

        Ok(Self {
            session,
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn create_session(model_path: &Path, config: &EngineConfig) -> ort::Result<Session> {
        Session::builder()?
            .with_optimization_level(config.optimization_level.to_ort_level())?
            .with_inter_threads(config.inter_op_threads)?
            .with_intra_threads(config.intra_op_threads)?
            .commit_from_file(model_path)
    }

    fn validate_model_io(session: &Session) -> Result<(), EngineError> {
        for (i, input) in session.inputs.iter().enumerate() {
            debug!("  Input {}: name={}", i, input.name);
        }
        for (i, output) in session.outputs.iter().enumerate() {
            debug!("  Output {}: name={}", i, output.name);
        }

        for name in INPUT_NAMES {
            if !session.inputs.iter().any(|input| input.name == name) {
                return Err(EngineError::IncompatibleModel {
                    kind: "input",
                    name,
                });
            }
        }

        for name in OUTPUT_NAMES {
            if !session.outputs.iter().any(|output| output.name == name) {
                return Err(EngineError::IncompatibleModel {
                    kind: "output",
                    name,
                });
            }
        }

        Ok(())
    }
}

impl InferenceEngine for OrtEngine {
    fn run(&mut self, request: &InferenceRequest<'_>) -> Result<InferenceResponse, EngineError> {
        let [input_name, state_name, sr_name] = INPUT_NAMES;
        let [output_name, state_out_name] = OUTPUT_NAMES;

        // Audio and state are borrowed straight from the caller and the session.
        let input = TensorRef::from_array_view((request.input_shape(), request.input))?;
        let state = TensorRef::from_array_view((STATE_SHAPE, &request.state[..]))?;
        let sr = Tensor::from_array(([1usize], vec![request.sample_rate]))?;

        let outputs = self.session.run(ort::inputs![
            input_name => input,
            state_name => state,
            sr_name => sr,
        ])?;

        let (_, output) = outputs
            .get(output_name)
            .ok_or(EngineError::MissingOutput(output_name))?
            .try_extract_tensor::<f32>()?;
        let probability = output
            .first()
            .copied()
            .ok_or(EngineError::OutputShape {
                name: output_name,
                expected: 1,
                actual: 0,
            })?;

        let (_, state_n) = outputs
            .get(state_out_name)
            .ok_or(EngineError::MissingOutput(state_out_name))?
            .try_extract_tensor::<f32>()?;

        Ok(InferenceResponse {
            probability,
            state: state_n.to_vec(),
        })
    }
}
