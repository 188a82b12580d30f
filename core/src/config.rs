use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::SampleRate;

/// Environment variable consulted for the model location.
pub const MODEL_PATH_ENV: &str = "VADLITE_MODEL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No model path given: pass one explicitly, set VADLITE_MODEL, or set session.model_path")]
    MissingModelPath,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default)]
    pub sample_rate: SampleRate,
}

/// Load-time options handed to the inference engine untouched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_inter_op_threads")]
    pub inter_op_threads: usize,
    #[serde(default = "default_intra_op_threads")]
    pub intra_op_threads: usize,
    #[serde(default)]
    pub optimization_level: OptimizationLevel,
}

fn default_inter_op_threads() -> usize {
    1
}

fn default_intra_op_threads() -> usize {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inter_op_threads: default_inter_op_threads(),
            intra_op_threads: default_intra_op_threads(),
            optimization_level: OptimizationLevel::default(),
        }
    }
}

/// Graph optimization level applied when the model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    Disabled,
    Basic,
    Extended,
    #[default]
    All,
}

impl OptimizationLevel {
    pub fn to_ort_level(self) -> ort::session::builder::GraphOptimizationLevel {
        use ort::session::builder::GraphOptimizationLevel as OrtLevel;
        match self {
            Self::Disabled => OrtLevel::Disable,
            Self::Basic => OrtLevel::Level1,
            Self::Extended => OrtLevel::Level2,
            Self::All => OrtLevel::Level3,
        }
    }
}

impl Config {
    /// Pick the model location: explicit argument, then `VADLITE_MODEL`, then
    /// `session.model_path`.
    pub fn resolve_model_path(&self, explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        if let Some(path) = std::env::var_os(MODEL_PATH_ENV).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        self.session
            .model_path
            .clone()
            .ok_or(ConfigError::MissingModelPath)
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    tracing::info!("Loading config from {:?}", path);
    let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = toml::from_str(&config_str)?;

    tracing::debug!("Config loaded successfully: {:?}", config);
    Ok(config)
}

/// Load `<config dir>/vadlite/config.toml`, falling back to defaults when it is absent.
pub fn load_default_config() -> Result<Config, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => load_config(&path),
        Some(path) => {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
        None => {
            tracing::info!("No config directory available, using defaults");
            Ok(Config::default())
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vadlite").join("config.toml"))
}
