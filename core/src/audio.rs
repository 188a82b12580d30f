use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, VadError};

/// Length of one analysis window in milliseconds.
pub const WINDOW_DURATION_MS: usize = 32;

/// Sample rates the model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SampleRate {
    /// 8000 Hz, 256-sample windows
    Rate8kHz,
    /// 16000 Hz, 512-sample windows
    #[default]
    Rate16kHz,
}

impl SampleRate {
    /// Validate a raw rate in Hz.
    ///
    /// # Arguments
    /// * `hz` - Requested sample rate; anything other than 8000 or 16000 is rejected
    ///
    /// # Returns
    /// The matching `SampleRate`, or `VadError::InvalidConfiguration`
    pub fn from_hz(hz: i64) -> Result<Self> {
        match hz {
            8000 => Ok(Self::Rate8kHz),
            16000 => Ok(Self::Rate16kHz),
            other => Err(VadError::InvalidConfiguration(format!(
                "sample rate must be 16000 or 8000, got {}",
                other
            ))),
        }
    }

    pub fn as_hz(&self) -> u32 {
        match self {
            Self::Rate8kHz => 8000,
            Self::Rate16kHz => 16000,
        }
    }

    /// Number of samples every window must contain: `32 * (hz / 1000)`.
    pub fn window_size_samples(&self) -> usize {
        WINDOW_DURATION_MS * (self.as_hz() as usize / 1000)
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = VadError;

    fn try_from(hz: u32) -> Result<Self> {
        Self::from_hz(i64::from(hz))
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> Self {
        rate.as_hz()
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.as_hz())
    }
}

/// Decode raw little-endian f32 PCM bytes into samples.
///
/// Fails with `VadError::InvalidInputSize` when the byte count is not a whole
/// number of samples.
pub fn decode_f32le(bytes: &[u8]) -> Result<Vec<f32>> {
    const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

    if bytes.len() % SAMPLE_BYTES != 0 {
        return Err(VadError::InvalidInputSize {
            expected: bytes.len() / SAMPLE_BYTES * SAMPLE_BYTES,
            actual: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
