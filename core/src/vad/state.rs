use crate::engine::{STATE_LEN, STATE_SHAPE};
use crate::error::EngineError;

/// Hidden and cell state of the recurrent network, shape `[2, 1, 128]`.
///
/// Always exactly [`STATE_LEN`] values. Starts zeroed and is replaced wholesale
/// after each successful window.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentState {
    values: Box<[f32; STATE_LEN]>,
}

impl RecurrentState {
    pub fn zeroed() -> Self {
        Self {
            values: Box::new([0.0; STATE_LEN]),
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        STATE_SHAPE
    }

    pub fn as_array(&self) -> &[f32; STATE_LEN] {
        &self.values
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values[..]
    }

    pub fn is_zeroed(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }

    /// Overwrite every value with `next`.
    ///
    /// The length is checked first; on mismatch nothing is written.
    pub fn replace_with(&mut self, next: &[f32]) -> Result<(), EngineError> {
        if next.len() != STATE_LEN {
            return Err(EngineError::OutputShape {
                name: "stateN",
                expected: STATE_LEN,
                actual: next.len(),
            });
        }
        self.values.copy_from_slice(next);
        Ok(())
    }
}

impl Default for RecurrentState {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_state() {
        let state = RecurrentState::zeroed();
        assert_eq!(state.as_slice().len(), 256);
        assert!(state.is_zeroed());
        assert_eq!(state.shape(), [2, 1, 128]);
    }

    #[test]
    fn test_replace_with_overwrites_everything() {
        let mut state = RecurrentState::zeroed();
        let next: Vec<f32> = (0..STATE_LEN).map(|i| i as f32).collect();
        state.replace_with(&next).unwrap();
        assert_eq!(state.as_slice(), next.as_slice());
        assert!(!state.is_zeroed());
    }

    #[test]
    fn test_replace_with_wrong_length_leaves_state() {
        let mut state = RecurrentState::zeroed();
        state.replace_with(&vec![1.0; STATE_LEN]).unwrap();
        let before = state.clone();

        for len in [0, STATE_LEN - 1, STATE_LEN + 1, 128] {
            let err = state.replace_with(&vec![9.0; len]).unwrap_err();
            assert!(matches!(err, EngineError::OutputShape { actual, .. } if actual == len));
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_reset_zeroes() {
        let mut state = RecurrentState::zeroed();
        state.replace_with(&vec![0.3; STATE_LEN]).unwrap();
        state.reset();
        assert!(state.is_zeroed());
        assert_eq!(state, RecurrentState::default());
    }
}
