use std::ffi::{c_char, c_int, CStr};

use vadlite_core::{ErrorKind, VadError};

/// Result code returned by every fallible `vadlite_*` function.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadStatus {
    Ok = 0,
    InvalidConfiguration = 1,
    ModelLoadFailure = 2,
    InvalidInputSize = 3,
    InferenceFailure = 4,
    NullPointer = 5,
    InvalidArgument = 6,
    Panic = 7,
}

impl VadStatus {
    pub fn from_code(code: c_int) -> Option<Self> {
        let status = match code {
            0 => Self::Ok,
            1 => Self::InvalidConfiguration,
            2 => Self::ModelLoadFailure,
            3 => Self::InvalidInputSize,
            4 => Self::InferenceFailure,
            5 => Self::NullPointer,
            6 => Self::InvalidArgument,
            7 => Self::Panic,
            _ => return None,
        };
        Some(status)
    }

    pub fn name(self) -> &'static CStr {
        match self {
            Self::Ok => c"ok",
            Self::InvalidConfiguration => c"invalid_configuration",
            Self::ModelLoadFailure => c"model_load_failure",
            Self::InvalidInputSize => c"invalid_input_size",
            Self::InferenceFailure => c"inference_failure",
            Self::NullPointer => c"null_pointer",
            Self::InvalidArgument => c"invalid_argument",
            Self::Panic => c"panic",
        }
    }
}

impl From<ErrorKind> for VadStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidConfiguration => Self::InvalidConfiguration,
            ErrorKind::ModelLoadFailure => Self::ModelLoadFailure,
            ErrorKind::InvalidInputSize => Self::InvalidInputSize,
            ErrorKind::InferenceFailure => Self::InferenceFailure,
        }
    }
}

impl From<&VadError> for VadStatus {
    fn from(err: &VadError) -> Self {
        err.kind().into()
    }
}

/// Static, NUL-terminated name of a status code; `"unknown"` for codes outside the enum.
#[no_mangle]
pub extern "C" fn vadlite_status_name(status: c_int) -> *const c_char {
    VadStatus::from_code(status)
        .map_or(c"unknown", VadStatus::name)
        .as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vadlite_core::EngineError;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(VadStatus::Ok as i32, 0);
        assert_eq!(VadStatus::InvalidConfiguration as i32, 1);
        assert_eq!(VadStatus::ModelLoadFailure as i32, 2);
        assert_eq!(VadStatus::InvalidInputSize as i32, 3);
        assert_eq!(VadStatus::InferenceFailure as i32, 4);
        assert_eq!(VadStatus::NullPointer as i32, 5);
        assert_eq!(VadStatus::InvalidArgument as i32, 6);
        assert_eq!(VadStatus::Panic as i32, 7);
    }

    #[test]
    fn test_error_to_status() {
        let err = VadError::InvalidInputSize {
            expected: 512,
            actual: 3,
        };
        assert_eq!(VadStatus::from(&err), VadStatus::InvalidInputSize);

        let err = VadError::InferenceFailure(EngineError::MissingOutput("output"));
        assert_eq!(VadStatus::from(&err), VadStatus::InferenceFailure);
    }

    #[test]
    fn test_from_code_round_trip() {
        for code in 0..=7 {
            let status = VadStatus::from_code(code).unwrap();
            assert_eq!(status as c_int, code);
        }
        assert_eq!(VadStatus::from_code(8), None);
        assert_eq!(VadStatus::from_code(-1), None);
    }

    #[test]
    fn test_status_name() {
        let name = unsafe {
            CStr::from_ptr(vadlite_status_name(VadStatus::ModelLoadFailure as c_int))
        };
        assert_eq!(name.to_str().unwrap(), "model_load_failure");

        let unknown = unsafe { CStr::from_ptr(vadlite_status_name(42)) };
        assert_eq!(unknown.to_str().unwrap(), "unknown");
    }
}
