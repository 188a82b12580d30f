//! C ABI for `vadlite-core`.
//!
//! Every fallible function returns a [`VadStatus`]; values come back through out
//! pointers. Call [`vadlite_last_error_message`] after a failure for details.
//! Handles are not synchronized: one handle must not be used from two threads
//! at the same time.

mod last_error;
mod status;

use std::ffi::{c_char, c_int, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::{ptr, slice};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vadlite_core::{
    EngineConfig, InferenceEngine, OptimizationLevel, OrtEngine, VadError, VadSession,
};

pub use last_error::vadlite_last_error_message;
pub use status::{vadlite_status_name, VadStatus};

type DynEngine = Box<dyn InferenceEngine + Send>;

/// Opaque session handle handed to C callers.
pub struct VadHandle {
    session: VadSession<DynEngine>,
}

/// Engine options for [`vadlite_create_with_options`].
///
/// `optimization_level` is one of the `VADLITE_OPT_*` constants.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VadEngineOptions {
    pub inter_op_threads: usize,
    pub intra_op_threads: usize,
    pub optimization_level: c_int,
}

pub const VADLITE_OPT_DISABLED: c_int = 0;
pub const VADLITE_OPT_BASIC: c_int = 1;
pub const VADLITE_OPT_EXTENDED: c_int = 2;
pub const VADLITE_OPT_ALL: c_int = 3;

impl VadEngineOptions {
    fn to_engine_config(self) -> Option<EngineConfig> {
        let optimization_level = match self.optimization_level {
            VADLITE_OPT_DISABLED => OptimizationLevel::Disabled,
            VADLITE_OPT_BASIC => OptimizationLevel::Basic,
            VADLITE_OPT_EXTENDED => OptimizationLevel::Extended,
            VADLITE_OPT_ALL => OptimizationLevel::All,
            _ => return None,
        };
        Some(EngineConfig {
            inter_op_threads: self.inter_op_threads,
            intra_op_threads: self.intra_op_threads,
            optimization_level,
        })
    }
}

/// Run `body`, turning a panic into `VadStatus::Panic`.
fn guard<F>(body: F) -> VadStatus
where
    F: FnOnce() -> VadStatus,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(status) => status,
        Err(_) => {
            last_error::set("internal panic in vadlite");
            VadStatus::Panic
        }
    }
}

fn fail(err: &VadError) -> VadStatus {
    tracing::warn!("vadlite call failed: {}", err);
    last_error::set(&err.to_string());
    VadStatus::from(err)
}

fn fail_with(status: VadStatus, message: &str) -> VadStatus {
    last_error::set(message);
    status
}

/// Create a session with default engine options.
///
/// # Safety
/// `model_path` must be NULL or a NUL-terminated string; `out_handle` must be
/// NULL or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn vadlite_create(
    model_path: *const c_char,
    sample_rate: c_int,
    out_handle: *mut *mut VadHandle,
) -> VadStatus {
    vadlite_create_with_options(model_path, sample_rate, ptr::null(), out_handle)
}

/// Create a session.
///
/// On success `*out_handle` receives a handle to release with
/// [`vadlite_destroy`]. On failure it is set to NULL and nothing is allocated.
/// `options` may be NULL for the defaults (one thread each, full optimization).
///
/// # Safety
/// `model_path` must be NULL or a NUL-terminated string, `options` NULL or
/// valid for reads, `out_handle` NULL or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn vadlite_create_with_options(
    model_path: *const c_char,
    sample_rate: c_int,
    options: *const VadEngineOptions,
    out_handle: *mut *mut VadHandle,
) -> VadStatus {
    guard(|| {
        if out_handle.is_null() {
            return fail_with(VadStatus::NullPointer, "out_handle is NULL");
        }
        *out_handle = ptr::null_mut();

        if model_path.is_null() {
            return fail_with(VadStatus::NullPointer, "model_path is NULL");
        }
        let Ok(model_path) = CStr::from_ptr(model_path).to_str() else {
            return fail_with(VadStatus::InvalidArgument, "model_path is not valid UTF-8");
        };

        let engine_config = if options.is_null() {
            EngineConfig::default()
        } else {
            match (*options).to_engine_config() {
                Some(config) => config,
                None => {
                    return fail_with(
                        VadStatus::InvalidArgument,
                        "optimization_level is not a VADLITE_OPT_* value",
                    )
                }
            }
        };

        match open_session(Path::new(model_path), sample_rate, &engine_config) {
            Ok(session) => {
                *out_handle = Box::into_raw(Box::new(VadHandle { session }));
                last_error::clear();
                VadStatus::Ok
            }
            Err(err) => fail(&err),
        }
    })
}

fn open_session(
    model_path: &Path,
    sample_rate: c_int,
    engine_config: &EngineConfig,
) -> Result<VadSession<DynEngine>, VadError> {
    VadSession::open(i64::from(sample_rate), || {
        OrtEngine::load(model_path, engine_config).map(|engine| Box::new(engine) as DynEngine)
    })
}

/// Release a handle. NULL is ignored.
///
/// # Safety
/// `handle` must come from `vadlite_create*` and must not be used afterwards.
/// Destroying the same handle twice is undefined behaviour.
#[no_mangle]
pub unsafe extern "C" fn vadlite_destroy(handle: *mut VadHandle) {
    if handle.is_null() {
        return;
    }
    guard(|| {
        drop(Box::from_raw(handle));
        VadStatus::Ok
    });
}

/// Speech probability for one window of `size` samples.
///
/// `size` must equal [`vadlite_get_window_size_samples`]. On
/// `VadStatus::InferenceFailure` the recurrent state is unchanged and the same
/// window may be resubmitted.
///
/// # Safety
/// `handle` must be a live handle, `samples` valid for `size` reads, and
/// `out_probability` valid for writes.
#[no_mangle]
pub unsafe extern "C" fn vadlite_process(
    handle: *mut VadHandle,
    samples: *const f32,
    size: usize,
    out_probability: *mut f32,
) -> VadStatus {
    guard(|| {
        let Some(handle) = handle.as_mut() else {
            return fail_with(VadStatus::NullPointer, "handle is NULL");
        };
        if out_probability.is_null() {
            return fail_with(VadStatus::NullPointer, "out_probability is NULL");
        }

        let expected = handle.session.window_size_samples();
        if size != expected {
            return fail(&VadError::InvalidInputSize {
                expected,
                actual: size,
            });
        }
        if samples.is_null() {
            return fail_with(VadStatus::NullPointer, "samples is NULL");
        }

        let window = slice::from_raw_parts(samples, size);
        match handle.session.predict(window) {
            Ok(probability) => {
                *out_probability = probability;
                last_error::clear();
                VadStatus::Ok
            }
            Err(err) => fail(&err),
        }
    })
}

/// Zero the recurrent state so the next window starts a new stream.
///
/// # Safety
/// `handle` must be NULL or a live handle.
#[no_mangle]
pub unsafe extern "C" fn vadlite_reset(handle: *mut VadHandle) -> VadStatus {
    guard(|| {
        let Some(handle) = handle.as_mut() else {
            return fail_with(VadStatus::NullPointer, "handle is NULL");
        };
        handle.session.reset();
        last_error::clear();
        VadStatus::Ok
    })
}

/// Samples per window: 256 at 8 kHz, 512 at 16 kHz. Returns 0 for NULL.
///
/// # Safety
/// `handle` must be NULL or a live handle.
#[no_mangle]
pub unsafe extern "C" fn vadlite_get_window_size_samples(handle: *const VadHandle) -> usize {
    handle
        .as_ref()
        .map_or(0, |handle| handle.session.window_size_samples())
}

/// Configured sample rate in Hz. Returns 0 for NULL.
///
/// # Safety
/// `handle` must be NULL or a live handle.
#[no_mangle]
pub unsafe extern "C" fn vadlite_get_sample_rate(handle: *const VadHandle) -> c_int {
    handle.as_ref().map_or(0, |handle| {
        c_int::try_from(handle.session.sample_rate().as_hz()).unwrap_or(0)
    })
}

/// Send `tracing` output to stderr, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
#[no_mangle]
pub extern "C" fn vadlite_init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();
}

impl VadHandle {
    #[cfg(test)]
    fn from_engine<E>(engine: E, sample_rate: vadlite_core::SampleRate) -> Self
    where
        E: InferenceEngine + Send + 'static,
    {
        Self {
            session: VadSession::from_engine(Box::new(engine) as DynEngine, sample_rate),
        }
    }
}
