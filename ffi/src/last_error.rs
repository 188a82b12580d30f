use std::cell::RefCell;
use std::ffi::{c_char, CString};
use std::ptr;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record `message` as the calling thread's last error.
pub(crate) fn set(message: &str) {
    // Interior NULs would truncate the C string; swap them out.
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

pub(crate) fn clear() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Detail for the most recent failed call on this thread, or NULL.
///
/// The pointer stays valid until the next `vadlite_*` call on the same thread.
#[no_mangle]
pub extern "C" fn vadlite_last_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(ptr::null(), |message| message.as_ptr())
    })
}
