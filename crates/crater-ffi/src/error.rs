use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use crater_fsw::FswError;
use crater_link::LinkError;

use crate::types::CrtResult;

thread_local! {
    // None reads back as the empty string.
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

pub(crate) fn clear() {
    LAST_ERROR.with_borrow_mut(|slot| *slot = None);
}

/// Store `message` as this thread's last error. Interior NULs become `?`.
pub(crate) fn record(message: impl Into<String>) {
    let text: String = message
        .into()
        .chars()
        .map(|c| if c == '\0' { '?' } else { c })
        .collect();
    LAST_ERROR.with_borrow_mut(|slot| *slot = CString::new(text).ok());
}

/// Record `message` and hand back `code`, for early returns.
pub(crate) fn fail(code: CrtResult, message: impl Into<String>) -> CrtResult {
    record(message);
    code
}

pub(crate) fn record_panic() {
    record("panic inside crater entry point");
}

/// Result code for an executive error. The error text becomes the last error.
pub(crate) fn from_fsw(err: &FswError) -> CrtResult {
    let code = match err {
        FswError::Parse(_) | FswError::Config(_) => CrtResult::ConfigError,
        FswError::Link(LinkError::Io(_)) => CrtResult::IoError,
        FswError::Link(_) => CrtResult::LinkError,
    };
    fail(code, err.to_string())
}

/// Pointer to this thread's last error. Valid until the next crater call on
/// the same thread.
pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with_borrow(|slot| slot.as_deref().unwrap_or(c"").as_ptr())
}
