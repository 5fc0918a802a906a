//! crater-ffi: C-ABI exports for the crater flight executive.
//!
//! One handle wraps one `FlightExec`. Each `crt_exec_step` call is one tick:
//! the caller passes the bytes received since the last tick and gets back
//! the frames to transmit.

mod args;
mod error;
mod exec;
mod types;

use std::panic::AssertUnwindSafe;

pub use exec::{crt_buffer_free, crt_exec_free, crt_exec_new, crt_exec_step};
pub use types::{
    CrtBuffer, CrtExecHandle, CrtResult, CRT_ERR_CONFIG, CRT_ERR_INTERNAL,
    CRT_ERR_INVALID_ARGUMENT, CRT_ERR_IO, CRT_ERR_LINK, CRT_OK,
};

/// Run `f`, turning a panic into `fallback` plus a recorded last error.
fn guarded<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    std::panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error::record_panic();
        fallback
    })
}

/// Reset this thread's error state. Optional; every entry point starts clean.
#[no_mangle]
pub extern "C" fn crt_init() -> CrtResult {
    guarded(CrtResult::Internal, || {
        error::clear();
        CrtResult::Ok
    })
}

#[no_mangle]
pub extern "C" fn crt_cleanup() {
    guarded((), error::clear);
}

/// Text of the last failure on this thread, or an empty string. Never null.
#[no_mangle]
pub extern "C" fn crt_last_error() -> *const std::os::raw::c_char {
    guarded(c"".as_ptr(), error::last_error_ptr)
}

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, CString};
    use std::ptr;

    use super::*;

    fn last_error() -> String {
        // SAFETY: crt_last_error never returns null.
        unsafe { CStr::from_ptr(crt_last_error()) }
            .to_str()
            .unwrap()
            .to_owned()
    }

    #[test]
    fn init_clears_failed_exec_new() {
        let doc = CString::new(r#"{"read_chunk_size": 0}"#).unwrap();
        let handle = unsafe { crt_exec_new(doc.as_ptr()) };
        assert!(handle.is_null());
        assert!(last_error().contains("read_chunk_size"));

        assert_eq!(crt_init(), CrtResult::Ok);
        assert_eq!(last_error(), "");
    }

    #[test]
    fn cleanup_clears_failed_step() {
        let mut out = CrtBuffer::default();
        let rc = unsafe { crt_exec_step(ptr::null_mut(), ptr::null(), 0, &mut out) };
        assert_eq!(rc, CRT_ERR_INVALID_ARGUMENT);
        assert!(!last_error().is_empty());

        crt_cleanup();
        assert_eq!(last_error(), "");
    }

    #[test]
    fn successful_call_clears_previous_error() {
        let _ = unsafe { crt_exec_step(ptr::null_mut(), ptr::null(), 0, ptr::null_mut()) };
        assert!(!last_error().is_empty());

        let handle = unsafe { crt_exec_new(ptr::null()) };
        assert!(!handle.is_null());
        assert_eq!(last_error(), "");
        unsafe { crt_exec_free(handle) };
    }

    #[test]
    fn panic_becomes_internal_result() {
        let rc = guarded(CRT_OK, || -> CrtResult { panic!("node failed") });
        assert_eq!(rc, CRT_ERR_INTERNAL);
        assert_eq!(last_error(), "panic inside crater entry point");
    }
}
