use std::ptr;

use crater_fsw::FlightExec;

use crate::types::{CrtBuffer, CrtExecHandle, CrtResult, ExecHandle};
use crate::{args, error};

/// Free whatever `buffer` holds and leave it empty.
///
/// # Safety
/// `buffer.data` must be null or come from [`fill`].
unsafe fn release(buffer: &mut CrtBuffer) {
    if !buffer.data.is_null() {
        let bytes = ptr::slice_from_raw_parts_mut(buffer.data, buffer.len);
        // SAFETY: `fill` allocated exactly this slice as a `Box<[u8]>`.
        drop(unsafe { Box::from_raw(bytes) });
    }
    *buffer = CrtBuffer::default();
}

/// Replace the contents of `buffer` with a copy of `bytes`.
///
/// # Safety
/// Same contract as [`release`].
unsafe fn fill(buffer: &mut CrtBuffer, bytes: &[u8]) {
    // SAFETY: forwarded from the caller.
    unsafe { release(buffer) };
    if bytes.is_empty() {
        return;
    }
    let boxed: Box<[u8]> = bytes.into();
    buffer.len = boxed.len();
    buffer.data = Box::into_raw(boxed).cast::<u8>();
}

/// Create a flight executive.
///
/// `config_json` is an `FswConfig` JSON document; null selects the defaults.
/// Returns null on failure, with the reason available from `crt_last_error`.
///
/// # Safety
/// `config_json` must be null or a valid UTF-8, NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn crt_exec_new(config_json: *const std::os::raw::c_char) -> CrtExecHandle {
    crate::guarded(ptr::null_mut(), || {
        error::clear();

        // SAFETY: forwarded from the caller.
        let Ok(config) = (unsafe { args::config(config_json) }) else {
            return ptr::null_mut();
        };
        match FlightExec::from_config(config) {
            Ok(exec) => {
                let handle = Box::new(ExecHandle {
                    exec,
                    scratch: Vec::new(),
                });
                Box::into_raw(handle) as CrtExecHandle
            }
            Err(err) => {
                error::from_fsw(&err);
                ptr::null_mut()
            }
        }
    })
}

/// Run one tick: route `input`, step every node, and hand back the produced
/// frames in `out`.
///
/// # Safety
/// `exec` must be a valid handle from `crt_exec_new`. If `len > 0`, `input` must be
/// non-null and readable for `len` bytes. `out` must be a valid writable pointer; if it
/// already holds bytes from this library they are freed first.
#[no_mangle]
pub unsafe extern "C" fn crt_exec_step(
    exec: CrtExecHandle,
    input: *const u8,
    len: usize,
    out: *mut CrtBuffer,
) -> CrtResult {
    crate::guarded(CrtResult::Internal, || {
        error::clear();
        // SAFETY: forwarded from the caller.
        match unsafe { step(exec, input, len, out) } {
            Ok(()) => CrtResult::Ok,
            Err(code) => code,
        }
    })
}

/// # Safety
/// See [`crt_exec_step`].
unsafe fn step(
    exec: CrtExecHandle,
    input: *const u8,
    len: usize,
    out: *mut CrtBuffer,
) -> Result<(), CrtResult> {
    // SAFETY: each argument carries the contract of crt_exec_step.
    let input = unsafe { args::input(input, len) }?;
    let out = unsafe { args::output(out) }?;
    let handle = unsafe { args::exec(exec) }?;

    let ExecHandle { exec, scratch } = handle;
    exec.step(input, scratch).map_err(|err| error::from_fsw(&err))?;
    // SAFETY: `out` only ever holds buffers produced by `fill`.
    unsafe { fill(out, scratch) };
    Ok(())
}

/// Free bytes held by a [`CrtBuffer`] filled by `crt_exec_step`.
///
/// # Safety
/// `buffer` must be null or a valid pointer to a `CrtBuffer`. If `buffer->data` is
/// non-null, it must have originated from this library.
#[no_mangle]
pub unsafe extern "C" fn crt_buffer_free(buffer: *mut CrtBuffer) {
    crate::guarded((), || {
        // SAFETY: the caller guarantees a non-null `buffer` is valid and library-owned.
        if let Some(buffer) = unsafe { buffer.as_mut() } {
            // SAFETY: same contract, for the bytes it points at.
            unsafe { release(buffer) };
        }
    });
}

/// Free an executive handle.
///
/// # Safety
/// `exec` must be null or a handle returned by `crt_exec_new`.
#[no_mangle]
pub unsafe extern "C" fn crt_exec_free(exec: CrtExecHandle) {
    crate::guarded((), || {
        if !exec.is_null() {
            // SAFETY: the handle was allocated by crt_exec_new and is not used again.
            drop(unsafe { Box::from_raw(exec.cast::<ExecHandle>()) });
        }
    });
}
