//! Checked conversions from raw C arguments. Each failure records the last
//! error and yields the code the entry point returns.

use std::ffi::CStr;
use std::os::raw::c_char;

use crater_fsw::FswConfig;

use crate::error;
use crate::types::{CrtBuffer, CrtExecHandle, CrtResult, ExecHandle};

type ArgResult<T> = Result<T, CrtResult>;

/// Parse an `FswConfig` JSON document. Null selects the defaults.
///
/// # Safety
/// `config_json` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn config(config_json: *const c_char) -> ArgResult<FswConfig> {
    if config_json.is_null() {
        return Ok(FswConfig::default());
    }

    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let raw = unsafe { CStr::from_ptr(config_json) };
    let text = raw
        .to_str()
        .map_err(|_| error::fail(CrtResult::InvalidArgument, "config_json is not UTF-8"))?;
    FswConfig::from_json(text).map_err(|err| error::from_fsw(&err))
}

/// Borrow `len` input bytes. Zero length accepts a null pointer.
///
/// # Safety
/// When `len > 0` and `input` is non-null, it must be readable for `len`
/// bytes for the duration of the call.
pub(crate) unsafe fn input<'a>(input: *const u8, len: usize) -> ArgResult<&'a [u8]> {
    match (input.is_null(), len) {
        (_, 0) => Ok(&[]),
        (true, _) => Err(error::fail(
            CrtResult::InvalidArgument,
            format!("input is null but len is {len}"),
        )),
        // SAFETY: non-null and readable for `len` bytes per the caller's contract.
        (false, _) => Ok(unsafe { std::slice::from_raw_parts(input, len) }),
    }
}

/// # Safety
/// `out` must be null or valid for writes.
pub(crate) unsafe fn output<'a>(out: *mut CrtBuffer) -> ArgResult<&'a mut CrtBuffer> {
    // SAFETY: the caller guarantees a non-null `out` is valid.
    unsafe { out.as_mut() }.ok_or_else(|| error::fail(CrtResult::InvalidArgument, "out is null"))
}

/// # Safety
/// `exec` must be null or a live handle from `crt_exec_new`.
pub(crate) unsafe fn exec<'a>(exec: CrtExecHandle) -> ArgResult<&'a mut ExecHandle> {
    // SAFETY: a non-null handle was produced by `Box::into_raw` in crt_exec_new.
    unsafe { exec.cast::<ExecHandle>().as_mut() }
        .ok_or_else(|| error::fail(CrtResult::InvalidArgument, "exec handle is null"))
}
