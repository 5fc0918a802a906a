use std::ffi::c_void;

use crater_fsw::FlightExec;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrtResult {
    Ok = 0,
    InvalidArgument = 1,
    ConfigError = 2,
    IoError = 3,
    LinkError = 4,
    Internal = 99,
}

#[allow(dead_code)]
pub const CRT_OK: CrtResult = CrtResult::Ok;
#[allow(dead_code)]
pub const CRT_ERR_INVALID_ARGUMENT: CrtResult = CrtResult::InvalidArgument;
#[allow(dead_code)]
pub const CRT_ERR_CONFIG: CrtResult = CrtResult::ConfigError;
#[allow(dead_code)]
pub const CRT_ERR_IO: CrtResult = CrtResult::IoError;
#[allow(dead_code)]
pub const CRT_ERR_LINK: CrtResult = CrtResult::LinkError;
#[allow(dead_code)]
pub const CRT_ERR_INTERNAL: CrtResult = CrtResult::Internal;

/// Output bytes owned by this library. Release with `crt_buffer_free`.
#[repr(C)]
#[derive(Debug)]
pub struct CrtBuffer {
    pub data: *mut u8,
    pub len: usize,
}

impl Default for CrtBuffer {
    fn default() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
        }
    }
}

pub type CrtExecHandle = *mut c_void;

pub(crate) struct ExecHandle {
    pub(crate) exec: FlightExec,
    pub(crate) scratch: Vec<u8>,
}
