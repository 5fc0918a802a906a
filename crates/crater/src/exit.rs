use std::fmt;
use std::io;

use crater_core::ErrorValue;
use crater_fsw::{ConfigIssue, FswError};
use crater_link::LinkError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NO_INPUT: i32 = 66;
pub const CONFIG: i32 = 78;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => NO_INPUT,
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::BrokenPipe | io::ErrorKind::WriteZero => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Io(source) => io_error(context, source),
        LinkError::SinkClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn fsw_error(context: &str, err: FswError) -> CliError {
    match err {
        FswError::Parse(err) => CliError::new(CONFIG, format!("{context}: {err}")),
        FswError::Config(any) => {
            let detail = match any.downcast_ref::<ErrorValue<ConfigIssue>>() {
                Some(issue) => format!("{} ({})", issue.data().field, issue.data().reason),
                None => any.message(),
            };
            CliError::new(CONFIG, format!("{context}: invalid configuration: {detail}"))
        }
        FswError::Link(err) => link_error(context, err),
    }
}

pub fn json_error(context: &str, err: serde_json::Error) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}
