use crater_core::AnyError;
use crater_link::LinkError;

/// Errors that can occur while configuring or stepping the flight executive.
#[derive(Debug, thiserror::Error)]
pub enum FswError {
    /// The configuration document could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but failed validation.
    ///
    /// Downcast to `ErrorValue<ConfigIssue>` for the offending field.
    #[error("invalid configuration: {0}")]
    Config(#[from] AnyError),

    /// Reading input or writing output failed.
    #[error(transparent)]
    Link(#[from] LinkError),
}

pub type Result<T> = std::result::Result<T, FswError>;
