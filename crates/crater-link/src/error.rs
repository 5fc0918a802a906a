/// Errors surfaced by the link layer.
///
/// Malformed or unroutable input never shows up here; the demultiplexer drops
/// it and counts it in [`DemuxStats`](crate::DemuxStats).
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// A route for this key is already registered.
    #[error("duplicate route for msg {msg_id} from {sys_id}:{comp_id}")]
    DuplicateRoute { msg_id: u32, sys_id: u8, comp_id: u8 },

    /// An I/O error occurred while reading or writing frames.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output sink accepted zero bytes mid-frame.
    #[error("sink closed (incomplete frame)")]
    SinkClosed,
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// Why the parser threw a frame away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported incompat flags {0:#04x}")]
    IncompatFlags(u8),

    #[error("unknown message id {0}")]
    UnknownMessage(u32),

    #[error("payload of {len} bytes exceeds {max} for msg {msg_id}")]
    PayloadTooLong { msg_id: u32, len: u8, max: u8 },

    #[error("checksum mismatch for msg {msg_id} (expected {expected:#06x}, got {actual:#06x})")]
    BadChecksum {
        msg_id: u32,
        expected: u16,
        actual: u16,
    },
}
