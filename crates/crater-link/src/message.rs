use std::fmt;

/// Per-message-kind constants used to finalize and validate frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageMeta {
    /// 24-bit message id.
    pub id: u32,
    pub name: &'static str,
    /// Payload bytes without extension fields.
    pub min_length: u8,
    /// Payload bytes including extension fields.
    pub length: u8,
    /// Seed folded into the frame checksum. Assigned per message in the
    /// dialect table rather than derived from the field signature.
    pub crc_extra: u8,
}

/// A typed message with a fixed-offset payload layout.
///
/// `serialize` is handed a zeroed slice of exactly `META.length` bytes;
/// `deserialize` receives one of the same length, already zero-extended if the
/// sender trimmed trailing zeros.
pub trait Message: Clone + fmt::Debug + Sized {
    const META: MessageMeta;

    fn serialize(&self, payload: &mut [u8]);

    fn deserialize(payload: &[u8]) -> Self;
}
