//! MAVLink v2 frame encoding and typed decoding.
//!
//! Wire format:
//! ```text
//! ┌─────┬─────┬──────────┬────────┬─────┬───────┬────────┬────────────┬─────────┬──────────┐
//! │ STX │ LEN │ INCOMPAT │ COMPAT │ SEQ │ SYSID │ COMPID │ MSGID (3B) │ PAYLOAD │ CRC (2B) │
//! │ 0xFD│     │          │        │     │       │        │ LE         │ LEN     │ LE       │
//! └─────┴─────┴──────────┴────────┴─────┴───────┴────────┴────────────┴─────────┴──────────┘
//! ```
//! The checksum is CRC-16/MCRF4XX over every header byte after STX, the
//! payload, and finally the message's `crc_extra` seed.

use crate::message::Message;

/// Frame start marker.
pub const STX: u8 = 0xFD;

/// Header: STX through MSGID.
pub const HEADER_LEN: usize = 10;

pub const CHECKSUM_LEN: usize = 2;

/// Optional trailing signature block. Never emitted here, but buffers are
/// sized for it so they can hold any valid frame.
pub const SIGNATURE_LEN: usize = 13;

pub const MAX_PAYLOAD_LEN: usize = 255;

/// Largest possible frame on the wire.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN + CHECKSUM_LEN + SIGNATURE_LEN;

const X25: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MCRF4XX);

/// Checksum over the header bytes after STX, the payload, and the seed.
pub fn checksum(header_tail: &[u8], payload: &[u8], crc_extra: u8) -> u16 {
    let mut digest = X25.digest();
    digest.update(header_tail);
    digest.update(payload);
    digest.update(&[crc_extra]);
    digest.finalize()
}

/// One complete, checksum-verified frame with an untyped payload.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub(crate) incompat_flags: u8,
    pub(crate) compat_flags: u8,
    pub(crate) seq: u8,
    pub(crate) sys_id: u8,
    pub(crate) comp_id: u8,
    pub(crate) msg_id: u32,
    pub(crate) len: u8,
    pub(crate) payload: [u8; MAX_PAYLOAD_LEN],
    pub(crate) checksum: u16,
}

impl RawFrame {
    pub(crate) fn empty() -> Self {
        Self {
            incompat_flags: 0,
            compat_flags: 0,
            seq: 0,
            sys_id: 0,
            comp_id: 0,
            msg_id: 0,
            len: 0,
            payload: [0; MAX_PAYLOAD_LEN],
            checksum: 0,
        }
    }

    /// Serialize `msg` into a finalized frame.
    ///
    /// Trailing zero bytes of the payload are trimmed, keeping at least one.
    pub fn from_message<M: Message>(msg: &M, seq: u8, sys_id: u8, comp_id: u8) -> Self {
        let mut frame = Self::empty();
        let full = usize::from(M::META.length);
        msg.serialize(&mut frame.payload[..full]);

        let trimmed = frame.payload[..full]
            .iter()
            .rposition(|&b| b != 0)
            .map_or(1, |last| last + 1);

        frame.seq = seq;
        frame.sys_id = sys_id;
        frame.comp_id = comp_id;
        frame.msg_id = M::META.id;
        frame.len = trimmed as u8;
        frame.checksum = checksum(&frame.header()[1..], frame.payload(), M::META.crc_extra);
        frame
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    pub fn sys_id(&self) -> u8 {
        self.sys_id
    }

    pub fn comp_id(&self) -> u8 {
        self.comp_id
    }

    pub fn msg_id(&self) -> u32 {
        self.msg_id
    }

    /// Payload bytes as carried on the wire (possibly trimmed).
    pub fn payload(&self) -> &[u8] {
        &self.payload[..usize::from(self.len)]
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Wire size of this frame.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + usize::from(self.len) + CHECKSUM_LEN
    }

    pub(crate) fn header(&self) -> [u8; HEADER_LEN] {
        let id = self.msg_id.to_le_bytes();
        [
            STX,
            self.len,
            self.incompat_flags,
            self.compat_flags,
            self.seq,
            self.sys_id,
            self.comp_id,
            id[0],
            id[1],
            id[2],
        ]
    }

    /// Write the frame into `buf` and return the number of bytes used.
    pub fn write_to(&self, buf: &mut [u8; MAX_FRAME_LEN]) -> usize {
        let payload_end = HEADER_LEN + usize::from(self.len);
        buf[..HEADER_LEN].copy_from_slice(&self.header());
        buf[HEADER_LEN..payload_end].copy_from_slice(self.payload());
        buf[payload_end..payload_end + CHECKSUM_LEN].copy_from_slice(&self.checksum.to_le_bytes());
        payload_end + CHECKSUM_LEN
    }

    /// The frame as an owned byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let n = self.write_to(&mut buf);
        buf[..n].to_vec()
    }

    /// Decode the payload as `M`, or `None` if this frame carries another kind.
    pub fn decode<M: Message>(&self) -> Option<M> {
        decode(self)
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("seq", &self.seq)
            .field("sys_id", &self.sys_id)
            .field("comp_id", &self.comp_id)
            .field("msg_id", &self.msg_id)
            .field("payload", &self.payload())
            .field("checksum", &format_args!("{:#06x}", self.checksum))
            .finish()
    }
}

/// Encode `msg` into `buf` and return the frame length.
pub fn encode<M: Message>(
    msg: &M,
    seq: u8,
    sys_id: u8,
    comp_id: u8,
    buf: &mut [u8; MAX_FRAME_LEN],
) -> usize {
    RawFrame::from_message(msg, seq, sys_id, comp_id).write_to(buf)
}

/// Decode `frame` as `M`.
///
/// Returns `None` when the frame's message id is not `M`'s; that is a routine
/// outcome, not an error. Short payloads are zero-extended to full length.
pub fn decode<M: Message>(frame: &RawFrame) -> Option<M> {
    if frame.msg_id != M::META.id {
        return None;
    }

    let full = usize::from(M::META.length);
    let mut payload = [0u8; MAX_PAYLOAD_LEN];
    let carried = frame.payload();
    let n = carried.len().min(full);
    payload[..n].copy_from_slice(&carried[..n]);

    Some(M::deserialize(&payload[..full]))
}

/// Default read chunk for stream demultiplexing.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Configuration for the link layer.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Bytes requested from the input per `read` call. Default: 1 KiB.
    pub read_chunk_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK,
        }
    }
}
