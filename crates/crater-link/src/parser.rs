use crate::codec::{checksum, RawFrame, CHECKSUM_LEN, HEADER_LEN, SIGNATURE_LEN, STX};
use crate::error::ParseError;
use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Len,
    IncompatFlags,
    CompatFlags,
    Seq,
    SysId,
    CompId,
    MsgId0,
    MsgId1,
    MsgId2,
    Payload,
    Crc0,
    Crc1,
    Skip,
}

/// Incompat flag marking a signed frame.
const INCOMPAT_SIGNED: u8 = 0x01;

/// Header bytes that follow the incompat flags.
const HEADER_TAIL_LEN: usize = HEADER_LEN - 3;

/// Outcome of feeding one byte to a [`FrameParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// More bytes are needed.
    Pending,
    /// A complete frame passed validation.
    Frame(RawFrame),
    /// A frame was rejected; the parser skips its remaining bytes, if any,
    /// then hunts for the next STX.
    Malformed(ParseError),
}

/// Counters kept by a [`FrameParser`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub bytes: u64,
    pub frames: u64,
    pub malformed: u64,
}

/// Byte-at-a-time MAVLink v2 frame parser.
///
/// Bytes outside a frame are skipped until the next STX. A frame whose header
/// is rejected (unknown id, oversized length, unsupported incompat flags) is
/// still consumed to its declared end before hunting resumes, so STX bytes in
/// its payload never start a new attempt. A frame that fails its checksum is
/// already fully consumed and hunting resumes at the next byte.
pub struct FrameParser {
    state: State,
    frame: RawFrame,
    payload_idx: usize,
    crc_extra: u8,
    crc_lo: u8,
    skip: usize,
    stats: ParseStats,
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            frame: RawFrame::empty(),
            payload_idx: 0,
            crc_extra: 0,
            crc_lo: 0,
            skip: 0,
            stats: ParseStats::default(),
        }
    }

    /// Advance the state machine by one byte.
    pub fn push(&mut self, byte: u8) -> Parsed {
        self.stats.bytes += 1;

        match self.state {
            State::Idle => {
                if byte == STX {
                    self.frame = RawFrame::empty();
                    self.state = State::Len;
                }
            }
            State::Len => {
                self.frame.len = byte;
                self.state = State::IncompatFlags;
            }
            State::IncompatFlags => {
                if byte != 0 {
                    let mut rest = HEADER_TAIL_LEN + self.declared_body_len();
                    if byte & INCOMPAT_SIGNED != 0 {
                        rest += SIGNATURE_LEN;
                    }
                    return self.skip_frame(ParseError::IncompatFlags(byte), rest);
                }
                self.frame.incompat_flags = byte;
                self.state = State::CompatFlags;
            }
            State::CompatFlags => {
                self.frame.compat_flags = byte;
                self.state = State::Seq;
            }
            State::Seq => {
                self.frame.seq = byte;
                self.state = State::SysId;
            }
            State::SysId => {
                self.frame.sys_id = byte;
                self.state = State::CompId;
            }
            State::CompId => {
                self.frame.comp_id = byte;
                self.state = State::MsgId0;
            }
            State::MsgId0 => {
                self.frame.msg_id = u32::from(byte);
                self.state = State::MsgId1;
            }
            State::MsgId1 => {
                self.frame.msg_id |= u32::from(byte) << 8;
                self.state = State::MsgId2;
            }
            State::MsgId2 => {
                self.frame.msg_id |= u32::from(byte) << 16;
                return self.on_header_complete();
            }
            State::Payload => {
                self.frame.payload[self.payload_idx] = byte;
                self.payload_idx += 1;
                if self.payload_idx == usize::from(self.frame.len) {
                    self.state = State::Crc0;
                }
            }
            State::Crc0 => {
                self.crc_lo = byte;
                self.state = State::Crc1;
            }
            State::Crc1 => {
                self.state = State::Idle;
                return self.finish(u16::from_le_bytes([self.crc_lo, byte]));
            }
            State::Skip => {
                self.skip -= 1;
                if self.skip == 0 {
                    self.state = State::Idle;
                }
            }
        }

        Parsed::Pending
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Drop any partially parsed frame.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.payload_idx = 0;
        self.skip = 0;
    }

    fn on_header_complete(&mut self) -> Parsed {
        let msg_id = self.frame.msg_id;
        let rest = self.declared_body_len();
        let Some(meta) = messages::lookup(msg_id) else {
            return self.skip_frame(ParseError::UnknownMessage(msg_id), rest);
        };
        if self.frame.len > meta.length {
            let err = ParseError::PayloadTooLong {
                msg_id,
                len: self.frame.len,
                max: meta.length,
            };
            return self.skip_frame(err, rest);
        }

        self.crc_extra = meta.crc_extra;
        self.payload_idx = 0;
        self.state = if self.frame.len == 0 {
            State::Crc0
        } else {
            State::Payload
        };
        Parsed::Pending
    }

    fn finish(&mut self, received: u16) -> Parsed {
        let header = self.frame.header();
        let expected = checksum(&header[1..HEADER_LEN], self.frame.payload(), self.crc_extra);
        if expected != received {
            return self.reject(ParseError::BadChecksum {
                msg_id: self.frame.msg_id,
                expected,
                actual: received,
            });
        }

        self.frame.checksum = received;
        self.stats.frames += 1;
        Parsed::Frame(self.frame.clone())
    }

    fn reject(&mut self, err: ParseError) -> Parsed {
        self.skip_frame(err, 0)
    }

    /// Reject the current frame and discard the next `rest` bytes.
    fn skip_frame(&mut self, err: ParseError, rest: usize) -> Parsed {
        self.reset();
        if rest > 0 {
            self.skip = rest;
            self.state = State::Skip;
        }
        self.stats.malformed += 1;
        Parsed::Malformed(err)
    }

    /// Payload plus checksum bytes announced by the length field.
    fn declared_body_len(&self) -> usize {
        usize::from(self.frame.len) + CHECKSUM_LEN
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameParser")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}
