//! `tokio_util` codec over the same frame parser, for async transports.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{RawFrame, MAX_FRAME_LEN};
use crate::error::LinkError;
use crate::parser::{FrameParser, ParseStats, Parsed};

/// Yields validated [`RawFrame`]s from a byte stream and writes them back.
///
/// Malformed input is skipped exactly as the blocking demultiplexer skips it.
#[derive(Debug, Default)]
pub struct LinkCodec {
    parser: FrameParser,
}

impl LinkCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ParseStats {
        self.parser.stats()
    }
}

impl Decoder for LinkCodec {
    type Item = RawFrame;
    type Error = LinkError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            match self.parser.push(src.get_u8()) {
                Parsed::Frame(frame) => return Ok(Some(frame)),
                Parsed::Malformed(err) => tracing::trace!(error = %err, "malformed frame dropped"),
                Parsed::Pending => {}
            }
        }
        Ok(None)
    }
}

impl Encoder<RawFrame> for LinkCodec {
    type Error = LinkError;

    fn encode(&mut self, frame: RawFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = frame.write_to(&mut buf);
        dst.extend_from_slice(&buf[..len]);
        Ok(())
    }
}
