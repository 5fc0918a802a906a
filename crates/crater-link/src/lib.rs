//! MAVLink v2 framing bridged onto the crater telemetry bus.
//!
//! [`StreamDemux`] parses a byte stream one byte at a time and forwards each
//! validated frame to the bus registered for its (message, system, component)
//! key. [`StreamMux`] drains bus receivers and writes their samples back out
//! as frames. Both work over plain `std::io::Read`/`Write`; enable the `async`
//! feature for a `tokio_util` codec.

pub mod codec;
pub mod demux;
pub mod error;
#[cfg(feature = "async")]
pub mod framed;
pub mod message;
pub mod messages;
pub mod mux;
pub mod parser;

pub use codec::{
    decode, encode, LinkConfig, RawFrame, CHECKSUM_LEN, HEADER_LEN, MAX_FRAME_LEN,
    MAX_PAYLOAD_LEN, STX,
};
pub use demux::{DemuxStats, RouteKey, StreamDemux};
pub use error::{LinkError, ParseError, Result};
#[cfg(feature = "async")]
pub use framed::LinkCodec;
pub use message::{Message, MessageMeta};
pub use messages::{AnyMessage, ComponentId, GROUND_SYSTEM_ID, SYSTEM_ID};
pub use mux::StreamMux;
pub use parser::{FrameParser, ParseStats, Parsed};
