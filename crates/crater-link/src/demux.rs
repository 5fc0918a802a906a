use std::collections::HashMap;
use std::io::{ErrorKind, Read};

use crater_core::Sender;

use crate::codec::{self, LinkConfig, RawFrame};
use crate::error::{LinkError, Result};
use crate::message::Message;
use crate::parser::{FrameParser, ParseStats, Parsed};

/// Routing key: which message kind, from whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub msg_id: u32,
    pub sys_id: u8,
    pub comp_id: u8,
}

impl RouteKey {
    fn of(frame: &RawFrame) -> Self {
        Self {
            msg_id: frame.msg_id(),
            sys_id: frame.sys_id(),
            comp_id: frame.comp_id(),
        }
    }
}

/// Counters kept by a [`StreamDemux`]. Purely diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    /// Frames that passed validation.
    pub frames: u64,
    /// Frames forwarded to a bus.
    pub delivered: u64,
    /// Valid frames with no registered route.
    pub unrouted: u64,
    /// Routed frames the bound type refused to decode.
    pub decode_mismatches: u64,
    /// Byte sequences rejected by the parser.
    pub parse_errors: u64,
}

type Dispatch = Box<dyn FnMut(&RawFrame) -> bool + Send>;

/// Reads frames from a byte stream and forwards each one to the bus
/// registered for its (message, system, component) key.
///
/// Frames that fail to parse, have no route, or do not decode are dropped and
/// counted. None of that stops the read loop or surfaces as an error.
pub struct StreamDemux {
    parser: FrameParser,
    routes: HashMap<RouteKey, Dispatch>,
    chunk: Box<[u8]>,
    stats: DemuxStats,
}

impl StreamDemux {
    /// Create a demultiplexer with default configuration.
    pub fn new() -> Self {
        Self::with_config(LinkConfig::default())
    }

    /// Create a demultiplexer with explicit configuration.
    ///
    /// # Panics
    /// Panics if `config.read_chunk_size` is zero.
    pub fn with_config(config: LinkConfig) -> Self {
        assert!(config.read_chunk_size > 0, "read_chunk_size must be nonzero");
        Self {
            parser: FrameParser::new(),
            routes: HashMap::new(),
            chunk: vec![0u8; config.read_chunk_size].into_boxed_slice(),
            stats: DemuxStats::default(),
        }
    }

    /// Forward frames of type `M` from `sys_id`/`comp_id` into `sender`.
    ///
    /// A key can only be registered once; the first registration wins.
    pub fn add_route<M>(&mut self, sender: Sender<M>, sys_id: u8, comp_id: u8) -> Result<()>
    where
        M: Message + Send + 'static,
    {
        let key = RouteKey {
            msg_id: M::META.id,
            sys_id,
            comp_id,
        };
        if self.routes.contains_key(&key) {
            return Err(LinkError::DuplicateRoute {
                msg_id: key.msg_id,
                sys_id,
                comp_id,
            });
        }

        let dispatch: Dispatch = Box::new(move |frame: &RawFrame| match codec::decode::<M>(frame) {
            Some(msg) => {
                sender.send(msg);
                true
            }
            None => false,
        });
        self.routes.insert(key, dispatch);
        tracing::debug!(msg = M::META.name, sys_id, comp_id, "demux route added");
        Ok(())
    }

    /// Read from `input` until it returns zero bytes or would block, routing
    /// every complete frame. Returns the number of frames delivered.
    ///
    /// A partial frame at the end of the input is kept and completed by the
    /// next call.
    pub fn process<R: Read>(&mut self, input: &mut R) -> Result<usize> {
        let mut delivered = 0usize;

        loop {
            let read = match input.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) => return Err(LinkError::Io(err)),
            };

            if read == 0 {
                break;
            }

            for i in 0..read {
                let byte = self.chunk[i];
                if self.on_byte(byte) {
                    delivered += 1;
                }
            }
        }

        tracing::trace!(delivered, "demux pass complete");
        Ok(delivered)
    }

    /// Route every frame completed by `bytes`. Returns the number delivered.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.on_byte(b)).count()
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    pub fn parse_stats(&self) -> ParseStats {
        self.parser.stats()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    fn on_byte(&mut self, byte: u8) -> bool {
        match self.parser.push(byte) {
            Parsed::Pending => false,
            Parsed::Malformed(err) => {
                self.stats.parse_errors += 1;
                tracing::trace!(error = %err, "malformed frame dropped");
                false
            }
            Parsed::Frame(frame) => self.route(&frame),
        }
    }

    fn route(&mut self, frame: &RawFrame) -> bool {
        self.stats.frames += 1;
        let key = RouteKey::of(frame);

        let Some(dispatch) = self.routes.get_mut(&key) else {
            self.stats.unrouted += 1;
            tracing::trace!(?key, "unrouted frame dropped");
            return false;
        };

        if dispatch(frame) {
            self.stats.delivered += 1;
            true
        } else {
            self.stats.decode_mismatches += 1;
            tracing::warn!(?key, "routed frame failed to decode");
            false
        }
    }
}

impl Default for StreamDemux {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamDemux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDemux")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .field("stats", &self.stats)
            .finish()
    }
}
