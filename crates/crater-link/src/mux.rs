use std::io::{ErrorKind, Write};

use crater_core::Receiver;

use crate::codec::{RawFrame, MAX_FRAME_LEN};
use crate::error::{LinkError, Result};
use crate::message::Message;

type Poll = Box<dyn FnMut(u8) -> Option<RawFrame> + Send>;

struct Channel {
    name: &'static str,
    poll: Poll,
}

/// Drains bus receivers and writes every pending sample as a frame.
///
/// Channels are flushed one at a time in registration order: a channel is
/// emptied completely before the next one is looked at. A channel that keeps
/// producing faster than it is drained starves the ones after it.
pub struct StreamMux {
    channels: Vec<Channel>,
    buf: [u8; MAX_FRAME_LEN],
    seq: u8,
    frames_written: u64,
}

impl StreamMux {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            buf: [0; MAX_FRAME_LEN],
            seq: 0,
            frames_written: 0,
        }
    }

    /// Encode samples from `receiver` as coming from `sys_id`/`comp_id`.
    pub fn add_channel<M>(&mut self, receiver: Receiver<M>, sys_id: u8, comp_id: u8)
    where
        M: Message + Send + 'static,
    {
        let poll: Poll = Box::new(move |seq| {
            receiver
                .try_receive()
                .map(|msg| RawFrame::from_message(&msg, seq, sys_id, comp_id))
        });
        self.channels.push(Channel {
            name: M::META.name,
            poll,
        });
        tracing::debug!(msg = M::META.name, sys_id, comp_id, "mux channel added");
    }

    /// Drain every channel into `output`. Returns the number of frames written.
    ///
    /// Interrupted writes are retried. Any other write error, `WouldBlock`
    /// included, aborts the pass: the sample being written is lost and the
    /// remaining samples stay queued for the next call.
    pub fn process<W: Write>(&mut self, output: &mut W) -> Result<usize> {
        let mut written = 0usize;

        for channel in &mut self.channels {
            while let Some(frame) = (channel.poll)(self.seq) {
                self.seq = self.seq.wrapping_add(1);
                let len = frame.write_to(&mut self.buf);
                if let Err(err) = write_all(output, &self.buf[..len]) {
                    tracing::warn!(channel = channel.name, error = %err, "frame write failed");
                    return Err(err);
                }
                written += 1;
            }
        }

        self.frames_written += written as u64;
        if written > 0 {
            flush(output)?;
        }
        tracing::trace!(written, "mux pass complete");
        Ok(written)
    }

    /// Sequence number the next frame will carry.
    pub fn next_seq(&self) -> u8 {
        self.seq
    }

    /// Frames written since creation.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for StreamMux {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamMux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamMux")
            .field(
                "channels",
                &self.channels.iter().map(|c| c.name).collect::<Vec<_>>(),
            )
            .field("seq", &self.seq)
            .field("frames_written", &self.frames_written)
            .finish()
    }
}

fn write_all<W: Write>(output: &mut W, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match output.write(&bytes[offset..]) {
            Ok(0) => return Err(LinkError::SinkClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(LinkError::Io(err)),
        }
    }
    Ok(())
}

fn flush<W: Write>(output: &mut W) -> Result<()> {
    loop {
        match output.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(LinkError::Io(err)),
        }
    }
}
