//! Frame assembly from a byte channel
//!
//! [`ChannelReader`] owns the receive buffer. Bytes left over after a frame
//! (a back-to-back event, say) stay buffered for the next [`pump`] call.
//!
//! [`pump`]: ChannelReader::pump

use bytes::{Buf, BytesMut};
use gnetplus_core::constants::READ_CHUNK;
use gnetplus_core::{DecodeResult, Frame, FrameCodec, FrameError};
use gnetplus_transport::{Channel, Error as TransportError};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{ChannelFailure, TransactionError};

/// Why a pump ended without a frame
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Deadline elapsed without a complete frame")]
    Timeout,

    #[error("Deadline elapsed after discarding corrupt bytes: {0}")]
    Corrupt(FrameError),

    #[error("Channel closed")]
    Closed,

    #[error("Channel error: {0}")]
    Transport(TransportError),
}

impl ChannelError {
    /// Taxonomy error for a single unretried wait, such as a listen
    ///
    /// A timeout counts as exactly one attempt. Transactions build their
    /// outcome from the retry loop instead.
    pub fn into_listen_error(self) -> TransactionError {
        match self {
            Self::Timeout => TransactionError::Timeout { attempts: 1 },
            Self::Corrupt(reason) => TransactionError::InvalidMessage(reason),
            Self::Closed => TransactionError::ChannelFailure(ChannelFailure::Closed),
            Self::Transport(e) => TransactionError::ChannelFailure(e.into()),
        }
    }
}

/// Incremental frame reader
#[derive(Debug)]
pub struct ChannelReader {
    codec: FrameCodec,
    buffer: BytesMut,
    read_chunk: usize,
}

impl ChannelReader {
    /// Create a reader decoding with `codec`
    pub fn new(codec: FrameCodec) -> Self {
        Self {
            codec,
            buffer: BytesMut::with_capacity(READ_CHUNK * 2),
            read_chunk: READ_CHUNK,
        }
    }

    /// Bytes requested from the channel per read
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk.max(1);
        self
    }

    /// Codec in use
    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    /// Number of bytes buffered but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        if !self.buffer.is_empty() {
            debug!("Discarding {} stale bytes", self.buffer.len());
            self.buffer.clear();
        }
    }

    /// Decode every complete frame already buffered, then drop the rest
    pub fn take_buffered(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut corruption = None;

        while let Some(frame) = self.next_buffered(&mut corruption) {
            frames.push(frame);
        }
        self.clear();

        frames
    }

    /// Read until one frame resolves or `deadline` passes
    ///
    /// Already-buffered bytes are decoded before any I/O, and corrupt
    /// fragments are skipped without extra reads.
    pub async fn pump<C>(&mut self, channel: &mut C, deadline: Instant) -> Result<Frame, ChannelError>
    where
        C: Channel + ?Sized,
    {
        let mut corruption = None;

        loop {
            if let Some(frame) = self.next_buffered(&mut corruption) {
                trace!("Received: {:?}", frame);
                return Ok(frame);
            }

            if Instant::now() >= deadline {
                return Err(Self::expired(corruption));
            }

            match channel.read(self.read_chunk, deadline).await {
                Ok(bytes) => self.buffer.extend_from_slice(&bytes),
                Err(TransportError::ReadTimeout) => return Err(Self::expired(corruption)),
                Err(e) if e.is_closed() => return Err(ChannelError::Closed),
                Err(e) => return Err(ChannelError::Transport(e)),
            }
        }
    }

    /// Decode from the buffer alone, skipping corrupt prefixes
    fn next_buffered(&mut self, corruption: &mut Option<FrameError>) -> Option<Frame> {
        loop {
            match self.codec.decode(&self.buffer) {
                DecodeResult::Frame { frame, consumed } => {
                    self.buffer.advance(consumed);
                    return Some(frame);
                }
                DecodeResult::Corrupt { reason, discard } => {
                    match reason {
                        FrameError::MissingStartMarker { skipped }
                        | FrameError::FalseStart { skipped } => {
                            debug!("Skipping {} bytes of line noise", skipped)
                        }
                        _ => warn!("Discarding {} bytes: {}", discard, reason),
                    }
                    self.buffer.advance(discard);
                    *corruption = Some(reason);
                }
                DecodeResult::Incomplete => return None,
            }
        }
    }

    fn expired(corruption: Option<FrameError>) -> ChannelError {
        corruption.map_or(ChannelError::Timeout, ChannelError::Corrupt)
    }
}

impl Default for ChannelReader {
    fn default() -> Self {
        Self::new(FrameCodec::gnetplus())
    }
}
