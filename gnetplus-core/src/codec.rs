//! Frame encoding and incremental decoding

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{
    config::FrameConfig,
    error::{Error, FrameError, Result},
    frame::Frame,
};

/// Result of one decode attempt over a receive buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete, checksum-valid frame starting at offset 0
    Frame {
        frame: Frame,
        /// Bytes occupied by the frame; trailing bytes belong to later frames
        consumed: usize,
    },

    /// Buffer holds a plausible frame prefix; read more bytes
    Incomplete,

    /// Leading bytes cannot start a valid frame
    Corrupt {
        reason: FrameError,
        /// Bytes safe to drop before decoding again
        discard: usize,
    },
}

/// Encoder/decoder for one frame dialect
///
/// # Examples
///
/// ```
/// use gnetplus_core::{DecodeResult, FrameCodec, FrameConfig};
///
/// let codec = FrameCodec::new(FrameConfig::gnetplus()).unwrap();
/// let bytes = codec.encode(0x01, 0x22, &[0x00, 0x01]).unwrap();
/// assert_eq!(&bytes[..], &[0x01, 0x01, 0x22, 0x02, 0x00, 0x01, 0xB8, 0x73]);
///
/// match codec.decode(&bytes) {
///     DecodeResult::Frame { frame, consumed } => {
///         assert_eq!(frame.command, 0x22);
///         assert_eq!(consumed, bytes.len());
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    config: FrameConfig,
}

impl FrameCodec {
    /// Create a codec for a validated dialect
    pub fn new(config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Codec for the stock GNetPlus dialect
    pub fn gnetplus() -> Self {
        Self {
            config: FrameConfig::gnetplus(),
        }
    }

    /// Dialect in use
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Encode an (address, function, payload) triple
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload exceeds the
    /// dialect's maximum.
    pub fn encode(&self, address: u8, command: u8, payload: &[u8]) -> Result<BytesMut> {
        if payload.len() > self.config.max_payload {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload,
            });
        }

        let mut buf = BytesMut::with_capacity(self.config.frame_len(payload.len()));

        buf.put_u8(self.config.start_marker);
        buf.put_u8(address);
        buf.put_u8(command);
        self.config.length.order().put(
            &mut buf,
            payload.len() as u16,
            self.config.length.width(),
        );
        buf.put_slice(payload);

        // Everything after the start marker is covered
        let checksum = self.config.checksum.calculate(&buf[1..]);
        self.config
            .checksum_order
            .put(&mut buf, checksum, self.config.trailer_len());

        trace!("Encoded frame: {}", hex::encode_upper(&buf));

        Ok(buf)
    }

    /// Encode a [`Frame`]
    pub fn encode_frame(&self, frame: &Frame) -> Result<BytesMut> {
        self.encode(frame.address, frame.command, &frame.payload)
    }

    /// Decode the frame at the front of `buf`
    ///
    /// Never consumes anything itself: the caller advances its buffer by
    /// `consumed` or `discard` bytes.
    pub fn decode(&self, buf: &[u8]) -> DecodeResult {
        let marker = self.config.start_marker;

        let Some(start) = buf.iter().position(|&b| b == marker) else {
            if buf.is_empty() {
                return DecodeResult::Incomplete;
            }
            return DecodeResult::Corrupt {
                reason: FrameError::MissingStartMarker { skipped: buf.len() },
                discard: buf.len(),
            };
        };

        if start > 0 {
            return DecodeResult::Corrupt {
                reason: FrameError::MissingStartMarker { skipped: start },
                discard: start,
            };
        }

        match self.decode_front(buf) {
            // A stray marker byte must not hide a complete frame behind it
            DecodeResult::Incomplete => match self.complete_frame_after(buf) {
                Some(skipped) => DecodeResult::Corrupt {
                    reason: FrameError::FalseStart { skipped },
                    discard: skipped,
                },
                None => DecodeResult::Incomplete,
            },
            other => other,
        }
    }

    /// Decode a candidate frame whose start marker sits at index 0
    fn decode_front(&self, buf: &[u8]) -> DecodeResult {
        let header_len = self.config.header_len();
        if buf.len() < header_len {
            return DecodeResult::Incomplete;
        }

        let declared = usize::from(
            self.config
                .length
                .order()
                .get(&buf[3..], self.config.length.width()),
        );

        if declared > self.config.max_payload {
            return DecodeResult::Corrupt {
                reason: FrameError::LengthOutOfRange {
                    declared,
                    max: self.config.max_payload,
                },
                discard: self.resync_offset(buf),
            };
        }

        let total = self.config.frame_len(declared);
        if buf.len() < total {
            return DecodeResult::Incomplete;
        }

        let body_end = header_len + declared;
        let received = self
            .config
            .checksum_order
            .get(&buf[body_end..], self.config.trailer_len());
        let expected = self.config.checksum.calculate(&buf[1..body_end]);

        if expected != received {
            return DecodeResult::Corrupt {
                reason: FrameError::ChecksumMismatch { expected, received },
                discard: self.resync_offset(buf),
            };
        }

        DecodeResult::Frame {
            frame: Frame {
                address: buf[1],
                command: buf[2],
                payload: Bytes::copy_from_slice(&buf[header_len..body_end]),
            },
            consumed: total,
        }
    }

    /// Offset of the first later start marker opening a complete, valid frame
    fn complete_frame_after(&self, buf: &[u8]) -> Option<usize> {
        (1..buf.len())
            .filter(|&i| buf[i] == self.config.start_marker)
            .find(|&i| matches!(self.decode_front(&buf[i..]), DecodeResult::Frame { .. }))
    }

    /// Offset of the next start marker after a rejected one at index 0
    fn resync_offset(&self, buf: &[u8]) -> usize {
        buf[1..]
            .iter()
            .position(|&b| b == self.config.start_marker)
            .map_or(buf.len(), |i| i + 1)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::gnetplus()
    }
}
