//! GNetPlus frame structure

use bytes::Bytes;
use std::fmt;

use crate::{
    command::{Function, Reply},
    constants::reply,
    error::Result,
};

/// One protocol message unit
///
/// A frame carries the device address, a one-byte function code and an
/// opaque payload. Start marker, length and checksum are produced and
/// checked by [`FrameCodec`](crate::FrameCodec) and never stored here.
///
/// # Examples
///
/// ```
/// use gnetplus_core::{Frame, Function};
///
/// let frame = Frame::with_payload(0x01, Function::SelectCard.into(), vec![0x00, 0x01]);
/// assert_eq!(frame.function().unwrap(), Function::SelectCard);
/// assert_eq!(frame.payload.len(), 2);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Reader address
    pub address: u8,

    /// Function code
    pub command: u8,

    /// Function-specific data
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame with empty payload
    pub fn new(address: u8, command: u8) -> Self {
        Self {
            address,
            command,
            payload: Bytes::new(),
        }
    }

    /// Create a frame with payload
    pub fn with_payload(address: u8, command: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            address,
            command,
            payload: payload.into(),
        }
    }

    /// Interpret the command byte as a request function
    pub fn function(&self) -> Result<Function> {
        Function::try_from(self.command)
    }

    /// Interpret the command byte as a reply code
    pub fn reply(&self) -> Result<Reply> {
        Reply::try_from(self.command)
    }

    /// Check if this is a positive acknowledge
    pub fn is_ack(&self) -> bool {
        self.command == reply::ACK
    }

    /// Check if this is a negative acknowledge
    pub fn is_nak(&self) -> bool {
        self.command == reply::NAK
    }

    /// Check if this is an unsolicited event
    pub fn is_event(&self) -> bool {
        self.command == reply::EVN
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("address", &format!("0x{:02X}", self.address))
            .field("command", &format!("0x{:02X}", self.command))
            .field("payload", &hex::encode_upper(&self.payload))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[0x{:02X}](address={}, len={})",
            self.command,
            self.address,
            self.payload.len()
        )
    }
}
