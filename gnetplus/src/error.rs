//! Error types
//!
//! [`TransactionError`] is the four-way failure vocabulary shared by the
//! engine and its callers. [`Error`] wraps it together with the lower crates'
//! errors for the high-level [`Device`](crate::Device) API.

use std::fmt;

use bytes::Bytes;
use gnetplus_core::{Frame, FrameError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] gnetplus_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] gnetplus_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] gnetplus_types::Error),

    #[error("Transaction failed: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Device not connected")]
    NotConnected,

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Taxonomy kind, when the error came out of a transaction
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Transaction(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Failure class of a completed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structurally malformed or uncorrelated frame
    InvalidMessage,

    /// Device explicitly rejected the command
    NegativeAcknowledge,

    /// No valid frame within the attempt/retry budget
    Timeout,

    /// Byte stream failed or closed
    ChannelFailure,
}

/// Terminal transaction failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid message: {0}")]
    InvalidMessage(FrameError),

    #[error("Negative acknowledge: {0}")]
    NegativeAcknowledge(Nak),

    #[error("No valid response after {attempts} attempt(s)")]
    Timeout {
        attempts: u32,
    },

    #[error("Channel failure: {0}")]
    ChannelFailure(ChannelFailure),
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMessage(_) => ErrorKind::InvalidMessage,
            Self::NegativeAcknowledge(_) => ErrorKind::NegativeAcknowledge,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ChannelFailure(_) => ErrorKind::ChannelFailure,
        }
    }
}

/// Negative acknowledge as sent by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nak {
    /// Address of the rejecting reader
    pub address: u8,

    /// Reason code (first payload byte), if any
    pub code: Option<u8>,

    /// Full NAK payload
    pub payload: Bytes,
}

impl From<Frame> for Nak {
    fn from(frame: Frame) -> Self {
        Self {
            address: frame.address,
            code: frame.payload.first().copied(),
            payload: frame.payload,
        }
    }
}

impl fmt::Display for Nak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "reader 0x{:02X} rejected with code 0x{:02X}", self.address, code),
            None => write!(f, "reader 0x{:02X} rejected without reason", self.address),
        }
    }
}

/// Channel-level failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelFailure {
    #[error("channel closed")]
    Closed,

    #[error("{0}")]
    Io(String),
}

impl From<gnetplus_transport::Error> for ChannelFailure {
    fn from(error: gnetplus_transport::Error) -> Self {
        if error.is_closed() {
            Self::Closed
        } else {
            Self::Io(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nak_from_frame() {
        let nak = Nak::from(Frame::with_payload(0x02, 0x15, vec![0x03, 0xFF]));

        assert_eq!(nak.address, 0x02);
        assert_eq!(nak.code, Some(0x03));
        assert_eq!(nak.payload.as_ref(), &[0x03, 0xFF]);
        assert_eq!(nak.to_string(), "reader 0x02 rejected with code 0x03");
    }

    #[test]
    fn test_nak_without_payload() {
        let nak = Nak::from(Frame::new(0x00, 0x15));
        assert_eq!(nak.code, None);
    }

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            TransactionError::InvalidMessage(FrameError::MissingStartMarker { skipped: 1 }),
            TransactionError::NegativeAcknowledge(Nak::from(Frame::new(0, 0x15))),
            TransactionError::Timeout { attempts: 1 },
            TransactionError::ChannelFailure(ChannelFailure::Closed),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();

        assert_eq!(kinds.len(), 4);
    }

    #[test]
    fn test_channel_failure_from_transport() {
        assert_eq!(
            ChannelFailure::from(gnetplus_transport::Error::ConnectionClosed),
            ChannelFailure::Closed
        );
        assert!(matches!(
            ChannelFailure::from(gnetplus_transport::Error::InvalidAddress("x".into())),
            ChannelFailure::Io(_)
        ));
    }

    #[test]
    fn test_error_kind_passthrough() {
        let error = Error::from(TransactionError::Timeout { attempts: 3 });
        assert_eq!(error.kind(), Some(ErrorKind::Timeout));
        assert_eq!(Error::NotConnected.kind(), None);
    }
}
