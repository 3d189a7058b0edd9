//! Transaction outcomes

use bytes::Bytes;
use gnetplus_core::FrameError;

use crate::error::{ChannelFailure, ErrorKind, Nak, TransactionError};

/// Protocol-level failure after the retry budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Last attempt ended on a malformed or uncorrelated frame
    InvalidMessage(FrameError),

    /// No frame resolved any attempt
    Timeout {
        attempts: u32,
    },
}

/// Result of one [`execute`](crate::TransactionEngine::execute) call
///
/// Expected failures are values, not errors; callers pattern-match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Device answered with the expected reply code
    Success(Bytes),

    /// Device answered NAK
    DeviceRejected(Nak),

    /// Framing or timeout failure
    ProtocolError(ProtocolError),

    /// Byte stream failure
    ChannelFailure(ChannelFailure),
}

impl Outcome {
    /// Check if the device accepted the command
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure class, `None` on success
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::DeviceRejected(_) => Some(ErrorKind::NegativeAcknowledge),
            Self::ProtocolError(ProtocolError::InvalidMessage(_)) => Some(ErrorKind::InvalidMessage),
            Self::ProtocolError(ProtocolError::Timeout { .. }) => Some(ErrorKind::Timeout),
            Self::ChannelFailure(_) => Some(ErrorKind::ChannelFailure),
        }
    }

    /// Convert to a `Result` over the failure taxonomy
    pub fn into_result(self) -> std::result::Result<Bytes, TransactionError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::DeviceRejected(nak) => Err(TransactionError::NegativeAcknowledge(nak)),
            Self::ProtocolError(ProtocolError::InvalidMessage(reason)) => {
                Err(TransactionError::InvalidMessage(reason))
            }
            Self::ProtocolError(ProtocolError::Timeout { attempts }) => {
                Err(TransactionError::Timeout { attempts })
            }
            Self::ChannelFailure(failure) => Err(TransactionError::ChannelFailure(failure)),
        }
    }
}
