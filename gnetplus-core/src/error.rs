//! Error types for gnetplus-core

/// Result type alias for gnetplus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Payload does not fit the dialect's length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Frame dialect is internally inconsistent
    #[error("Invalid frame configuration: {0}")]
    InvalidConfig(String),

    /// Unknown function code
    #[error("Unknown function code: 0x{0:02X}")]
    UnknownFunction(u8),
}

/// Reason a candidate frame was rejected by the decoder
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Leading bytes before (or instead of) a start marker
    #[error("No start marker: {skipped} leading bytes skipped")]
    MissingStartMarker {
        skipped: usize,
    },

    /// Marker byte at the front opened no frame; a complete one starts later
    #[error("False start: complete frame found after {skipped} bytes")]
    FalseStart {
        skipped: usize,
    },

    /// Declared length exceeds the dialect maximum
    #[error("Declared length {declared} exceeds maximum {max}")]
    LengthOutOfRange {
        declared: usize,
        max: usize,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },

    /// Well-formed frame that does not answer the outstanding request
    #[error("Unexpected reply: address 0x{address:02X}, function 0x{command:02X}")]
    UnexpectedReply {
        address: u8,
        command: u8,
    },
}
