//! Protocol constants

/// Start-of-header marker opening every GNetPlus frame
pub const SOH: u8 = 0x01;

/// Broadcast / default reader address
pub const DEFAULT_ADDRESS: u8 = 0x00;

/// Largest payload expressible with a one-byte length field
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Default per-attempt response deadline (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default retry count after the initial attempt
pub const MAX_RETRIES: u32 = 3;

/// Default serial line speed of GNetPlus readers
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Default read chunk requested from the channel per pump iteration
pub const READ_CHUNK: usize = 256;

/// Reply function codes
pub mod reply {
    /// Positive acknowledge
    pub const ACK: u8 = 0x06;

    /// Negative acknowledge
    pub const NAK: u8 = 0x15;

    /// Unsolicited event (auto mode)
    pub const EVN: u8 = 0x12;
}

/// Auto-mode event payload markers
pub mod events {
    /// Card entered the RF field
    pub const CARD_IN: u8 = b'I';

    /// Card left the RF field
    pub const CARD_OUT: u8 = b'O';
}

/// Card request modes (payload of the REQUEST function)
pub mod request {
    /// Wake every card in the field, halted ones included
    pub const ALL: u8 = 0x52;

    /// Wake idle cards only
    pub const IDLE: u8 = 0x26;
}
