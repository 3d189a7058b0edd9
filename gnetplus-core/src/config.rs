//! Frame dialect configuration
//!
//! Every literal the codec depends on (start marker, length width, checksum
//! algorithm) lives in one immutable [`FrameConfig`], so several dialects can
//! be used side by side in one process.

use crate::checksum::ChecksumKind;
use crate::constants::{MAX_PAYLOAD, SOH};
use crate::error::{Error, Result};

/// Byte order of multi-byte wire fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Write the low `width` bytes of `value` in this order
    pub(crate) fn put(self, buf: &mut impl bytes::BufMut, value: u16, width: usize) {
        match (width, self) {
            (1, _) => buf.put_u8(value as u8),
            (_, Self::Big) => buf.put_u16(value),
            (_, Self::Little) => buf.put_u16_le(value),
        }
    }

    /// Read a `width`-byte field from the front of `bytes`
    pub(crate) fn get(self, bytes: &[u8], width: usize) -> u16 {
        match (width, self) {
            (1, _) => u16::from(bytes[0]),
            (_, Self::Big) => u16::from_be_bytes([bytes[0], bytes[1]]),
            (_, Self::Little) => u16::from_le_bytes([bytes[0], bytes[1]]),
        }
    }
}

/// Width of the length field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthField {
    /// One byte
    U8,

    /// Two bytes in the given order
    U16(ByteOrder),
}

impl LengthField {
    /// Field width in bytes
    pub const fn width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16(_) => 2,
        }
    }

    /// Largest length the field can carry
    pub const fn capacity(self) -> usize {
        match self {
            Self::U8 => u8::MAX as usize,
            Self::U16(_) => u16::MAX as usize,
        }
    }

    pub(crate) fn order(self) -> ByteOrder {
        match self {
            Self::U8 => ByteOrder::Big,
            Self::U16(order) => order,
        }
    }
}

/// Frame dialect
///
/// # Wire layout
///
/// ```text
/// ┌───────┬─────────┬──────────┬──────────┬───────────┬──────────┐
/// │ Start │ Address │ Function │  Length  │  Payload  │ Checksum │
/// │ 1 B   │  1 B    │   1 B    │  1-2 B   │  N bytes  │  1-2 B   │
/// └───────┴─────────┴──────────┴──────────┴───────────┴──────────┘
/// ```
///
/// The checksum covers address, function, length and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameConfig {
    /// Byte opening every frame
    pub start_marker: u8,

    /// Length field layout
    pub length: LengthField,

    /// Checksum algorithm
    pub checksum: ChecksumKind,

    /// Byte order of a two-byte checksum
    pub checksum_order: ByteOrder,

    /// Largest payload accepted on encode and decode
    pub max_payload: usize,
}

impl FrameConfig {
    /// Stock GNetPlus dialect: SOH, 1-byte length, big-endian CRC-16/MODBUS
    pub const fn gnetplus() -> Self {
        Self {
            start_marker: SOH,
            length: LengthField::U8,
            checksum: ChecksumKind::Crc16Modbus,
            checksum_order: ByteOrder::Big,
            max_payload: MAX_PAYLOAD,
        }
    }

    /// Set start marker
    pub fn with_start_marker(mut self, marker: u8) -> Self {
        self.start_marker = marker;
        self
    }

    /// Set length field layout
    ///
    /// The maximum payload is clamped to the new field's capacity.
    pub fn with_length(mut self, length: LengthField) -> Self {
        self.length = length;
        self.max_payload = self.max_payload.min(length.capacity());
        self
    }

    /// Set checksum algorithm
    pub fn with_checksum(mut self, checksum: ChecksumKind) -> Self {
        self.checksum = checksum;
        self
    }

    /// Set checksum byte order
    pub fn with_checksum_order(mut self, order: ByteOrder) -> Self {
        self.checksum_order = order;
        self
    }

    /// Set maximum payload size
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Check that the dialect can represent its own maximum frame
    pub fn validate(&self) -> Result<()> {
        if self.max_payload > self.length.capacity() {
            return Err(Error::InvalidConfig(format!(
                "max payload {} exceeds length field capacity {}",
                self.max_payload,
                self.length.capacity()
            )));
        }

        Ok(())
    }

    /// Bytes before the payload: start, address, function, length
    pub const fn header_len(&self) -> usize {
        3 + self.length.width()
    }

    /// Bytes after the payload
    pub const fn trailer_len(&self) -> usize {
        self.checksum.width()
    }

    /// Total frame size for a payload of `payload_len` bytes
    pub const fn frame_len(&self, payload_len: usize) -> usize {
        self.header_len() + payload_len + self.trailer_len()
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::gnetplus()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gnetplus_layout() {
        let config = FrameConfig::gnetplus();

        assert_eq!(config.header_len(), 4);
        assert_eq!(config.trailer_len(), 2);
        assert_eq!(config.frame_len(2), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_payload_exceeds_field() {
        let config = FrameConfig::gnetplus().with_max_payload(300);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_wide_length_field() {
        let config = FrameConfig::gnetplus()
            .with_length(LengthField::U16(ByteOrder::Little))
            .with_max_payload(1024);

        assert_eq!(config.header_len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_narrowing_length_clamps_max() {
        let config = FrameConfig::gnetplus()
            .with_length(LengthField::U16(ByteOrder::Big))
            .with_max_payload(1024)
            .with_length(LengthField::U8);

        assert_eq!(config.max_payload, 255);
    }

    #[test]
    fn test_byte_order_field_access() {
        let mut buf = Vec::new();
        ByteOrder::Little.put(&mut buf, 0x1234, 2);
        ByteOrder::Big.put(&mut buf, 0x1234, 2);
        ByteOrder::Big.put(&mut buf, 0x0056, 1);

        assert_eq!(buf, vec![0x34, 0x12, 0x12, 0x34, 0x56]);
        assert_eq!(ByteOrder::Little.get(&buf[0..], 2), 0x1234);
        assert_eq!(ByteOrder::Big.get(&buf[2..], 2), 0x1234);
        assert_eq!(ByteOrder::Big.get(&buf[4..], 1), 0x0056);
    }
}
