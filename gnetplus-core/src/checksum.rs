//! Frame checksum algorithms
//!
//! GNetPlus readers protect every frame with a CRC-16/MODBUS computed over
//! the address, function, length and payload bytes (the start marker is not
//! covered). Some OEM firmwares use a single-byte XOR or additive sum instead,
//! so the algorithm is selected per dialect through [`ChecksumKind`].

use tracing::trace;

/// Checksum algorithm used by a frame dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumKind {
    /// CRC-16/MODBUS: reflected polynomial 0xA001, initial value 0xFFFF
    Crc16Modbus,

    /// XOR of all covered bytes
    Xor8,

    /// Sum of all covered bytes, modulo 256
    Sum8,
}

impl ChecksumKind {
    /// Number of bytes the checksum occupies on the wire
    pub const fn width(self) -> usize {
        match self {
            Self::Crc16Modbus => 2,
            Self::Xor8 | Self::Sum8 => 1,
        }
    }

    /// Calculate the checksum over `data`
    ///
    /// Single-byte algorithms return their value in the low byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use gnetplus_core::checksum::ChecksumKind;
    ///
    /// let crc = ChecksumKind::Crc16Modbus.calculate(b"123456789");
    /// assert_eq!(crc, 0x4B37);
    /// ```
    pub fn calculate(self, data: &[u8]) -> u16 {
        let checksum = match self {
            Self::Crc16Modbus => crc16_modbus(data),
            Self::Xor8 => u16::from(xor8(data)),
            Self::Sum8 => u16::from(sum8(data)),
        };

        trace!(
            algorithm = ?self,
            len = data.len(),
            checksum = format!("0x{:04X}", checksum),
            "Calculated checksum"
        );

        checksum
    }

    /// Verify `expected` against the checksum of `data`
    pub fn verify(self, data: &[u8], expected: u16) -> bool {
        self.calculate(data) == expected
    }
}

/// CRC-16/MODBUS
pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Longitudinal XOR
pub fn xor8(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, &b| acc ^ b)
}

/// Additive checksum, wrapping at 256
pub fn sum8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_check_value() {
        // Standard CRC-16/MODBUS check value
        assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_crc16_empty() {
        assert_eq!(crc16_modbus(&[]), 0xFFFF);
    }

    #[test]
    fn test_crc16_frame_body() {
        // address=0x01, function=0x22, len=2, payload=[0x00, 0x01]
        assert_eq!(crc16_modbus(&[0x01, 0x22, 0x02, 0x00, 0x01]), 0xB873);
    }

    #[test]
    fn test_xor8() {
        assert_eq!(xor8(&[0x01, 0x22, 0x02, 0x00, 0x01]), 0x20);
        assert_eq!(xor8(&[]), 0);
    }

    #[test]
    fn test_sum8_wraps() {
        assert_eq!(sum8(&[0x01, 0x22, 0x02, 0x00, 0x01]), 0x26);
        assert_eq!(sum8(&[0xFF, 0x02]), 0x01);
    }

    #[test]
    fn test_widths() {
        assert_eq!(ChecksumKind::Crc16Modbus.width(), 2);
        assert_eq!(ChecksumKind::Xor8.width(), 1);
        assert_eq!(ChecksumKind::Sum8.width(), 1);
    }

    #[test]
    fn test_verify() {
        let data = [0xAB, 0xCD];
        let checksum = ChecksumKind::Crc16Modbus.calculate(&data);

        assert!(ChecksumKind::Crc16Modbus.verify(&data, checksum));
        assert!(!ChecksumKind::Crc16Modbus.verify(&data, checksum.wrapping_add(1)));
    }

    #[test]
    fn test_different_bodies_differ() {
        let cs1 = ChecksumKind::Crc16Modbus.calculate(&[0x00, 0x01, 0x00]);
        let cs2 = ChecksumKind::Crc16Modbus.calculate(&[0x00, 0x02, 0x00]);

        assert_ne!(cs1, cs2);
    }
}
