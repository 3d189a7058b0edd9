//! Reader information structures

use std::fmt;

/// Reader information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Bus address the reader answered from
    pub address: u8,

    /// Firmware version string
    pub firmware_version: String,

    /// Reader serial number, if queried
    pub serial_number: Option<String>,
}

impl DeviceInfo {
    pub fn new(address: u8, firmware_version: String) -> Self {
        Self {
            address,
            firmware_version,
            serial_number: None,
        }
    }

    /// Attach a serial number
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reader[addr: 0x{:02X}, FW: {}",
            self.address, self.firmware_version
        )?;
        if let Some(serial) = &self.serial_number {
            write!(f, ", SN: {}", serial)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let info = DeviceInfo::new(0x01, "GNetPlus 2.1".into());
        assert_eq!(info.to_string(), "Reader[addr: 0x01, FW: GNetPlus 2.1]");

        let info = info.with_serial_number("A1B2");
        assert_eq!(info.to_string(), "Reader[addr: 0x01, FW: GNetPlus 2.1, SN: A1B2]");
    }
}
