//! GNetPlus function code definitions
//!
//! Host-to-reader and reader-to-host frames share the one-byte function
//! field but use separate code spaces (0x06 is `CLASS_NAME` on the way in and
//! `ACK` on the way out), so the two directions get separate enums.

use std::fmt;

use crate::constants::reply;
use crate::error::{Error, Result};

/// Request function codes (host to reader)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Function {
    // Reader management
    Polling = 0x00,
    GetVersion = 0x01,
    SetSlaveAddr = 0x02,
    Logon = 0x03,
    Logoff = 0x04,
    SetPassword = 0x05,
    ClassName = 0x06,
    SetDateTime = 0x07,
    GetDateTime = 0x08,
    GetRegister = 0x09,
    SetRegister = 0x0A,

    // Record store
    RecordCount = 0x0B,
    GetFirstRecord = 0x0C,
    GetNextRecord = 0x0D,
    EraseAllRecords = 0x0E,
    AddRecord = 0x0F,
    RecoverAllRecords = 0x10,

    // I/O and housekeeping
    DigitalOutput = 0x11,
    DigitalInput = 0x12,
    AnalogInput = 0x13,
    Thermometer = 0x14,
    GetNode = 0x15,
    GetSn = 0x16,
    SilentMode = 0x17,
    Reserve = 0x18,
    EnableAutoMode = 0x19,
    GetTimeAdjust = 0x1A,
    Echo = 0x1B,
    SetTimeAdjust = 0x1C,
    Debug = 0x1D,
    Reset = 0x1E,
    GoToIsp = 0x1F,

    // MIFARE card operations
    Request = 0x20,
    AntiCollision = 0x21,
    SelectCard = 0x22,
    Authenticate = 0x23,
    ReadBlock = 0x24,
    WriteBlock = 0x25,
    SetValue = 0x26,
    ReadValue = 0x27,
    CreateValueBlock = 0x28,
    AccessCondition = 0x29,
    Halt = 0x2A,
    SaveKey = 0x2B,
    GetSecondSn = 0x2C,
    GetAccessCondition = 0x2D,
    AuthenticateKey = 0x2E,
    RequestAll = 0x2F,
    SetValueEx = 0x32,
    Transfer = 0x33,
    Restore = 0x34,
    GetSector = 0x3D,
    RfPowerOnOff = 0x3E,
    AutoMode = 0x3F,
}

impl Function {
    /// Check if this function addresses a card in the RF field
    pub fn is_card_operation(self) -> bool {
        (self as u8) >= 0x20
    }

    /// Get function name
    pub fn name(self) -> &'static str {
        match self {
            Self::Polling => "POLLING",
            Self::GetVersion => "GET_VERSION",
            Self::SetSlaveAddr => "SET_SLAVE_ADDR",
            Self::Logon => "LOGON",
            Self::Logoff => "LOGOFF",
            Self::SetPassword => "SET_PASSWORD",
            Self::ClassName => "CLASSNAME",
            Self::SetDateTime => "SET_DATETIME",
            Self::GetDateTime => "GET_DATETIME",
            Self::GetRegister => "GET_REGISTER",
            Self::SetRegister => "SET_REGISTER",
            Self::RecordCount => "RECORD_COUNT",
            Self::GetFirstRecord => "GET_FIRST_RECORD",
            Self::GetNextRecord => "GET_NEXT_RECORD",
            Self::EraseAllRecords => "ERASE_ALL_RECORDS",
            Self::AddRecord => "ADD_RECORD",
            Self::RecoverAllRecords => "RECOVER_ALL_RECORDS",
            Self::DigitalOutput => "DO",
            Self::DigitalInput => "DI",
            Self::AnalogInput => "ANALOG_INPUT",
            Self::Thermometer => "THERMOMETER",
            Self::GetNode => "GET_NODE",
            Self::GetSn => "GET_SN",
            Self::SilentMode => "SILENT_MODE",
            Self::Reserve => "RESERVE",
            Self::EnableAutoMode => "ENABLE_AUTO_MODE",
            Self::GetTimeAdjust => "GET_TIME_ADJUST",
            Self::Echo => "ECHO",
            Self::SetTimeAdjust => "SET_TIME_ADJUST",
            Self::Debug => "DEBUG",
            Self::Reset => "RESET",
            Self::GoToIsp => "GO_TO_ISP",
            Self::Request => "REQUEST",
            Self::AntiCollision => "ANTI_COLLISION",
            Self::SelectCard => "SELECT_CARD",
            Self::Authenticate => "AUTHENTICATE",
            Self::ReadBlock => "READ_BLOCK",
            Self::WriteBlock => "WRITE_BLOCK",
            Self::SetValue => "SET_VALUE",
            Self::ReadValue => "READ_VALUE",
            Self::CreateValueBlock => "CREATE_VALUE_BLOCK",
            Self::AccessCondition => "ACCESS_CONDITION",
            Self::Halt => "HALT",
            Self::SaveKey => "SAVE_KEY",
            Self::GetSecondSn => "GET_SECOND_SN",
            Self::GetAccessCondition => "GET_ACCESS_CONDITION",
            Self::AuthenticateKey => "AUTHENTICATE_KEY",
            Self::RequestAll => "REQUEST_ALL",
            Self::SetValueEx => "SET_VALUEEX",
            Self::Transfer => "TRANSFER",
            Self::Restore => "RESTORE",
            Self::GetSector => "GET_SECTOR",
            Self::RfPowerOnOff => "RF_POWER_ONOFF",
            Self::AutoMode => "AUTO_MODE",
        }
    }
}

impl From<Function> for u8 {
    fn from(function: Function) -> u8 {
        function as u8
    }
}

impl TryFrom<u8> for Function {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Polling),
            0x01 => Ok(Self::GetVersion),
            0x02 => Ok(Self::SetSlaveAddr),
            0x03 => Ok(Self::Logon),
            0x04 => Ok(Self::Logoff),
            0x05 => Ok(Self::SetPassword),
            0x06 => Ok(Self::ClassName),
            0x07 => Ok(Self::SetDateTime),
            0x08 => Ok(Self::GetDateTime),
            0x09 => Ok(Self::GetRegister),
            0x0A => Ok(Self::SetRegister),
            0x0B => Ok(Self::RecordCount),
            0x0C => Ok(Self::GetFirstRecord),
            0x0D => Ok(Self::GetNextRecord),
            0x0E => Ok(Self::EraseAllRecords),
            0x0F => Ok(Self::AddRecord),
            0x10 => Ok(Self::RecoverAllRecords),
            0x11 => Ok(Self::DigitalOutput),
            0x12 => Ok(Self::DigitalInput),
            0x13 => Ok(Self::AnalogInput),
            0x14 => Ok(Self::Thermometer),
            0x15 => Ok(Self::GetNode),
            0x16 => Ok(Self::GetSn),
            0x17 => Ok(Self::SilentMode),
            0x18 => Ok(Self::Reserve),
            0x19 => Ok(Self::EnableAutoMode),
            0x1A => Ok(Self::GetTimeAdjust),
            0x1B => Ok(Self::Echo),
            0x1C => Ok(Self::SetTimeAdjust),
            0x1D => Ok(Self::Debug),
            0x1E => Ok(Self::Reset),
            0x1F => Ok(Self::GoToIsp),
            0x20 => Ok(Self::Request),
            0x21 => Ok(Self::AntiCollision),
            0x22 => Ok(Self::SelectCard),
            0x23 => Ok(Self::Authenticate),
            0x24 => Ok(Self::ReadBlock),
            0x25 => Ok(Self::WriteBlock),
            0x26 => Ok(Self::SetValue),
            0x27 => Ok(Self::ReadValue),
            0x28 => Ok(Self::CreateValueBlock),
            0x29 => Ok(Self::AccessCondition),
            0x2A => Ok(Self::Halt),
            0x2B => Ok(Self::SaveKey),
            0x2C => Ok(Self::GetSecondSn),
            0x2D => Ok(Self::GetAccessCondition),
            0x2E => Ok(Self::AuthenticateKey),
            0x2F => Ok(Self::RequestAll),
            0x32 => Ok(Self::SetValueEx),
            0x33 => Ok(Self::Transfer),
            0x34 => Ok(Self::Restore),
            0x3D => Ok(Self::GetSector),
            0x3E => Ok(Self::RfPowerOnOff),
            0x3F => Ok(Self::AutoMode),
            _ => Err(Error::UnknownFunction(value)),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Reply function codes (reader to host)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reply {
    Ack = reply::ACK,
    Nak = reply::NAK,
    Event = reply::EVN,
}

impl Reply {
    /// Get reply name
    pub fn name(self) -> &'static str {
        match self {
            Self::Ack => "ACK",
            Self::Nak => "NAK",
            Self::Event => "EVN",
        }
    }
}

impl From<Reply> for u8 {
    fn from(reply: Reply) -> u8 {
        reply as u8
    }
}

impl TryFrom<u8> for Reply {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            reply::ACK => Ok(Self::Ack),
            reply::NAK => Ok(Self::Nak),
            reply::EVN => Ok(Self::Event),
            _ => Err(Error::UnknownFunction(value)),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_conversion() {
        assert_eq!(u8::from(Function::SelectCard), 0x22);
        assert_eq!(Function::try_from(0x22).unwrap(), Function::SelectCard);
    }

    #[test]
    fn test_function_round_trip_all_known() {
        for code in 0x00..=0x3F_u8 {
            if let Ok(function) = Function::try_from(code) {
                assert_eq!(u8::from(function), code);
            }
        }
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            Function::try_from(0x30),
            Err(Error::UnknownFunction(0x30))
        ));
    }

    #[test]
    fn test_is_card_operation() {
        assert!(Function::Request.is_card_operation());
        assert!(Function::AutoMode.is_card_operation());
        assert!(!Function::GetVersion.is_card_operation());
    }

    #[test]
    fn test_reply_codes_overlap_request_space() {
        // Same wire byte, different direction
        assert_eq!(u8::from(Reply::Ack), u8::from(Function::ClassName));
        assert_eq!(Reply::try_from(0x15).unwrap(), Reply::Nak);
        assert_eq!(Function::try_from(0x15).unwrap(), Function::GetNode);
    }

    #[test]
    fn test_display() {
        assert_eq!(Function::GetVersion.to_string(), "GET_VERSION(0x01)");
        assert_eq!(Reply::Nak.to_string(), "NAK(0x15)");
    }
}
