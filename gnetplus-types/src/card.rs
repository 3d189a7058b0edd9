//! Card identifiers

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Card unique identifier as reported by the reader
///
/// MIFARE cards carry 4-, 7- or 10-byte UIDs. Displayed as uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardUid(Vec<u8>);

impl CardUid {
    /// Longest UID defined for ISO 14443-A (triple size)
    pub const MAX_LEN: usize = 10;

    /// Build from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        if bytes.is_empty() || bytes.len() > Self::MAX_LEN {
            return Err(Error::Validation(format!(
                "UID length {} outside 1..={}",
                bytes.len(),
                Self::MAX_LEN
            )));
        }

        Ok(Self(bytes))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UID as an unsigned integer, most significant byte first
    pub fn to_u128(&self) -> u128 {
        self.0.iter().fold(0u128, |acc, &b| (acc << 8) | u128::from(b))
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s.chars().filter(|c| !matches!(c, ':' | ' ' | '-')).collect();
        let bytes = hex::decode(&cleaned).map_err(|e| Error::Parse(format!("{}: {}", s, e)))?;
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for CardUid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
