//! Type definitions for gnetplus

pub mod card;
pub mod device_info;
pub mod error;

pub use card::CardUid;
pub use device_info::DeviceInfo;
pub use error::{Error, Result};
