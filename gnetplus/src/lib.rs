//! # gnetplus
//!
//! Async Rust driver for card readers speaking the GNetPlus serial protocol.
//!
//! ## Features
//!
//! - Frame codec with resynchronization after line noise
//! - Request/response engine with per-attempt deadlines and bounded retries
//! - Typed outcomes: success, device NAK, protocol error, channel failure
//! - Serial, TCP and in-memory channels
//!
//! ## Quick Start
//!
//! ```no_run
//! use gnetplus::Device;
//!
//! #[tokio::main]
//! async fn main() -> gnetplus::Result<()> {
//!     let mut device = Device::serial("/dev/ttyUSB0");
//!     device.connect().await?;
//!
//!     let info = device.get_device_info().await?;
//!     println!("{}", info);
//!
//!     device.disconnect().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Lower-level control goes through [`TransactionEngine`]:
//!
//! ```no_run
//! use gnetplus::{Channel, Outcome, SerialChannel, SerialConfig, TransactionEngine, TransactionPolicy};
//!
//! # async fn run() -> gnetplus::Result<()> {
//! let mut channel = SerialChannel::new(SerialConfig::new("/dev/ttyUSB0"));
//! channel.open().await?;
//!
//! let mut engine = TransactionEngine::new(channel);
//! match engine.execute(0x00, 0x22, &[0x00, 0x01], &TransactionPolicy::default()).await? {
//!     Outcome::Success(payload) => println!("ACK {:02X?}", payload),
//!     Outcome::DeviceRejected(nak) => println!("NAK: {}", nak),
//!     other => println!("Failed: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod policy;
pub mod reader;

#[cfg(test)]
mod testing;

// Re-exports
pub use device::Device;
pub use engine::{SharedEngine, TransactionEngine};
pub use error::{ChannelFailure, Error, ErrorKind, Nak, Result, TransactionError};
pub use outcome::{Outcome, ProtocolError};
pub use policy::{RetryOn, TransactionPolicy};
pub use reader::{ChannelError, ChannelReader};

// Re-export protocol and transport types
pub use gnetplus_core::{Frame, FrameCodec, FrameConfig, Function, Reply};
pub use gnetplus_transport::{Channel, SerialChannel, SerialConfig, StreamChannel, TcpChannel};
pub use gnetplus_types::{CardUid, DeviceInfo};
