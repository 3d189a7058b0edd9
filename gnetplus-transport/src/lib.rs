//! Byte channels for the GNetPlus protocol
//!
//! Provides serial and TCP (serial device server) links to readers, plus a
//! wrapper for any tokio stream.

pub mod error;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use error::{Error, Result};
pub use serial::{SerialChannel, SerialConfig};
pub use stream::StreamChannel;
pub use tcp::TcpChannel;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::time::Instant;

/// Duplex byte channel to a reader
///
/// The protocol only relies on byte order being preserved for bytes that do
/// arrive; delivery itself is not assumed.
#[async_trait]
pub trait Channel: Send {
    /// Open the underlying link
    async fn open(&mut self) -> Result<()>;

    /// Close the underlying link
    async fn close(&mut self) -> Result<()>;

    /// Check if open
    fn is_open(&self) -> bool;

    /// Write all of `data`, returning the byte count
    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read at most `max_bytes`, waiting no later than `deadline`
    ///
    /// Returns [`Error::ReadTimeout`] when the deadline passes without data
    /// and [`Error::ConnectionClosed`] at end of stream. Never returns an
    /// empty buffer.
    async fn read(&mut self, max_bytes: usize, deadline: Instant) -> Result<BytesMut>;

    /// Human-readable endpoint description
    fn describe(&self) -> String;
}

#[async_trait]
impl<C: Channel + ?Sized> Channel for Box<C> {
    async fn open(&mut self) -> Result<()> {
        (**self).open().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data).await
    }

    async fn read(&mut self, max_bytes: usize, deadline: Instant) -> Result<BytesMut> {
        (**self).read(max_bytes, deadline).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
