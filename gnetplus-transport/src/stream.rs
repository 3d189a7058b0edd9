//! Channel over any tokio byte stream

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use crate::{error::*, Channel};

/// Read up to `max_bytes` from `stream` before `deadline`
pub(crate) async fn read_before<S>(stream: &mut S, max_bytes: usize, deadline: Instant) -> Result<BytesMut>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; max_bytes.max(1)];

    let n = timeout_at(deadline, stream.read(&mut buf))
        .await
        .map_err(|_| Error::ReadTimeout)?
        .map_err(Error::Io)?;

    if n == 0 {
        return Err(Error::ConnectionClosed);
    }

    trace!("Received {} bytes: {:02X?}", n, &buf[..n.min(32)]);

    Ok(BytesMut::from(&buf[..n]))
}

/// Write all of `data` to `stream` and flush
pub(crate) async fn write_all<S>(stream: &mut S, data: &[u8]) -> Result<usize>
where
    S: AsyncWrite + Unpin,
{
    trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(32)]);

    stream.write_all(data).await?;
    stream.flush().await?;

    Ok(data.len())
}

/// Channel wrapping an already-connected stream
///
/// Useful for pipes, USB CDC devices opened elsewhere, and in-memory
/// `tokio::io::duplex` pairs.
pub struct StreamChannel<S> {
    stream: Option<S>,
    label: String,
}

impl<S> StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap `stream`; it is considered open immediately
    pub fn new(stream: S, label: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            label: label.into(),
        }
    }

    /// Take back the inner stream
    pub fn into_inner(self) -> Option<S> {
        self.stream
    }
}

#[async_trait]
impl<S> Channel for StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn open(&mut self) -> Result<()> {
        // A wrapped stream cannot be re-established once dropped
        if self.stream.is_some() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}", self.label);
            let _ = stream.shutdown().await;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        write_all(stream, data).await
    }

    async fn read(&mut self, max_bytes: usize, deadline: Instant) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        read_before(stream, max_bytes, deadline).await
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_stream_round_trip() {
        let (near, mut far) = duplex(64);
        let mut channel = StreamChannel::new(near, "duplex");

        assert!(channel.is_open());
        assert_eq!(channel.write(&[1, 2, 3]).await.unwrap(), 3);

        let mut got = [0u8; 3];
        far.read_exact(&mut got).await.unwrap();
        assert_eq!(got, [1, 2, 3]);

        far.write_all(&[9, 8]).await.unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);
        let read = channel.read(16, deadline).await.unwrap();
        assert_eq!(&read[..], &[9, 8]);
    }

    #[tokio::test]
    async fn test_read_respects_max_bytes() {
        let (near, mut far) = duplex(64);
        let mut channel = StreamChannel::new(near, "duplex");

        far.write_all(&[0xAA; 10]).await.unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);

        let first = channel.read(4, deadline).await.unwrap();
        assert_eq!(first.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out_at_deadline() {
        let (near, _far) = duplex(64);
        let mut channel = StreamChannel::new(near, "duplex");

        let deadline = Instant::now() + Duration::from_millis(200);
        let result = channel.read(16, deadline).await;

        assert!(matches!(result, Err(Error::ReadTimeout)));
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test]
    async fn test_read_reports_closed_peer() {
        let (near, far) = duplex(64);
        let mut channel = StreamChannel::new(near, "duplex");
        drop(far);

        let deadline = Instant::now() + Duration::from_secs(1);
        let result = channel.read(16, deadline).await;

        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_closed_channel_rejects_io() {
        let (near, _far) = duplex(64);
        let mut channel = StreamChannel::new(near, "duplex");

        channel.close().await.unwrap();
        assert!(!channel.is_open());
        assert!(matches!(channel.write(&[1]).await, Err(Error::NotConnected)));
        assert!(matches!(channel.open().await, Err(Error::NotConnected)));
    }
}
