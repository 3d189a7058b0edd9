//! TCP channel for readers behind a serial device server

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::{
    error::*,
    stream::{read_before, write_all},
    Channel,
};

/// TCP channel
///
/// Serial-to-Ethernet converters forward the reader's byte stream verbatim,
/// so frames travel unchanged over the socket.
pub struct TcpChannel {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpChannel {
    /// Create new TCP channel
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket_addr: None,
            stream: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let addr_str = format!("{}:{}", self.addr, self.port);

        let addr = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))?;

        self.socket_addr = Some(addr);
        Ok(addr)
    }
}

#[async_trait]
impl Channel for TcpChannel {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr().await?;

        debug!("Connecting to {}...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Frames are small; do not let Nagle hold them back
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.describe());
            let _ = stream.shutdown().await;
        }

        self.socket_addr = None;
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
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("TCP channel dropped while still connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_channel_create() {
        let channel = TcpChannel::new("192.168.1.50", 4001);
        assert!(!channel.is_open());
        assert_eq!(channel.describe(), "192.168.1.50:4001");
    }

    #[tokio::test]
    async fn test_tcp_channel_invalid_address() {
        let mut channel = TcpChannel::new("invalid..address", 4001)
            .with_connect_timeout(Duration::from_millis(100));

        let result = channel.open().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tcp_channel_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let mut channel = TcpChannel::new("127.0.0.1", port);
        channel.open().await.unwrap();
        assert!(matches!(channel.open().await, Err(Error::AlreadyConnected)));

        channel.write(&[0x01, 0x00, 0x00, 0x00]).await.unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut echoed = BytesMut::new();
        while echoed.len() < 4 {
            echoed.extend_from_slice(&channel.read(16, deadline).await.unwrap());
        }
        assert_eq!(&echoed[..], &[0x01, 0x00, 0x00, 0x00]);

        channel.close().await.unwrap();
        assert!(!channel.is_open());
        server.await.unwrap();
    }
}
