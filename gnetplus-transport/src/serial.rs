//! Serial port channel
//!
//! GNetPlus readers ship with an RS-232/RS-485 or USB-CDC interface running
//! 8N1 at 19200 baud out of the box.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, warn};

use gnetplus_core::constants::DEFAULT_BAUD_RATE;

use crate::{
    error::*,
    stream::{read_before, write_all},
    Channel,
};

/// Serial line settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port path (e.g. "/dev/ttyUSB0", "COM3")
    pub path: String,

    /// Baud rate
    pub baud_rate: u32,

    /// Data bits
    pub data_bits: DataBits,

    /// Parity
    pub parity: Parity,

    /// Stop bits
    pub stop_bits: StopBits,

    /// Flow control
    pub flow_control: FlowControl,
}

impl SerialConfig {
    /// 8N1 at the reader's default speed
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }

    /// Set baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set parity
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set stop bits
    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set flow control
    pub fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }
}

/// Serial port channel
pub struct SerialChannel {
    config: SerialConfig,
    port: Option<SerialStream>,
    settle_time: Duration,
}

impl SerialChannel {
    /// Create a closed channel for `config`
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            port: None,
            settle_time: Duration::from_millis(50),
        }
    }

    /// Delay after opening before the first write
    ///
    /// USB-serial bridges drop bytes written immediately after the port opens.
    pub fn with_settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }

    /// Line settings
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

#[async_trait]
impl Channel for SerialChannel {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyConnected);
        }

        debug!(
            "Opening {} at {} baud...",
            self.config.path, self.config.baud_rate
        );

        let port = tokio_serial::new(&self.config.path, self.config.baud_rate)
            .data_bits(self.config.data_bits)
            .parity(self.config.parity)
            .stop_bits(self.config.stop_bits)
            .flow_control(self.config.flow_control)
            .open_native_async()?;

        if !self.settle_time.is_zero() {
            tokio::time::sleep(self.settle_time).await;
        }

        debug!("Opened {}", self.config.path);

        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            debug!("Closing {}...", self.config.path);
            let _ = port.shutdown().await;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        write_all(port, data).await
    }

    async fn read(&mut self, max_bytes: usize, deadline: Instant) -> Result<BytesMut> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        read_before(port, max_bytes, deadline).await
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.config.path, self.config.baud_rate)
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("Serial channel {} dropped while still open", self.config.path);
        }
    }
}
