//! High-level reader interface

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use gnetplus_core::constants::{events, reply, request, DEFAULT_ADDRESS};
use gnetplus_core::{Frame, FrameCodec, Function, PROTOCOL_VERSION};
use gnetplus_transport::{Channel, SerialChannel, SerialConfig, TcpChannel};
use gnetplus_types::{CardUid, DeviceInfo};

use crate::engine::TransactionEngine;
use crate::error::{Error, Result, TransactionError};
use crate::outcome::Outcome;
use crate::policy::TransactionPolicy;

/// GNetPlus card reader
///
/// Owns its channel and issues one command at a time.
///
/// # Examples
///
/// ```no_run
/// use gnetplus::Device;
///
/// #[tokio::main]
/// async fn main() -> gnetplus::Result<()> {
///     let mut device = Device::serial("/dev/ttyUSB0");
///
///     device.connect().await?;
///     println!("Firmware: {}", device.get_version().await?);
///
///     let uid = device.request_card_uid().await?;
///     println!("Card: {}", uid);
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    engine: TransactionEngine<Box<dyn Channel>>,
    address: u8,
    policy: TransactionPolicy,
    connected: bool,
}

impl Device {
    /// Reader behind an arbitrary channel
    pub fn new(channel: impl Channel + 'static) -> Self {
        let channel: Box<dyn Channel> = Box::new(channel);
        Self {
            engine: TransactionEngine::new(channel),
            address: DEFAULT_ADDRESS,
            policy: TransactionPolicy::default(),
            connected: false,
        }
    }

    /// Reader on a serial port with default line settings
    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(SerialChannel::new(SerialConfig::new(path)))
    }

    /// Reader behind a TCP serial device server
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new(TcpChannel::new(host, port))
    }

    /// Set the reader address (default: broadcast)
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Replace the transaction policy
    pub fn with_policy(mut self, policy: TransactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    /// Use a non-standard frame dialect
    pub fn with_codec(mut self, codec: FrameCodec) -> Self {
        self.engine.set_codec(codec);
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn policy(&self) -> &TransactionPolicy {
        &self.policy
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.connected && self.engine.channel().is_open()
    }

    /// Open the channel and check the reader answers a poll
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.engine.channel().describe());

        if !self.engine.channel().is_open() {
            self.engine.channel_mut().open().await?;
        }

        // Mark connected before polling so transact() accepts the call
        self.connected = true;

        if let Err(e) = self.polling().await {
            warn!("Reader did not answer poll: {}", e);
            self.connected = false;
            let _ = self.engine.channel_mut().close().await;
            return Err(e);
        }

        info!("Connected to {} reader 0x{:02X}", PROTOCOL_VERSION, self.address);
        Ok(())
    }

    /// Close the channel
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }

        info!("Disconnecting...");
        self.connected = false;
        self.engine.channel_mut().close().await?;

        Ok(())
    }

    /// Send a raw command code and return the outcome as-is
    pub async fn execute(&mut self, command: u8, payload: &[u8]) -> Result<Outcome> {
        self.ensure_connected()?;

        let outcome = self
            .engine
            .execute(self.address, command, payload, &self.policy)
            .await?;

        Ok(outcome)
    }

    /// Send `function` and return the ACK payload
    pub async fn transact(&mut self, function: Function, payload: &[u8]) -> Result<Bytes> {
        debug!("{} with {} byte payload", function, payload.len());

        let outcome = self.execute(function.into(), payload).await?;
        Ok(outcome.into_result()?)
    }

    /// Ping the reader
    pub async fn polling(&mut self) -> Result<()> {
        self.transact(Function::Polling, &[]).await?;
        Ok(())
    }

    /// Firmware version string
    pub async fn get_version(&mut self) -> Result<String> {
        let payload = self.transact(Function::GetVersion, &[]).await?;
        Ok(decode_text(&payload))
    }

    /// Firmware version plus the reader serial number when it reports one
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        let version = self.get_version().await?;
        let info = DeviceInfo::new(self.address, version);

        match self.transact(Function::GetSn, &[]).await {
            Ok(serial) if !serial.is_empty() => {
                Ok(info.with_serial_number(hex::encode_upper(&serial)))
            }
            Ok(_) => Ok(info),
            Err(Error::Transaction(TransactionError::NegativeAcknowledge(nak))) => {
                debug!("Reader has no serial number ({})", nak);
                Ok(info)
            }
            Err(e) => Err(e),
        }
    }

    /// UID of the card currently in the field
    ///
    /// Wakes every card (halted ones too) and runs anticollision; a NAK
    /// means no card answered.
    pub async fn request_card_uid(&mut self) -> Result<CardUid> {
        self.transact(Function::Request, &[request::ALL]).await?;
        let uid = self.transact(Function::AntiCollision, &[]).await?;

        Ok(CardUid::new(uid.to_vec())?)
    }

    /// Toggle unsolicited card events
    pub async fn set_auto_mode(&mut self, enabled: bool) -> Result<()> {
        self.transact(Function::AutoMode, &[u8::from(enabled)]).await?;
        debug!("Auto mode {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Wait for the next unsolicited event frame
    pub async fn wait_for_event(&mut self, timeout: Duration) -> Result<Frame> {
        self.ensure_connected()?;

        let event = self.policy.event.unwrap_or(reply::EVN);
        self.engine
            .listen(event, timeout)
            .await
            .map_err(|e| Error::Transaction(e.into_listen_error()))
    }

    /// Wait for a card to enter the field (auto mode must be on)
    pub async fn wait_for_card(&mut self, timeout: Duration) -> Result<CardUid> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let frame = self.wait_for_event(remaining).await?;

            match frame.payload.split_first() {
                Some((&events::CARD_IN, uid)) => return Ok(CardUid::new(uid.to_vec())?),
                Some((&events::CARD_OUT, _)) => debug!("Card left the field"),
                _ => debug!("Ignoring event {:?}", frame),
            }
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}

fn decode_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{frame_bytes, spawn_reader};
    use gnetplus_transport::StreamChannel;
    use pretty_assertions::assert_eq;
    use tokio::io::{duplex, AsyncWriteExt};

    const ACK: u8 = 0x06;
    const NAK: u8 = 0x15;

    /// Reader with one card in the field and no serial number
    fn simulated(frame: &Frame) -> Vec<u8> {
        let ack = |payload: &[u8]| frame_bytes(frame.address, ACK, payload);

        match Function::try_from(frame.command) {
            Ok(Function::Polling) | Ok(Function::AutoMode) => ack(&[]),
            Ok(Function::GetVersion) => ack(b"GNetPlus V2.10\0\0"),
            Ok(Function::Request) if frame.payload[..] == [0x52] => ack(&[0x04, 0x00]),
            Ok(Function::AntiCollision) => ack(&[0xDE, 0xAD, 0xBE, 0xEF]),
            _ => frame_bytes(frame.address, NAK, &[0x01]),
        }
    }

    async fn connected() -> Device {
        let (near, far) = duplex(512);
        spawn_reader(far, simulated);

        let mut device = Device::new(StreamChannel::new(near, "sim"));
        device.connect().await.unwrap();
        device
    }

    #[tokio::test]
    async fn test_connect_and_version() {
        let mut device = connected().await;

        assert!(device.is_connected());
        assert_eq!(device.get_version().await.unwrap(), "GNetPlus V2.10");
    }

    #[tokio::test]
    async fn test_not_connected() {
        let (near, _far) = duplex(64);
        let mut device = Device::new(StreamChannel::new(near, "sim"));

        assert!(matches!(device.polling().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_request_card_uid() {
        let mut device = connected().await;

        let uid = device.request_card_uid().await.unwrap();
        assert_eq!(uid.to_string(), "DEADBEEF");
    }

    #[tokio::test]
    async fn test_device_info_without_serial() {
        let mut device = connected().await;

        let info = device.get_device_info().await.unwrap();
        assert_eq!(info.firmware_version, "GNetPlus V2.10");
        assert_eq!(info.serial_number, None);
    }

    #[tokio::test]
    async fn test_nak_maps_to_error() {
        let mut device = connected().await;

        let err = device.transact(Function::ReadBlock, &[0x04]).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NegativeAcknowledge));
    }

    #[tokio::test]
    async fn test_execute_returns_outcome() {
        let mut device = connected().await;

        let outcome = device.execute(0x24, &[0x04]).await.unwrap();
        assert!(matches!(outcome, Outcome::DeviceRejected(ref nak) if nak.code == Some(0x01)));
    }

    #[tokio::test]
    async fn test_connect_fails_when_reader_silent() {
        let (near, _far) = duplex(64);
        let mut device = Device::new(StreamChannel::new(near, "silent"))
            .with_policy(TransactionPolicy::default().with_max_retries(0))
            .with_timeout(Duration::from_millis(20));

        let err = device.connect().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Timeout));
        assert!(!device.is_connected());
    }

    #[tokio::test]
    async fn test_wait_for_card() {
        let (near, mut far) = duplex(512);
        let mut device = Device::new(StreamChannel::new(near, "sim"));

        // Reader pushes events on its own once auto mode is on
        tokio::spawn(async move {
            let mut pushed = frame_bytes(0x00, 0x12, &[b'O']);
            pushed.extend(frame_bytes(0x00, 0x12, &[b'I', 0x11, 0x22, 0x33, 0x44]));
            far.write_all(&frame_bytes(0x00, ACK, &[])).await.unwrap();
            far.write_all(&pushed).await.unwrap();
            // Keep the pipe open until the test is done
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        device.connect().await.unwrap();
        let uid = device.wait_for_card(Duration::from_secs(1)).await.unwrap();

        assert_eq!(uid.as_bytes(), &[0x11, 0x22, 0x33, 0x44]);
    }

    #[tokio::test]
    async fn test_card_event_during_poll_is_not_lost() {
        let (near, far) = duplex(512);
        let mut auto_mode = false;
        spawn_reader(far, move |frame| match Function::try_from(frame.command) {
            Ok(Function::AutoMode) => {
                auto_mode = frame.payload[..] == [0x01];
                frame_bytes(frame.address, ACK, &[])
            }
            // A card arrives just as the poll is answered
            Ok(Function::Polling) if auto_mode => {
                let mut bytes = frame_bytes(0x00, 0x12, &[b'I', 0x0A, 0x0B, 0x0C, 0x0D]);
                bytes.extend(frame_bytes(frame.address, ACK, &[]));
                bytes
            }
            _ => frame_bytes(frame.address, ACK, &[]),
        });

        let mut device = Device::new(StreamChannel::new(near, "sim"));
        device.connect().await.unwrap();
        device.set_auto_mode(true).await.unwrap();
        device.polling().await.unwrap();

        let uid = device.wait_for_card(Duration::from_millis(200)).await.unwrap();
        assert_eq!(uid.as_bytes(), &[0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let mut device = connected().await;

        device.disconnect().await.unwrap();
        assert!(!device.is_connected());
        assert!(matches!(device.get_version().await, Err(Error::NotConnected)));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b" V1.0\0\0"), "V1.0");
        assert_eq!(decode_text(b""), "");
    }
}
