//! Request/response transactions over a half-duplex channel
//!
//! GNetPlus has no request identifiers, so a reply is correlated purely by
//! being the first acceptable frame after the request was written. Only one
//! exchange may be in flight per channel: [`TransactionEngine`] takes
//! `&mut self`, and [`SharedEngine`] adds a lock for callers that share one
//! channel.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use gnetplus_core::constants::DEFAULT_ADDRESS;
use gnetplus_core::{Frame, FrameCodec, FrameError};
use gnetplus_transport::Channel;
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::error::{ChannelFailure, Nak};
use crate::outcome::{Outcome, ProtocolError};
use crate::policy::{RetryOn, TransactionPolicy};
use crate::reader::{ChannelError, ChannelReader};

/// Events held back while a transaction owns the channel
const EVENT_BACKLOG: usize = 16;

/// Request awaiting its reply
struct PendingRequest {
    address: u8,
    command: u8,
    frame: BytesMut,
    attempt: u32,
    deadline: Instant,
}

/// Why a single attempt failed
#[derive(Debug)]
enum AttemptFailure {
    Timeout,
    Invalid(FrameError),
    Channel(ChannelFailure),
}

impl AttemptFailure {
    fn class(&self) -> RetryOn {
        match self {
            Self::Timeout => RetryOn::TIMEOUT,
            Self::Invalid(_) => RetryOn::INVALID_MESSAGE,
            Self::Channel(_) => RetryOn::CHANNEL_FAILURE,
        }
    }

    fn into_outcome(self, attempts: u32) -> Outcome {
        match self {
            Self::Timeout => Outcome::ProtocolError(ProtocolError::Timeout { attempts }),
            Self::Invalid(reason) => Outcome::ProtocolError(ProtocolError::InvalidMessage(reason)),
            Self::Channel(failure) => Outcome::ChannelFailure(failure),
        }
    }
}

/// Transaction engine bound to one channel
///
/// Event frames seen during a transaction are queued and handed out by
/// [`listen`](Self::listen) before any new read.
pub struct TransactionEngine<C> {
    channel: C,
    reader: ChannelReader,
    events: VecDeque<Frame>,
}

impl<C: Channel> TransactionEngine<C> {
    /// Engine speaking the stock GNetPlus dialect
    pub fn new(channel: C) -> Self {
        Self::with_codec(channel, FrameCodec::gnetplus())
    }

    /// Engine speaking the dialect of `codec`
    pub fn with_codec(channel: C, codec: FrameCodec) -> Self {
        Self {
            channel,
            reader: ChannelReader::new(codec),
            events: VecDeque::new(),
        }
    }

    /// Switch dialect, dropping anything buffered under the old one
    pub fn set_codec(&mut self, codec: FrameCodec) {
        self.reader = ChannelReader::new(codec);
    }

    /// Codec in use
    pub fn codec(&self) -> &FrameCodec {
        self.reader.codec()
    }

    /// Borrow the channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Mutably borrow the channel
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Number of queued event frames
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Give the channel back
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Send one command and wait for its reply
    ///
    /// Every expected failure comes back as an [`Outcome`]. `Err` is reserved
    /// for contract violations such as an oversized payload, which are
    /// rejected before anything is written.
    pub async fn execute(
        &mut self,
        address: u8,
        command: u8,
        payload: &[u8],
        policy: &TransactionPolicy,
    ) -> gnetplus_core::Result<Outcome> {
        let frame = self.reader.codec().encode(address, command, payload)?;

        let mut pending = PendingRequest {
            address,
            command,
            frame,
            attempt: 0,
            deadline: Instant::now(),
        };

        loop {
            pending.attempt += 1;
            pending.deadline = Instant::now() + policy.timeout;

            trace!(
                address = pending.address,
                command = pending.command,
                attempt = pending.attempt,
                "Sending request"
            );

            let failure = match self.attempt(&pending, policy).await {
                Ok(outcome) => return Ok(outcome),
                Err(failure) => failure,
            };

            let retryable = policy.retry_on.contains(failure.class());
            if !retryable || pending.attempt >= policy.max_attempts() {
                warn!(
                    "Command 0x{:02X} to 0x{:02X} failed after {} attempt(s): {:?}",
                    pending.command, pending.address, pending.attempt, failure
                );
                return Ok(failure.into_outcome(pending.attempt));
            }

            debug!(
                "Attempt {}/{} for command 0x{:02X} failed ({:?}), retrying",
                pending.attempt,
                policy.max_attempts(),
                pending.command,
                failure
            );
        }
    }

    /// One write plus the wait for its reply
    async fn attempt(
        &mut self,
        pending: &PendingRequest,
        policy: &TransactionPolicy,
    ) -> Result<Outcome, AttemptFailure> {
        // Anything still buffered predates this request; only events survive
        for frame in self.reader.take_buffered() {
            if policy.event == Some(frame.command) {
                self.queue_event(frame);
            } else {
                debug!("Dropping stale frame {}", frame);
            }
        }

        match timeout_at(pending.deadline, self.channel.write(&pending.frame)).await {
            Err(_) => return Err(AttemptFailure::Timeout),
            Ok(Err(e)) => return Err(AttemptFailure::Channel(e.into())),
            Ok(Ok(_)) => {}
        }

        let mut unexpected = None;

        loop {
            let frame = match self.reader.pump(&mut self.channel, pending.deadline).await {
                Ok(frame) => frame,
                Err(ChannelError::Timeout) => {
                    return Err(unexpected.map_or(AttemptFailure::Timeout, AttemptFailure::Invalid));
                }
                Err(ChannelError::Corrupt(reason)) => return Err(AttemptFailure::Invalid(reason)),
                Err(ChannelError::Closed) => {
                    return Err(AttemptFailure::Channel(ChannelFailure::Closed));
                }
                Err(ChannelError::Transport(e)) => return Err(AttemptFailure::Channel(e.into())),
            };

            if policy.event == Some(frame.command) {
                debug!("Queueing unsolicited event while waiting: {:?}", frame);
                self.queue_event(frame);
                continue;
            }

            if policy.strict_address
                && pending.address != DEFAULT_ADDRESS
                && frame.address != pending.address
            {
                warn!(
                    "Ignoring reply from 0x{:02X}, expected 0x{:02X}",
                    frame.address, pending.address
                );
                unexpected = Some(unexpected_reply(&frame));
                continue;
            }

            if frame.command == policy.nak {
                let nak = Nak::from(frame);
                debug!("Device rejected command 0x{:02X}: {}", pending.command, nak);
                return Ok(Outcome::DeviceRejected(nak));
            }

            if frame.command == policy.expected_reply {
                return Ok(Outcome::Success(frame.payload));
            }

            warn!("Ignoring unexpected reply {}", frame);
            unexpected = Some(unexpected_reply(&frame));
        }
    }

    /// Wait for one unsolicited `event` frame without sending anything
    ///
    /// Frames with other codes are skipped.
    pub async fn listen(&mut self, event: u8, timeout: Duration) -> Result<Frame, ChannelError> {
        let queued = self.events.iter().position(|frame| frame.command == event);
        if let Some(frame) = queued.and_then(|index| self.events.remove(index)) {
            trace!("Serving queued event: {:?}", frame);
            return Ok(frame);
        }

        let deadline = Instant::now() + timeout;

        loop {
            let frame = self.reader.pump(&mut self.channel, deadline).await?;
            if frame.command == event {
                return Ok(frame);
            }
            debug!("Ignoring non-event frame while listening: {}", frame);
        }
    }

    fn queue_event(&mut self, frame: Frame) {
        if self.events.len() >= EVENT_BACKLOG {
            if let Some(dropped) = self.events.pop_front() {
                warn!("Event backlog full, dropping oldest: {:?}", dropped);
            }
        }
        self.events.push_back(frame);
    }
}

fn unexpected_reply(frame: &Frame) -> FrameError {
    FrameError::UnexpectedReply {
        address: frame.address,
        command: frame.command,
    }
}

/// Cloneable engine handle serializing callers on one channel
pub struct SharedEngine<C> {
    inner: Arc<Mutex<TransactionEngine<C>>>,
}

impl<C> Clone for SharedEngine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Channel> SharedEngine<C> {
    pub fn new(engine: TransactionEngine<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// [`TransactionEngine::execute`] under the channel lock
    pub async fn execute(
        &self,
        address: u8,
        command: u8,
        payload: &[u8],
        policy: &TransactionPolicy,
    ) -> gnetplus_core::Result<Outcome> {
        let mut engine = self.inner.lock().await;
        engine.execute(address, command, payload, policy).await
    }

    /// [`TransactionEngine::listen`] under the channel lock
    pub async fn listen(&self, event: u8, timeout: Duration) -> Result<Frame, ChannelError> {
        let mut engine = self.inner.lock().await;
        engine.listen(event, timeout).await
    }
}
