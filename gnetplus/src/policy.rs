//! Transaction policy

use std::time::Duration;

use bitflags::bitflags;
use gnetplus_core::constants::{reply, DEFAULT_TIMEOUT_MS, MAX_RETRIES};

bitflags! {
    /// Failure classes that consume a retry instead of ending the call
    ///
    /// A NAK is a deliberate device decision and is never retried.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RetryOn: u8 {
        /// Attempt deadline elapsed
        const TIMEOUT = 1;
        /// Channel closed or reported an I/O error
        const CHANNEL_FAILURE = 1 << 1;
        /// Corrupt or uncorrelated frame
        const INVALID_MESSAGE = 1 << 2;
    }
}

impl Default for RetryOn {
    fn default() -> Self {
        Self::all()
    }
}

/// Per-call timing, retry and reply-correlation settings
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gnetplus::{RetryOn, TransactionPolicy};
///
/// let policy = TransactionPolicy::default()
///     .with_timeout(Duration::from_millis(300))
///     .with_max_retries(1)
///     .with_retry_on(RetryOn::TIMEOUT);
/// assert_eq!(policy.max_retries, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPolicy {
    /// Deadline for each attempt, measured from the write
    pub timeout: Duration,

    /// Retries after the initial attempt
    pub max_retries: u32,

    /// Failure classes that are retried
    pub retry_on: RetryOn,

    /// Reply code that completes the call successfully
    pub expected_reply: u8,

    /// Reply code signalling rejection
    pub nak: u8,

    /// Unsolicited event code skipped while waiting
    pub event: Option<u8>,

    /// Ignore replies from other addresses (unless the request was broadcast)
    pub strict_address: bool,
}

impl TransactionPolicy {
    /// Set per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry count
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set retried failure classes
    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Set success and rejection reply codes
    pub fn with_reply_codes(mut self, expected_reply: u8, nak: u8) -> Self {
        self.expected_reply = expected_reply;
        self.nak = nak;
        self
    }

    /// Set (or clear) the event code
    pub fn with_event_code(mut self, event: Option<u8>) -> Self {
        self.event = event;
        self
    }

    /// Enable address matching
    pub fn with_strict_address(mut self, strict: bool) -> Self {
        self.strict_address = strict;
        self
    }

    /// Total attempts the policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: MAX_RETRIES,
            retry_on: RetryOn::default(),
            expected_reply: reply::ACK,
            nak: reply::NAK,
            event: Some(reply::EVN),
            strict_address: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = TransactionPolicy::default();

        assert_eq!(policy.timeout, Duration::from_secs(1));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.expected_reply, 0x06);
        assert_eq!(policy.nak, 0x15);
        assert_eq!(policy.event, Some(0x12));
        assert!(policy.retry_on.contains(RetryOn::TIMEOUT | RetryOn::CHANNEL_FAILURE));
        assert!(policy.retry_on.contains(RetryOn::INVALID_MESSAGE));
    }

    #[test]
    fn test_builder() {
        let policy = TransactionPolicy::default()
            .with_reply_codes(0x80, 0x81)
            .with_event_code(None)
            .with_retry_on(RetryOn::empty())
            .with_strict_address(true);

        assert_eq!(policy.expected_reply, 0x80);
        assert_eq!(policy.nak, 0x81);
        assert_eq!(policy.event, None);
        assert!(policy.retry_on.is_empty());
        assert!(policy.strict_address);
    }

    #[test]
    fn test_max_attempts_saturates() {
        let policy = TransactionPolicy::default().with_max_retries(u32::MAX);
        assert_eq!(policy.max_attempts(), u32::MAX);
    }
}
