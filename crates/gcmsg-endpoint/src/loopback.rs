use std::collections::VecDeque;

use bytes::Bytes;
use tracing::trace;

use crate::error::{EndpointError, Result};
use crate::traits::RawEndpoint;
use crate::types::{GcResult, MessageType};

/// What an undersized receive does to the queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationMode {
    /// The message stays queued and can be retrieved with a larger buffer.
    #[default]
    Retain,
    /// The message is dropped from the queue.
    Discard,
}

/// In-memory endpoint with a FIFO inbound queue.
///
/// Sends loop back into the inbound queue by default, so a
/// `send` followed by `receive` returns the same message. Useful for tests,
/// demos, and developing against the channel without a native session.
#[derive(Debug, Default)]
pub struct LoopbackEndpoint {
    inbound: VecDeque<(MessageType, Bytes)>,
    truncation: TruncationMode,
    reject_with: Option<GcResult>,
    logged_off: bool,
    echo: bool,
    sent: u64,
    polls: u64,
    receives: u64,
    sent_log: Vec<(MessageType, Bytes)>,
}

impl LoopbackEndpoint {
    /// Create a loopback endpoint that echoes sends into its inbound queue.
    pub fn new() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Create an endpoint whose sends are recorded but not echoed back.
    pub fn sink() -> Self {
        Self::default()
    }

    /// Choose what happens to a message when receive is given too small a buffer.
    pub fn with_truncation(mut self, mode: TruncationMode) -> Self {
        self.truncation = mode;
        self
    }

    /// Queue a message as if it had arrived from the remote side.
    pub fn push_inbound(&mut self, msg_type: MessageType, payload: impl Into<Bytes>) {
        self.inbound.push_back((msg_type, payload.into()));
    }

    /// Make every subsequent send fail with `reason` until cleared with `None`.
    pub fn reject_sends(&mut self, reason: Option<GcResult>) {
        self.reject_with = reason;
    }

    /// Simulate the session dropping (`false`) or coming back (`true`).
    pub fn set_logged_on(&mut self, logged_on: bool) {
        self.logged_off = !logged_on;
    }

    /// Number of queued inbound messages.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Successful sends so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Calls to `raw_poll` so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Calls to `raw_receive` so far, successful or not.
    pub fn receives(&self) -> u64 {
        self.receives
    }

    /// Every message accepted by `raw_send`, oldest first.
    pub fn sent_messages(&self) -> &[(MessageType, Bytes)] {
        &self.sent_log
    }

    fn logged_on(&self) -> bool {
        !self.logged_off
    }
}

impl RawEndpoint for LoopbackEndpoint {
    fn raw_send(&mut self, msg_type: MessageType, data: &[u8]) -> Result<()> {
        if !self.logged_on() {
            return Err(EndpointError::SendRejected {
                msg_type,
                reason: GcResult::NotLoggedOn,
            });
        }
        if let Some(reason) = self.reject_with {
            return Err(EndpointError::SendRejected { msg_type, reason });
        }

        let payload = Bytes::copy_from_slice(data);
        trace!(%msg_type, len = payload.len(), "loopback send");
        if self.echo {
            self.inbound.push_back((msg_type, payload.clone()));
        }
        self.sent_log.push((msg_type, payload));
        self.sent += 1;
        Ok(())
    }

    fn raw_poll(&mut self) -> Option<usize> {
        self.polls += 1;
        if !self.logged_on() {
            return None;
        }
        self.inbound.front().map(|(_, payload)| payload.len())
    }

    fn raw_receive(&mut self, msg_type: &mut MessageType, buffer: &mut [u8]) -> Result<usize> {
        self.receives += 1;
        if !self.logged_on() {
            return Err(EndpointError::NotLoggedOn);
        }

        let Some((tag, payload)) = self.inbound.front() else {
            return Err(EndpointError::NoMessage);
        };

        if payload.len() > buffer.len() {
            let err = EndpointError::BufferTooSmall {
                capacity: buffer.len(),
                required: payload.len(),
            };
            if self.truncation == TruncationMode::Discard {
                self.inbound.pop_front();
            }
            return Err(err);
        }

        let written = payload.len();
        buffer[..written].copy_from_slice(payload);
        *msg_type = *tag;
        self.inbound.pop_front();
        Ok(written)
    }

    fn retains_undersized(&self) -> bool {
        self.truncation == TruncationMode::Retain
    }
}
