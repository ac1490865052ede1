use crate::types::{GcResult, MessageType};

/// Errors reported by endpoint operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// The native send call reported failure.
    #[error("send of message type {msg_type} rejected: {reason}")]
    SendRejected {
        msg_type: MessageType,
        reason: GcResult,
    },

    /// The receive buffer is smaller than the pending message.
    #[error("receive buffer too small ({capacity} bytes, message needs {required})")]
    BufferTooSmall { capacity: usize, required: usize },

    /// A successful receive wrote a different number of bytes than poll announced.
    #[error("corrupt receive (poll reported {expected} bytes, receive wrote {written})")]
    Corrupt { expected: usize, written: usize },

    /// Receive was called with no message queued.
    #[error("no message queued")]
    NoMessage,

    /// The native session is not connected.
    #[error("endpoint session not logged on")]
    NotLoggedOn,

    /// The native layer refused the message as malformed.
    #[error("invalid message")]
    InvalidMessage,

    /// The native layer returned a status code outside the known set.
    #[error("unknown endpoint status {0}")]
    Unknown(u32),
}

impl EndpointError {
    /// Map a non-OK receive status to an error.
    ///
    /// `capacity` and `required` are only used for `BufferTooSmall`.
    pub fn from_receive_status(status: GcResult, capacity: usize, required: usize) -> Self {
        match status {
            GcResult::BufferTooSmall => Self::BufferTooSmall { capacity, required },
            GcResult::NoMessage => Self::NoMessage,
            GcResult::NotLoggedOn => Self::NotLoggedOn,
            GcResult::InvalidMessage => Self::InvalidMessage,
            GcResult::Unknown(code) => Self::Unknown(code),
            // Callers never map a successful status; keep it distinguishable anyway.
            GcResult::Ok => Self::Unknown(GcResult::Ok.as_raw()),
        }
    }

    /// True when the underlying session may be out of sync and should be torn down.
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// True for failures that leave the endpoint consistent and may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        !self.is_desync()
    }
}

pub type Result<T> = std::result::Result<T, EndpointError>;
