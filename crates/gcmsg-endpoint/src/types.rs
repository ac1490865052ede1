use std::fmt;

/// Application-defined message type tag.
///
/// The tag is opaque to gcmsg; it is carried alongside every payload and
/// never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MessageType(pub u32);

impl MessageType {
    /// Create a message type from its raw tag.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw 32-bit tag.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for MessageType {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<MessageType> for u32 {
    fn from(msg_type: MessageType) -> Self {
        msg_type.0
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status codes reported by the native endpoint.
///
/// Every code the native layer can return maps to a distinct variant;
/// unrecognized codes are kept verbatim in [`GcResult::Unknown`].
///
/// `GcResult::from_raw(raw).as_raw() == raw` holds for every `u32`. The
/// reverse only holds for values produced by [`GcResult::from_raw`]: a
/// hand-built `Unknown(2)` encodes as `2` and decodes as `BufferTooSmall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcResult {
    Ok,
    NoMessage,
    BufferTooSmall,
    NotLoggedOn,
    InvalidMessage,
    /// A code outside `0..=4`. [`GcResult::from_raw`] never produces this
    /// for a known code.
    Unknown(u32),
}

impl GcResult {
    /// Decode a raw status code.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::NoMessage,
            2 => Self::BufferTooSmall,
            3 => Self::NotLoggedOn,
            4 => Self::InvalidMessage,
            other => Self::Unknown(other),
        }
    }

    /// Encode back into the raw status code.
    pub const fn as_raw(self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::NoMessage => 1,
            Self::BufferTooSmall => 2,
            Self::NotLoggedOn => 3,
            Self::InvalidMessage => 4,
            Self::Unknown(other) => other,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for GcResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::NoMessage => f.write_str("no message"),
            Self::BufferTooSmall => f.write_str("buffer too small"),
            Self::NotLoggedOn => f.write_str("not logged on"),
            Self::InvalidMessage => f.write_str("invalid message"),
            Self::Unknown(code) => write!(f, "unknown status {code}"),
        }
    }
}
