/// Errors raised while encoding or decoding envelope payloads.
///
/// These come only from codec logic; the channel itself never inspects
/// payload bytes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload ended before the value was complete.
    #[error("payload truncated (needed {needed} bytes, {available} available)")]
    Truncated { needed: usize, available: usize },

    /// Bytes remained after the value was fully decoded.
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    /// The value cannot be represented in the payload format.
    #[error("invalid payload: {0}")]
    Invalid(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
