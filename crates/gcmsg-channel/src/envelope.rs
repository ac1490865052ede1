use bytes::{Bytes, BytesMut};
use gcmsg_endpoint::MessageType;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Decode, Encode, Json};
use crate::error::Result;

/// A message type tag paired with an owned payload.
///
/// Envelopes are created by callers for sending and by the channel on
/// receive. The payload is delivered intact and length-accurate; its
/// contents are never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    msg_type: MessageType,
    payload: Bytes,
}

impl Envelope {
    /// Create an envelope.
    pub fn new(msg_type: impl Into<MessageType>, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: payload.into(),
        }
    }

    /// Create an envelope with no payload.
    pub fn empty(msg_type: impl Into<MessageType>) -> Self {
        Self::new(msg_type, Bytes::new())
    }

    /// Encode `value` with its [`Encode`] impl into a new envelope.
    pub fn encode<T: Encode + ?Sized>(msg_type: impl Into<MessageType>, value: &T) -> Result<Self> {
        let mut buf = BytesMut::new();
        value.encode(&mut buf)?;
        Ok(Self::new(msg_type, buf.freeze()))
    }

    /// Serialize `value` as JSON into a new envelope.
    pub fn json<T: Serialize>(msg_type: impl Into<MessageType>, value: &T) -> Result<Self> {
        Self::encode(msg_type, &Json(value))
    }

    /// Decode the payload with `T`'s [`Decode`] impl.
    pub fn decode_as<T: Decode>(&self) -> Result<T> {
        T::decode(&self.payload)
    }

    /// Deserialize the payload as JSON.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode_as::<Json<T>>().map(|json| json.0)
    }

    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Split into the tag and the payload.
    pub fn into_parts(self) -> (MessageType, Bytes) {
        (self.msg_type, self.payload)
    }
}
