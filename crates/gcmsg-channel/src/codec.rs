//! Payload codec hooks.
//!
//! Applications implement [`Encode`] / [`Decode`] for their message types.
//! A few fixed-layout and length-prefixed schemes are provided here; none of
//! them are used by the channel itself.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, Result};

/// Size of the length prefix used by [`LengthPrefixed`].
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Decode a value from a complete payload.
pub trait Decode: Sized {
    fn decode(payload: &[u8]) -> Result<Self>;
}

/// Encode a value into a payload buffer.
pub trait Encode {
    fn encode(&self, dst: &mut BytesMut) -> Result<()>;
}

fn expect_exact(payload: &[u8], size: usize) -> Result<()> {
    if payload.len() < size {
        return Err(CodecError::Truncated {
            needed: size,
            available: payload.len(),
        });
    }
    if payload.len() > size {
        return Err(CodecError::TrailingBytes(payload.len() - size));
    }
    Ok(())
}

impl Decode for u32 {
    fn decode(mut payload: &[u8]) -> Result<Self> {
        expect_exact(payload, 4)?;
        Ok(payload.get_u32_le())
    }
}

impl Encode for u32 {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_u32_le(*self);
        Ok(())
    }
}

impl Decode for u64 {
    fn decode(mut payload: &[u8]) -> Result<Self> {
        expect_exact(payload, 8)?;
        Ok(payload.get_u64_le())
    }
}

impl Encode for u64 {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_u64_le(*self);
        Ok(())
    }
}

/// Byte string preceded by its length.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────────────┐
/// │ Length    │ Bytes            │
/// │ (4B LE)   │ (Length bytes)   │
/// └───────────┴──────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LengthPrefixed(pub Bytes);

impl LengthPrefixed {
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self(value.into())
    }
}

impl Decode for LengthPrefixed {
    fn decode(mut payload: &[u8]) -> Result<Self> {
        if payload.len() < LENGTH_PREFIX_SIZE {
            return Err(CodecError::Truncated {
                needed: LENGTH_PREFIX_SIZE,
                available: payload.len(),
            });
        }
        let len = payload.get_u32_le() as usize;
        expect_exact(payload, len).map_err(|err| match err {
            CodecError::Truncated { needed, available } => CodecError::Truncated {
                needed: needed + LENGTH_PREFIX_SIZE,
                available: available + LENGTH_PREFIX_SIZE,
            },
            other => other,
        })?;
        Ok(Self(Bytes::copy_from_slice(payload)))
    }
}

impl Encode for LengthPrefixed {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let len = u32::try_from(self.0.len()).map_err(|_| {
            CodecError::Invalid(format!(
                "length-prefixed value of {} bytes exceeds u32",
                self.0.len()
            ))
        })?;
        dst.reserve(LENGTH_PREFIX_SIZE + self.0.len());
        dst.put_u32_le(len);
        dst.put_slice(&self.0);
        Ok(())
    }
}

/// JSON payload via `serde_json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> Decode for Json<T> {
    fn decode(payload: &[u8]) -> Result<Self> {
        Ok(Self(serde_json::from_slice(payload)?))
    }
}

impl<T: Serialize> Encode for Json<T> {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        serde_json::to_writer(dst.writer(), &self.0)?;
        Ok(())
    }
}
