//! Safe message channel over a raw native endpoint.
//!
//! This is the core value-add layer of gcmsg. It turns the three raw
//! endpoint primitives into:
//! - owned, typed [`Envelope`]s on send and receive
//! - pooled receive buffers sized from the polled message length
//! - a bounded retry when a receive buffer turns out to be too small
//! - corruption detection when a receive writes an unexpected byte count
//!
//! No payload interpretation, no threading, no timeouts. Those belong to
//! the application (see the optional `async` poller for a tokio driver).

pub mod channel;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod pool;

#[cfg(feature = "async")]
pub mod poller;

pub use channel::{Channel, ChannelState};
pub use codec::{Decode, Encode, Json, LengthPrefixed};
pub use config::{ChannelConfig, UndersizedReceive};
pub use envelope::Envelope;
pub use error::CodecError;
pub use gcmsg_endpoint::{EndpointError, MessageType, RawEndpoint};
pub use pool::{BufferPool, PoolConfig, PoolStats, PooledBuffer};

#[cfg(feature = "async")]
pub use poller::AsyncPoller;
