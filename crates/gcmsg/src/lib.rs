//! Safe message exchange over opaque native endpoints.
//!
//! gcmsg wraps a native "send / poll / receive" message queue, such as a
//! game-coordinator session, in an ownership-correct channel with pooled
//! receive buffers and a closed error taxonomy.
//!
//! # Crate Structure
//!
//! - [`endpoint`] — Raw endpoint binding (the only `unsafe` boundary)
//! - [`channel`] — Buffer pool, envelopes, and the safe channel
//! - [`logging`] — Subscriber setup for the demo programs (behind `demo` feature)
//!
//! The C ABI lives in the separate `gcmsg-ffi` crate.

/// Re-export endpoint types.
pub mod endpoint {
    pub use gcmsg_endpoint::*;
}

/// Re-export channel types.
pub mod channel {
    pub use gcmsg_channel::*;
}

#[cfg(feature = "demo")]
pub mod logging;

pub use gcmsg_channel::{Channel, ChannelConfig, Envelope};
pub use gcmsg_endpoint::{EndpointError, MessageType, RawEndpoint};
