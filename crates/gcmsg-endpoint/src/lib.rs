//! Raw endpoint binding for opaque native message queues.
//!
//! An endpoint offers exactly three primitives:
//! - `send(type, bytes)` hands a message to the native session
//! - `poll()` reports the size of the next queued inbound message, if any
//! - `receive(buffer)` copies that message out and reports its type tag
//!
//! This is the lowest layer of gcmsg and the only one containing `unsafe`.
//! Everything else builds on the [`RawEndpoint`] trait defined here.

pub mod error;
pub mod loopback;
pub mod native;
pub mod traits;
pub mod types;

pub use error::{EndpointError, Result};
pub use loopback::{LoopbackEndpoint, TruncationMode};
pub use native::{GcVtable, NativeEndpoint};
pub use traits::RawEndpoint;
pub use types::{GcResult, MessageType};
