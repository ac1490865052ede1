use std::ffi::c_void;

use gcmsg_channel::{Channel, ChannelConfig, PoolConfig, UndersizedReceive};
use gcmsg_endpoint::NativeEndpoint;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcmsgResult {
    Ok = 0,
    NoMessage = 1,
    InvalidArgument = 2,
    SendRejected = 3,
    BufferTooSmall = 4,
    Corrupt = 5,
    NotLoggedOn = 6,
    InvalidMessage = 7,
    EndpointError = 8,
    Internal = 99,
}

#[allow(dead_code)]
pub const GCMSG_OK: GcmsgResult = GcmsgResult::Ok;
#[allow(dead_code)]
pub const GCMSG_NO_MESSAGE: GcmsgResult = GcmsgResult::NoMessage;
#[allow(dead_code)]
pub const GCMSG_ERR_INVALID_ARGUMENT: GcmsgResult = GcmsgResult::InvalidArgument;
#[allow(dead_code)]
pub const GCMSG_ERR_SEND_REJECTED: GcmsgResult = GcmsgResult::SendRejected;
#[allow(dead_code)]
pub const GCMSG_ERR_BUFFER_TOO_SMALL: GcmsgResult = GcmsgResult::BufferTooSmall;
#[allow(dead_code)]
pub const GCMSG_ERR_CORRUPT: GcmsgResult = GcmsgResult::Corrupt;
#[allow(dead_code)]
pub const GCMSG_ERR_NOT_LOGGED_ON: GcmsgResult = GcmsgResult::NotLoggedOn;
#[allow(dead_code)]
pub const GCMSG_ERR_INVALID_MESSAGE: GcmsgResult = GcmsgResult::InvalidMessage;
#[allow(dead_code)]
pub const GCMSG_ERR_ENDPOINT: GcmsgResult = GcmsgResult::EndpointError;
#[allow(dead_code)]
pub const GCMSG_ERR_INTERNAL: GcmsgResult = GcmsgResult::Internal;

/// A received message. Payload memory is owned by this library until
/// released with `gcmsg_message_free`.
#[repr(C)]
#[derive(Debug)]
pub struct GcmsgMessage {
    pub msg_type: u32,
    pub data: *mut u8,
    pub len: usize,
}

impl Default for GcmsgMessage {
    fn default() -> Self {
        Self {
            msg_type: 0,
            data: std::ptr::null_mut(),
            len: 0,
        }
    }
}

/// Channel settings. Zero in a size field selects the built-in default.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GcmsgChannelConfig {
    /// Advisory payload ceiling; larger sends are logged, not refused. Zero disables.
    pub advisory_max_payload: usize,
    /// Receive buffers above this capacity are not kept for reuse.
    pub pool_high_water_mark: usize,
    /// Number of idle receive buffers kept for reuse. Zero selects the
    /// default, so retention cannot be switched off here; 1 is the minimum.
    pub pool_max_retained: usize,
    /// When true, an undersized receive is surfaced instead of retried once.
    pub surface_undersized: bool,
}

impl From<&GcmsgChannelConfig> for ChannelConfig {
    fn from(raw: &GcmsgChannelConfig) -> Self {
        let defaults = PoolConfig::default();
        let non_zero = |value: usize, default: usize| if value == 0 { default } else { value };

        Self {
            pool: PoolConfig {
                high_water_mark: non_zero(raw.pool_high_water_mark, defaults.high_water_mark),
                max_retained: non_zero(raw.pool_max_retained, defaults.max_retained),
                min_capacity: defaults.min_capacity,
            },
            advisory_max_payload: (raw.advisory_max_payload != 0).then_some(raw.advisory_max_payload),
            undersized: if raw.surface_undersized {
                UndersizedReceive::Surface
            } else {
                UndersizedReceive::RetryOnce
            },
        }
    }
}

pub type GcmsgChannelHandle = *mut c_void;

/// The session behind a handle is borrowed for as long as the handle lives;
/// the foreign caller upholds that, so the lifetime is erased here.
pub(crate) struct ChannelHandle {
    pub(crate) channel: Channel<NativeEndpoint<'static>>,
}
