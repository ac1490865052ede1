use std::ffi::c_void;

use gcmsg_channel::Channel;
use gcmsg_endpoint::{GcVtable, MessageType, NativeEndpoint};
use tracing::debug;

use crate::args;
use crate::error;
use crate::message::write_message_out;
use crate::types::{
    ChannelHandle, GcmsgChannelConfig, GcmsgChannelHandle, GcmsgMessage, GcmsgResult,
};

fn with_channel_mut<T>(
    handle: GcmsgChannelHandle,
    on_error: T,
    f: impl FnOnce(&mut ChannelHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("channel handle cannot be null");
        return on_error;
    }

    let channel_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut ChannelHandle) }
    };

    f(channel_handle)
}

/// Create a channel over a native session.
///
/// Returns null (with `gcmsg_last_error` set) when `vtable` is null or
/// incomplete or `session` is null. A null `config` selects defaults.
///
/// # Safety
/// `vtable` must point to a readable `GcVtable` whose functions accept `session`.
/// `session` must stay valid until the returned handle is freed with
/// `gcmsg_channel_free`. `config` must be null or point to a readable
/// `GcmsgChannelConfig`.
#[no_mangle]
pub unsafe extern "C" fn gcmsg_channel_new(
    vtable: *const GcVtable,
    session: *mut c_void,
    config: *const GcmsgChannelConfig,
) -> GcmsgChannelHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        let vtable = {
            // SAFETY: We validate null and completeness in helper.
            match unsafe { args::vtable_arg(vtable) } {
                Some(v) => v,
                None => return std::ptr::null_mut(),
            }
        };

        // SAFETY: Null is handled in helper; otherwise readable per caller contract.
        let config = unsafe { args::config_arg(config) };

        // SAFETY: The caller keeps `session` alive until `gcmsg_channel_free`.
        let endpoint = match unsafe { NativeEndpoint::from_raw(vtable, session) } {
            Some(endpoint) => endpoint,
            None => {
                let _ = error::set_invalid_argument("session cannot be null");
                return std::ptr::null_mut();
            }
        };

        debug!(session = ?endpoint.as_ptr(), "channel created");
        let handle = ChannelHandle {
            channel: Channel::with_config(endpoint, (&config).into()),
        };
        Box::into_raw(Box::new(handle)) as GcmsgChannelHandle
    })
}

/// Create a channel bound to the linked game-coordinator wrapper symbols.
///
/// # Safety
/// `gc` must be a live `ISteamGameCoordinator` pointer that stays valid until
/// the returned handle is freed. `config` must be null or readable.
#[cfg(feature = "steamworks")]
#[no_mangle]
pub unsafe extern "C" fn gcmsg_channel_new_steamworks(
    gc: *mut c_void,
    config: *const GcmsgChannelConfig,
) -> GcmsgChannelHandle {
    let vtable = GcVtable::steamworks();
    // SAFETY: Forwarded caller contract; `vtable` lives on this stack frame.
    unsafe { gcmsg_channel_new(&vtable, gc, config) }
}

/// Send one message.
///
/// # Safety
/// `channel` must be a valid channel handle. If `len > 0`, `data` must be non-null and
/// readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn gcmsg_channel_send(
    channel: GcmsgChannelHandle,
    msg_type: u32,
    data: *const u8,
    len: usize,
) -> GcmsgResult {
    crate::ffi_boundary(GcmsgResult::Internal, || {
        error::clear_error_state();

        let payload = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::bytes_arg(data, len, "data") } {
                Some(v) => v,
                None => return GcmsgResult::InvalidArgument,
            }
        };

        with_channel_mut(channel, GcmsgResult::InvalidArgument, |handle| {
            match handle.channel.send_raw(MessageType(msg_type), payload) {
                Ok(()) => GcmsgResult::Ok,
                Err(err) => error::map_endpoint_error(&err),
            }
        })
    })
}

/// Receive the next queued message without blocking.
///
/// Returns `GCMSG_NO_MESSAGE` when nothing is queued, leaving `out_message` untouched.
///
/// # Safety
/// `channel` must be a valid channel handle and `out_message` must be a valid writable pointer.
/// If `out_message->data` already contains a prior payload from this library, it is freed first.
#[no_mangle]
pub unsafe extern "C" fn gcmsg_channel_try_receive(
    channel: GcmsgChannelHandle,
    out_message: *mut GcmsgMessage,
) -> GcmsgResult {
    crate::ffi_boundary(GcmsgResult::Internal, || {
        error::clear_error_state();

        if out_message.is_null() {
            return error::set_invalid_argument("out_message cannot be null");
        }

        with_channel_mut(channel, GcmsgResult::InvalidArgument, |handle| {
            match handle.channel.try_receive() {
                Ok(Some(envelope)) => {
                    let message = {
                        // SAFETY: Pointer was checked for null above.
                        unsafe { &mut *out_message }
                    };
                    write_message_out(message, envelope.msg_type().get(), envelope.payload());
                    GcmsgResult::Ok
                }
                Ok(None) => GcmsgResult::NoMessage,
                Err(err) => error::map_endpoint_error(&err),
            }
        })
    })
}

/// Free a channel handle. The native session itself is not touched.
///
/// # Safety
/// `channel` must be null or a handle returned by `gcmsg_channel_new`.
#[no_mangle]
pub unsafe extern "C" fn gcmsg_channel_free(channel: GcmsgChannelHandle) {
    crate::ffi_boundary((), || {
        if channel.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by gcmsg_channel_new.
        unsafe {
            drop(Box::from_raw(channel as *mut ChannelHandle));
        }
    });
}
