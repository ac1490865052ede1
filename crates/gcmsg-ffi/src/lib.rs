//! gcmsg-ffi: C-ABI exports for gcmsg channels.
//!
//! A foreign caller supplies the three native primitives as a [`GcVtable`]
//! plus an opaque session pointer, and gets back a channel handle with
//! pooled, size-checked send/receive.

mod args;
mod channel;
mod error;
mod message;
mod types;

use std::panic::AssertUnwindSafe;

#[cfg(feature = "steamworks")]
pub use channel::gcmsg_channel_new_steamworks;
pub use channel::{
    gcmsg_channel_free, gcmsg_channel_new, gcmsg_channel_send, gcmsg_channel_try_receive,
};
pub use gcmsg_endpoint::GcVtable;
pub use message::gcmsg_message_free;
pub use types::{
    GcmsgChannelConfig, GcmsgChannelHandle, GcmsgMessage, GcmsgResult, GCMSG_ERR_BUFFER_TOO_SMALL,
    GCMSG_ERR_CORRUPT, GCMSG_ERR_ENDPOINT, GCMSG_ERR_INTERNAL, GCMSG_ERR_INVALID_ARGUMENT,
    GCMSG_ERR_INVALID_MESSAGE, GCMSG_ERR_NOT_LOGGED_ON, GCMSG_ERR_SEND_REJECTED, GCMSG_NO_MESSAGE,
    GCMSG_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn gcmsg_init() -> GcmsgResult {
    ffi_boundary(GcmsgResult::Internal, || {
        error::clear_error_state();
        GcmsgResult::Ok
    })
}

#[no_mangle]
pub extern "C" fn gcmsg_cleanup() {
    ffi_boundary((), || {
        error::clear_error_state();
    });
}

/// Human-readable description of the last failure on this thread.
#[no_mangle]
pub extern "C" fn gcmsg_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

/// Raw native status code behind the last failure on this thread (0 when none).
#[no_mangle]
pub extern "C" fn gcmsg_last_native_status() -> u32 {
    ffi_boundary(0, error::last_status)
}
