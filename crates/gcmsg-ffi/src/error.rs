use std::cell::{Cell, RefCell};
use std::ffi::CString;
use std::os::raw::c_char;

use gcmsg_endpoint::{EndpointError, GcResult};

use crate::types::GcmsgResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::new("").expect("empty CString should be valid"));
    static LAST_STATUS: Cell<u32> = const { Cell::new(0) };
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new("").expect("empty CString should be valid");
    });
    LAST_STATUS.with(|status| status.set(GcResult::Ok.as_raw()));
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized)
            .unwrap_or_else(|_| CString::new("internal error").expect("literal is valid"));
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> GcmsgResult {
    set_error_message(message);
    GcmsgResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_endpoint_error(err: &EndpointError) -> GcmsgResult {
    set_error_message(err.to_string());
    let status = match err {
        EndpointError::SendRejected { reason, .. } => *reason,
        EndpointError::BufferTooSmall { .. } => GcResult::BufferTooSmall,
        EndpointError::NoMessage => GcResult::NoMessage,
        EndpointError::NotLoggedOn => GcResult::NotLoggedOn,
        EndpointError::InvalidMessage => GcResult::InvalidMessage,
        EndpointError::Unknown(code) => GcResult::Unknown(*code),
        // Corruption is detected by the channel; the native call itself succeeded.
        EndpointError::Corrupt { .. } => GcResult::Ok,
    };
    LAST_STATUS.with(|last| last.set(status.as_raw()));

    match err {
        EndpointError::SendRejected { .. } => GcmsgResult::SendRejected,
        EndpointError::BufferTooSmall { .. } => GcmsgResult::BufferTooSmall,
        EndpointError::Corrupt { .. } => GcmsgResult::Corrupt,
        EndpointError::NoMessage => GcmsgResult::NoMessage,
        EndpointError::NotLoggedOn => GcmsgResult::NotLoggedOn,
        EndpointError::InvalidMessage => GcmsgResult::InvalidMessage,
        EndpointError::Unknown(_) => GcmsgResult::EndpointError,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}

pub(crate) fn last_status() -> u32 {
    LAST_STATUS.with(Cell::get)
}
