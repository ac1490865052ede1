use std::ptr;

use crate::types::GcmsgMessage;

/// Free payload memory held by a [`GcmsgMessage`] populated by receive APIs.
///
/// # Safety
/// `message` must be either null or a valid pointer to a `GcmsgMessage` created by caller code.
/// If `message->data` is non-null, it must have originated from this library.
#[no_mangle]
pub unsafe extern "C" fn gcmsg_message_free(message: *mut GcmsgMessage) {
    crate::ffi_boundary((), || {
        if message.is_null() {
            return;
        }

        let message_ref = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *message }
        };

        release_payload(message_ref);
    });
}

/// Drop a payload previously handed out by this library and reset the struct.
pub(crate) fn release_payload(message: &mut GcmsgMessage) {
    if !message.data.is_null() {
        let slice_ptr = ptr::slice_from_raw_parts_mut(message.data, message.len);
        // SAFETY: `data` was allocated as a `Box<[u8]>` of `len` bytes by `write_message_out`.
        unsafe {
            drop(Box::from_raw(slice_ptr));
        }
    }

    *message = GcmsgMessage::default();
}

/// Copy a received payload into caller-visible memory, freeing any prior payload.
pub(crate) fn write_message_out(message: &mut GcmsgMessage, msg_type: u32, payload: &[u8]) {
    release_payload(message);

    let boxed_payload: Box<[u8]> = payload.to_vec().into_boxed_slice();
    let len = boxed_payload.len();
    let data = if len == 0 {
        ptr::null_mut()
    } else {
        Box::into_raw(boxed_payload) as *mut u8
    };

    message.msg_type = msg_type;
    message.data = data;
    message.len = len;
}
