use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::debug;

use crate::error::{EndpointError, Result};
use crate::traits::RawEndpoint;
use crate::types::{GcResult, MessageType};

/// `uint32 send(session, msg_type, data, len)`; returns a [`GcResult`] code.
pub type SendMessageFn =
    unsafe extern "C" fn(session: *mut c_void, msg_type: u32, data: *const c_void, len: u32) -> u32;

/// `bool is_message_available(session, *size)`.
pub type IsMessageAvailableFn = unsafe extern "C" fn(session: *mut c_void, size: *mut u32) -> bool;

/// `uint32 retrieve(session, *msg_type, dest, capacity, *size)`; returns a [`GcResult`] code.
pub type RetrieveMessageFn = unsafe extern "C" fn(
    session: *mut c_void,
    msg_type: *mut u32,
    dest: *mut c_void,
    capacity: u32,
    size: *mut u32,
) -> u32;

/// Function table for a native session.
///
/// Layout-compatible with a C struct of three function pointers so foreign
/// callers can hand one over directly. Null entries are allowed in the type
/// but rejected when an endpoint is built from the table.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GcVtable {
    pub send_message: Option<SendMessageFn>,
    pub is_message_available: Option<IsMessageAvailableFn>,
    pub retrieve_message: Option<RetrieveMessageFn>,
}

impl GcVtable {
    /// True when all three entries are present.
    pub fn is_complete(&self) -> bool {
        self.send_message.is_some()
            && self.is_message_available.is_some()
            && self.retrieve_message.is_some()
    }

    /// Table backed by the linked `SteamGC_*` wrapper symbols.
    #[cfg(feature = "steamworks")]
    pub fn steamworks() -> Self {
        Self {
            send_message: Some(steamworks::SteamGC_SendMessage),
            is_message_available: Some(steamworks::SteamGC_IsMessageAvailable),
            retrieve_message: Some(steamworks::SteamGC_RetrieveMessage),
        }
    }
}

#[cfg(feature = "steamworks")]
mod steamworks {
    #![allow(non_snake_case)]

    use std::ffi::c_void;

    extern "C" {
        pub(super) fn SteamGC_SendMessage(
            gc: *mut c_void,
            msg_type: u32,
            data: *const c_void,
            len: u32,
        ) -> u32;
        pub(super) fn SteamGC_IsMessageAvailable(gc: *mut c_void, size: *mut u32) -> bool;
        pub(super) fn SteamGC_RetrieveMessage(
            gc: *mut c_void,
            msg_type: *mut u32,
            dest: *mut c_void,
            capacity: u32,
            size: *mut u32,
        ) -> u32;
    }
}

/// Endpoint over a borrowed native session.
///
/// The session is never owned: it must outlive `'a`, which the unsafe
/// constructor makes the caller promise. The type is neither `Send` nor
/// `Sync`; a native session is driven from one thread.
pub struct NativeEndpoint<'a> {
    session: NonNull<c_void>,
    send_message: SendMessageFn,
    is_message_available: IsMessageAvailableFn,
    retrieve_message: RetrieveMessageFn,
    _session: PhantomData<&'a mut c_void>,
}

impl<'a> NativeEndpoint<'a> {
    /// Bind a session pointer to a function table.
    ///
    /// Returns `None` when `session` is null or the table is incomplete.
    ///
    /// # Safety
    /// `session` must point to a live native session for all of `'a`, and the
    /// table's functions must accept that session pointer.
    pub unsafe fn from_raw(vtable: GcVtable, session: *mut c_void) -> Option<Self> {
        let session = NonNull::new(session)?;
        Some(Self {
            session,
            send_message: vtable.send_message?,
            is_message_available: vtable.is_message_available?,
            retrieve_message: vtable.retrieve_message?,
            _session: PhantomData,
        })
    }

    /// Bind a session pointer to the linked `SteamGC_*` symbols.
    ///
    /// # Safety
    /// Same contract as [`NativeEndpoint::from_raw`]; `gc` must be a live
    /// `ISteamGameCoordinator` instance.
    #[cfg(feature = "steamworks")]
    pub unsafe fn steamworks(gc: *mut c_void) -> Option<Self> {
        // SAFETY: Forwarded caller contract.
        unsafe { Self::from_raw(GcVtable::steamworks(), gc) }
    }

    /// The opaque session pointer.
    pub fn as_ptr(&self) -> *mut c_void {
        self.session.as_ptr()
    }
}

impl RawEndpoint for NativeEndpoint<'_> {
    fn raw_send(&mut self, msg_type: MessageType, data: &[u8]) -> Result<()> {
        let Ok(len) = u32::try_from(data.len()) else {
            return Err(EndpointError::SendRejected {
                msg_type,
                reason: GcResult::InvalidMessage,
            });
        };

        // SAFETY: `session` is live for `'a` per the constructor contract and
        // `data` is readable for `len` bytes for the duration of the call.
        let raw = unsafe {
            (self.send_message)(
                self.session.as_ptr(),
                msg_type.get(),
                data.as_ptr().cast(),
                len,
            )
        };

        match GcResult::from_raw(raw) {
            GcResult::Ok => Ok(()),
            reason => {
                debug!(%msg_type, %reason, len, "native send rejected");
                Err(EndpointError::SendRejected { msg_type, reason })
            }
        }
    }

    fn raw_poll(&mut self) -> Option<usize> {
        let mut size: u32 = 0;
        // SAFETY: `session` is live and `size` is a valid writable u32.
        let available = unsafe { (self.is_message_available)(self.session.as_ptr(), &mut size) };
        available.then_some(size as usize)
    }

    fn raw_receive(&mut self, msg_type: &mut MessageType, buffer: &mut [u8]) -> Result<usize> {
        // The native side cannot address more than u32::MAX bytes.
        let capacity = buffer.len().min(u32::MAX as usize);
        let mut raw_type: u32 = 0;
        let mut size: u32 = 0;

        // SAFETY: `session` is live, `buffer` is writable for `capacity` bytes,
        // and both out-params are valid writable u32s.
        let raw = unsafe {
            (self.retrieve_message)(
                self.session.as_ptr(),
                &mut raw_type,
                buffer.as_mut_ptr().cast(),
                capacity as u32,
                &mut size,
            )
        };

        let written = size as usize;
        match GcResult::from_raw(raw) {
            GcResult::Ok if written > capacity => Err(EndpointError::Corrupt {
                expected: capacity,
                written,
            }),
            GcResult::Ok => {
                *msg_type = MessageType(raw_type);
                Ok(written)
            }
            status => {
                debug!(%status, capacity, required = written, "native receive failed");
                Err(EndpointError::from_receive_status(status, capacity, written))
            }
        }
    }
}

impl std::fmt::Debug for NativeEndpoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEndpoint")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
