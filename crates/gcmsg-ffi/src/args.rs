use gcmsg_endpoint::GcVtable;

use crate::error;
use crate::types::GcmsgChannelConfig;

/// Convert an optional byte pointer + length into a slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` bytes.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, name: &str) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when len > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Copy a required function table out of caller memory.
///
/// # Safety
/// `vtable` must be null or point to a readable `GcVtable`.
pub(crate) unsafe fn vtable_arg(vtable: *const GcVtable) -> Option<GcVtable> {
    if vtable.is_null() {
        let _ = error::set_invalid_argument("vtable cannot be null");
        return None;
    }

    // SAFETY: Non-null pointer to caller-owned, readable memory.
    let table = unsafe { *vtable };
    if !table.is_complete() {
        let _ = error::set_invalid_argument("vtable entries cannot be null");
        return None;
    }
    Some(table)
}

/// Copy an optional config out of caller memory; null selects defaults.
///
/// # Safety
/// `config` must be null or point to a readable `GcmsgChannelConfig`.
pub(crate) unsafe fn config_arg(config: *const GcmsgChannelConfig) -> GcmsgChannelConfig {
    if config.is_null() {
        return GcmsgChannelConfig::default();
    }

    // SAFETY: Non-null pointer to caller-owned, readable memory.
    unsafe { *config }
}
