//! C ABI - refcount and error-slot entry points for native callers
//!
//! Objects cross the boundary as data pointers (first payload byte), the same
//! pointer destructors receive. Null pointers are no-ops that record
//! `InvalidArgument`; error codes follow `ErrorKind::code`, 0 meaning none.

use core::ptr::NonNull;

use crate::error::{clear_last_error, last_error, set_last_error, ErrorKind};
use crate::logging::debug;
use crate::object::Object;

#[inline]
fn non_null(obj: *const u8, op: &str) -> Option<NonNull<u8>> {
    let ptr = NonNull::new(obj as *mut u8);
    if ptr.is_none() {
        debug!(operation = op, "null object passed over C ABI");
        set_last_error(ErrorKind::InvalidArgument);
    }
    ptr
}

/// Add a reference
///
/// # Safety
/// - Null-safe (no-op, records `InvalidArgument`)
/// - Otherwise `obj` must be the data pointer of a live object
#[no_mangle]
pub unsafe extern "C" fn objcore_object_retain(obj: *mut u8) {
    if let Some(data) = non_null(obj, "retain") {
        Object::retain_raw(data);
    }
}

/// Drop a reference; the last one destroys the object
///
/// # Safety
/// - Null-safe (no-op, records `InvalidArgument`)
/// - Caller must own the reference it gives up; `obj` may dangle afterwards
#[no_mangle]
pub unsafe extern "C" fn objcore_object_release(obj: *mut u8) {
    if let Some(data) = non_null(obj, "release") {
        Object::release_raw(data);
    }
}

/// Current count, 0 for null
///
/// # Safety
/// `obj` must be null or the data pointer of a live object.
#[no_mangle]
pub unsafe extern "C" fn objcore_object_refcount(obj: *const u8) -> u32 {
    match non_null(obj, "refcount") {
        Some(data) => Object::refcount_raw(data),
        None => 0,
    }
}

/// Code of the last failure on the calling thread
#[no_mangle]
pub extern "C" fn objcore_last_error() -> i32 {
    last_error().map_or(0, |kind| kind.code())
}

#[no_mangle]
pub extern "C" fn objcore_clear_last_error() {
    clear_last_error();
}

/// Initialize logging and the global registry from the environment.
///
/// Returns 0 on success, otherwise the error code.
#[no_mangle]
pub extern "C" fn objcore_runtime_init() -> i32 {
    match crate::init() {
        Ok(()) => 0,
        Err(err) => err.kind().code(),
    }
}

/// Close the global registry; a no-op when it is not open
#[no_mangle]
pub extern "C" fn objcore_runtime_cleanup() {
    debug!("runtime cleanup requested over C ABI");
    // Cleanup of a closed runtime leaves the caller's error slot alone
    if let Err(err) = crate::error::probe(crate::shutdown) {
        debug!(error = %err, "runtime cleanup skipped");
    }
}
