//! The C ABI every stage module exports, and the conventions around it.
//!
//! Five symbols, resolvable by name from a dynamically loaded module:
//! `plugin_init`, `plugin_attach`, `plugin_place_work`, `plugin_wait_finished`,
//! `plugin_fini`. Every one of them returns an "optional error string": a
//! null pointer on success, or a `CString` pointer on failure. Per §6, there
//! is no ownership transfer — the caller reads the string immediately with
//! [`read_optional_error`] and never frees the pointer itself. The plugin
//! side intentionally leaks the `CString` (see [`leak_error`]); the pointer
//! is only ever read once, a handful of times over a process lifetime, and
//! a cross-dylib `free` would assume a shared allocator that the ABI does
//! not guarantee.
//!
//! These are plain `extern "C"` function pointers rather than trait objects,
//! so they cross a `dlopen` boundary safely: each loaded module is assumed
//! to hold exactly one static instance of its stage (the "one global
//! context" pattern described in the design notes), and `plugin_attach`
//! receives the *next* stage's `plugin_place_work` pointer directly, with no
//! accompanying context pointer needed.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// `plugin_init(queue_size) -> optional error string`
pub type PluginInitFn = unsafe extern "C" fn(queue_size: usize) -> *mut c_char;

/// `plugin_attach(next_place_work)`
pub type PluginAttachFn = unsafe extern "C" fn(next: PlaceWorkFn);

/// `plugin_place_work(ptr, len) -> optional error string`
///
/// The caller retains ownership of `ptr`/`len`; the callee must copy the
/// bytes before returning (this is the ABI-level expression of the
/// Channel's deep-copy-on-`put` rule).
pub type PlaceWorkFn = unsafe extern "C" fn(ptr: *const u8, len: usize) -> *mut c_char;

/// `plugin_wait_finished() -> optional error string`
pub type PluginWaitFinishedFn = unsafe extern "C" fn() -> *mut c_char;

/// `plugin_fini() -> optional error string`
pub type PluginFiniFn = unsafe extern "C" fn() -> *mut c_char;

/// Returns the "no error" sentinel.
pub fn no_error() -> *mut c_char {
    std::ptr::null_mut()
}

/// Leaks `message` as a C string for return across the ABI boundary.
pub fn leak_error(message: impl Into<String>) -> *mut c_char {
    let message = message.into();
    let cstring = CString::new(message).unwrap_or_else(|_| {
        CString::new("stage error message contained an embedded NUL byte")
            .expect("fallback message is NUL-free")
    });
    cstring.into_raw()
}

/// Reads the optional error string convention. `ptr` is never freed: it is
/// either `null` or a leaked, process-lifetime pointer (see module docs).
///
/// # Safety
/// `ptr` must be either null or a valid, NUL-terminated `CString` pointer
/// produced by [`leak_error`] (directly, or relayed across a `dlopen`
/// boundary by a module in this workspace).
pub unsafe fn read_optional_error(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}
