//! Common utilities for the libgphoto2 bindings
//!
//! This module provides:
//! - Safe C string conversion in both directions
//! - A timeout wrapper for async supervision of blocking camera calls
//!
//! Raw pointer readers stay inside the crate:
//!
//! ```compile_fail
//! let text = b"IMG_0001.JPG\0";
//! nightshade_gphoto::utils::safe_cstr_to_string(text.as_ptr().cast(), 13);
//! ```

use crate::error::{GphotoError, GphotoResult};
use std::ffi::{c_char, CStr, CString};
use std::time::Duration;

// =============================================================================
// SAFE STRING CONVERSION
// =============================================================================

/// Safely convert a C string pointer to a Rust String with bounds checking.
///
/// This function:
/// 1. Handles null pointers gracefully (returns empty string)
/// 2. Enforces a maximum length to prevent buffer overruns
/// 3. Finds the null terminator safely within the bounded slice
/// 4. Uses lossy UTF-8 conversion for robustness
///
/// # Safety
/// The caller must ensure that `ptr` points to valid memory of at least `max_len` bytes
/// if `ptr` is not null.
pub(crate) unsafe fn safe_cstr_to_string(ptr: *const c_char, max_len: usize) -> String {
    if ptr.is_null() {
        return String::new();
    }

    let slice = std::slice::from_raw_parts(ptr as *const u8, max_len);
    let null_pos = slice.iter().position(|&c| c == 0).unwrap_or(max_len);
    String::from_utf8_lossy(&slice[..null_pos]).to_string()
}

/// Safely convert a fixed-size C char array to a Rust String.
///
/// Used for the `name`/`folder` arrays of `CameraFilePath`.
pub fn safe_char_array_to_string<const N: usize>(arr: &[c_char; N]) -> String {
    // SAFETY: the array is exactly N bytes long.
    unsafe { safe_cstr_to_string(arr.as_ptr(), N) }
}

/// Convert a NUL-terminated string owned by libgphoto2 (list entries, result
/// descriptions). Null becomes an empty string.
///
/// # Safety
/// A non-null `ptr` must point to a NUL-terminated string that stays valid for
/// the duration of the call.
pub(crate) unsafe fn cstr_ptr_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Build a C string for a camera path component, rejecting interior NULs.
pub fn to_cstring(value: &str, what: &str) -> GphotoResult<CString> {
    CString::new(value)
        .map_err(|_| GphotoError::InvalidPath(format!("{} contains a NUL byte: {:?}", what, value)))
}

// =============================================================================
// TIMEOUT UTILITIES
// =============================================================================

/// Execute an async operation with a timeout.
///
/// Camera calls block on USB I/O and cannot be interrupted, so the supervising
/// side gives up waiting instead.
pub async fn with_timeout<T, F, Fut>(
    operation: F,
    timeout: Duration,
    operation_name: impl Into<String>,
) -> GphotoResult<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = GphotoResult<T>>,
{
    let name = operation_name.into();
    match tokio::time::timeout(timeout, operation()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Operation '{}' timed out after {:?}", name, timeout);
            Err(GphotoError::OperationTimeout {
                operation: name,
                duration: timeout,
            })
        }
    }
}
