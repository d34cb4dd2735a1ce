//! gphoto error types
//!
//! libgphoto2 reports failures as negative status codes. Codes coming from the
//! port subsystem (`gp_port_*`) must be decoded with the port decoder, every
//! other code with the general one, so the two are kept as separate variants.

use crate::ffi::Gphoto2Sdk;
use std::ffi::c_int;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the camera bindings
#[derive(Debug, Error)]
pub enum GphotoError {
    /// General libgphoto2 status code
    #[error("{}", render(.context, .description))]
    Library {
        code: i32,
        description: String,
        context: Option<String>,
    },

    /// Port-subsystem status code
    #[error("{}", render(.context, .description))]
    Port {
        code: i32,
        description: String,
        context: Option<String>,
    },

    #[error("libgphoto2 not loaded: {0}")]
    SdkNotLoaded(String),

    #[error("Invalid camera path: {0}")]
    InvalidPath(String),

    /// The native fetch for this reader failed on an earlier read
    #[error("Transfer of {path} already failed; the reader is no longer usable")]
    TransferFailed { path: String },

    /// The transfer stopped short of the size the camera declared
    #[error("Transfer of {path} ended after {received} of {expected} bytes")]
    TransferIncomplete {
        path: String,
        expected: u64,
        received: u64,
    },

    #[error("Timeout: {operation} did not complete within {duration:?}")]
    OperationTimeout { operation: String, duration: Duration },

    #[error("Camera task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[source] io::Error),
}

fn render(context: &Option<String>, description: &str) -> String {
    match context {
        Some(context) => format!("{} ({})", context, description),
        None => description.to_string(),
    }
}

impl GphotoError {
    /// Build a general error, decoding `code` through `gp_result_as_string`.
    pub(crate) fn library(sdk: &Gphoto2Sdk, code: c_int, context: Option<&str>) -> Self {
        GphotoError::Library {
            code,
            description: sdk.describe(code),
            context: context.map(str::to_string),
        }
    }

    /// Build a port error, decoding `code` through `gp_port_result_as_string`.
    pub(crate) fn port(sdk: &Gphoto2Sdk, code: c_int, context: Option<&str>) -> Self {
        GphotoError::Port {
            code,
            description: sdk.describe_port(code),
            context: context.map(str::to_string),
        }
    }

    /// Native status code, if this error came from libgphoto2.
    pub fn code(&self) -> Option<i32> {
        match self {
            GphotoError::Library { code, .. } | GphotoError::Port { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_port_error(&self) -> bool {
        matches!(self, GphotoError::Port { .. })
    }

    /// Message attached by the failing call site, if any.
    pub fn context(&self) -> Option<&str> {
        match self {
            GphotoError::Library { context, .. } | GphotoError::Port { context, .. } => context.as_deref(),
            _ => None,
        }
    }
}

impl From<io::Error> for GphotoError {
    /// Unwraps errors that the reader's `io::Read` impl boxed into an `io::Error`.
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<GphotoError>()) {
            return GphotoError::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<GphotoError>()) {
            Some(Ok(native)) => *native,
            Some(Err(other)) => GphotoError::Io(io::Error::new(kind, other)),
            None => GphotoError::Io(io::Error::from(kind)),
        }
    }
}

/// Result type for camera operations
pub type GphotoResult<T> = Result<T, GphotoError>;

/// Error from [`CameraFile::read_chunk`](crate::CameraFile::read_chunk).
///
/// `bytes_read` counts bytes that were copied into the caller's buffer by the
/// failing call. It is non-zero when the last chunk was delivered but the
/// post-download delete failed.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ReadError {
    pub bytes_read: usize,
    pub source: GphotoError,
}

impl ReadError {
    pub(crate) fn new(bytes_read: usize, source: GphotoError) -> Self {
        Self { bytes_read, source }
    }
}

/// Check a general libgphoto2 status. Non-negative values (counts, indices) pass through.
pub(crate) fn check(sdk: &Gphoto2Sdk, result: c_int, context: &str) -> GphotoResult<c_int> {
    if result < 0 {
        return Err(GphotoError::library(sdk, result, Some(context)));
    }
    Ok(result)
}

/// Check a port-subsystem status.
pub(crate) fn check_port(sdk: &Gphoto2Sdk, result: c_int, context: &str) -> GphotoResult<c_int> {
    if result < 0 {
        return Err(GphotoError::port(sdk, result, Some(context)));
    }
    Ok(result)
}
