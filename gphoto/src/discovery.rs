//! Context and camera autodetection

use crate::camera::Camera;
use crate::error::{check, GphotoError, GphotoResult};
use crate::ffi::{self, Gphoto2Sdk};
use crate::handle::{ContextKind, ListKind, NativeHandle};
use std::fmt;
use std::sync::Arc;

/// Shared `GPContext`.
///
/// Every camera returned by one discovery call holds an `Arc` to the same
/// context; the native context is unreferenced when the last camera goes away.
pub struct Context {
    handle: NativeHandle<ContextKind>,
}

impl Context {
    /// Create a context on the process-wide libgphoto2 instance.
    pub fn new() -> GphotoResult<Arc<Self>> {
        Self::with_sdk(Gphoto2Sdk::get()?)
    }

    pub fn with_sdk(sdk: Arc<Gphoto2Sdk>) -> GphotoResult<Arc<Self>> {
        let raw = unsafe { (sdk.context_new)() };
        let handle = NativeHandle::from_raw(Arc::clone(&sdk), raw)
            .ok_or_else(|| GphotoError::library(&sdk, ffi::GP_ERROR_NO_MEMORY, Some("unable to create context")))?;
        Ok(Arc::new(Self { handle }))
    }

    pub(crate) fn as_ptr(&self) -> *mut ffi::GPContext {
        self.handle.as_ptr()
    }

    pub(crate) fn sdk(&self) -> &Arc<Gphoto2Sdk> {
        self.handle.sdk()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("raw", &self.handle.as_ptr()).finish()
    }
}

/// Detect attached cameras using the process-wide libgphoto2 instance.
pub fn list_cameras() -> GphotoResult<Vec<Camera>> {
    list_cameras_with(Gphoto2Sdk::get()?)
}

/// Detect attached cameras against an explicitly loaded library.
///
/// All returned cameras share one context. No camera is opened here; each
/// negotiates its session on first use.
pub fn list_cameras_with(sdk: Arc<Gphoto2Sdk>) -> GphotoResult<Vec<Camera>> {
    let context = Context::with_sdk(Arc::clone(&sdk))?;
    let list = NativeHandle::<ListKind>::new_list(&sdk)?;

    check(
        &sdk,
        unsafe { (sdk.camera_autodetect)(list.as_ptr(), context.as_ptr()) },
        "unable to autodetect cameras",
    )?;

    let count = list.len()?;
    let mut cameras = Vec::with_capacity(count);
    for index in 0..count {
        let model = list.name(index)?;
        let port = list.value(index)?;
        tracing::debug!("Detected camera {} on {}", model, port);
        cameras.push(Camera::new(model, port, Arc::clone(&context)));
    }

    tracing::info!("Discovered {} gphoto2 camera(s)", cameras.len());
    Ok(cameras)
}
