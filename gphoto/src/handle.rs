//! Owned native resources
//!
//! Every libgphoto2 object this crate allocates is held in a [`NativeHandle`].
//! The handle releases its pointer exactly once: either explicitly through
//! [`NativeHandle::release`] or when the owner goes out of scope. After release
//! the pointer is nulled and further releases are no-ops.
//!
//! Handles keep an `Arc` to the SDK table that allocated them, so the library
//! cannot be unloaded while a handle is alive.

use crate::error::{check, check_port, GphotoError, GphotoResult};
use crate::ffi::{self, Gphoto2Sdk, GP_ERROR_NO_MEMORY};
use crate::utils::cstr_ptr_to_string;
use std::ffi::{c_char, c_int};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::Arc;

/// One kind of libgphoto2 object and how to release it.
pub(crate) trait NativeKind {
    type Raw;

    const NAME: &'static str;

    /// Allocation failures of this kind decode through the port decoder.
    const PORT_SUBSYSTEM: bool = false;

    /// # Safety
    /// `raw` must be a live pointer of this kind that nobody else will release.
    unsafe fn release(sdk: &Gphoto2Sdk, raw: *mut Self::Raw);
}

pub(crate) struct ContextKind;

impl NativeKind for ContextKind {
    type Raw = ffi::GPContext;
    const NAME: &'static str = "context";

    unsafe fn release(sdk: &Gphoto2Sdk, raw: *mut Self::Raw) {
        (sdk.context_unref)(raw);
    }
}

pub(crate) struct CameraKind;

impl NativeKind for CameraKind {
    type Raw = ffi::Camera;
    const NAME: &'static str = "camera";

    unsafe fn release(sdk: &Gphoto2Sdk, raw: *mut Self::Raw) {
        let _ = (sdk.camera_unref)(raw);
    }
}

pub(crate) struct FileKind;

impl NativeKind for FileKind {
    type Raw = ffi::CameraFile;
    const NAME: &'static str = "file";

    unsafe fn release(sdk: &Gphoto2Sdk, raw: *mut Self::Raw) {
        let _ = (sdk.file_free)(raw);
    }
}

pub(crate) struct ListKind;

impl NativeKind for ListKind {
    type Raw = ffi::CameraList;
    const NAME: &'static str = "list";

    unsafe fn release(sdk: &Gphoto2Sdk, raw: *mut Self::Raw) {
        let _ = (sdk.list_unref)(raw);
    }
}

pub(crate) struct AbilitiesListKind;

impl NativeKind for AbilitiesListKind {
    type Raw = ffi::CameraAbilitiesList;
    const NAME: &'static str = "abilities list";

    unsafe fn release(sdk: &Gphoto2Sdk, raw: *mut Self::Raw) {
        let _ = (sdk.abilities_list_free)(raw);
    }
}

pub(crate) struct PortInfoListKind;

impl NativeKind for PortInfoListKind {
    type Raw = ffi::GPPortInfoList;
    const NAME: &'static str = "port info list";
    const PORT_SUBSYSTEM: bool = true;

    unsafe fn release(sdk: &Gphoto2Sdk, raw: *mut Self::Raw) {
        let _ = (sdk.port_info_list_free)(raw);
    }
}

/// Exclusive owner of one libgphoto2 pointer.
pub(crate) struct NativeHandle<K: NativeKind> {
    raw: *mut K::Raw,
    sdk: Arc<Gphoto2Sdk>,
    kind: PhantomData<K>,
}

// The pointer is only dereferenced by libgphoto2. Only the context is shared
// between threads; every other object belongs to one caller at a time.
unsafe impl<K: NativeKind> Send for NativeHandle<K> {}
unsafe impl Sync for NativeHandle<ContextKind> {}

impl<K: NativeKind> NativeHandle<K> {
    /// Take ownership of `raw`. Returns `None` for a null pointer.
    pub(crate) fn from_raw(sdk: Arc<Gphoto2Sdk>, raw: *mut K::Raw) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        Some(Self {
            raw,
            sdk,
            kind: PhantomData,
        })
    }

    /// Run a `gp_*_new(&out)` style allocator and wrap the result.
    pub(crate) fn allocate<F>(sdk: &Arc<Gphoto2Sdk>, context: &str, allocator: F) -> GphotoResult<Self>
    where
        F: FnOnce(*mut *mut K::Raw) -> c_int,
    {
        let mut raw: *mut K::Raw = ptr::null_mut();
        let result = allocator(ptr::addr_of_mut!(raw));
        if K::PORT_SUBSYSTEM {
            check_port(sdk, result, context)?;
        } else {
            check(sdk, result, context)?;
        }
        Self::from_raw(Arc::clone(sdk), raw).ok_or_else(|| {
            if K::PORT_SUBSYSTEM {
                GphotoError::port(sdk, GP_ERROR_NO_MEMORY, Some(context))
            } else {
                GphotoError::library(sdk, GP_ERROR_NO_MEMORY, Some(context))
            }
        })
    }

    pub(crate) fn as_ptr(&self) -> *mut K::Raw {
        self.raw
    }

    pub(crate) fn sdk(&self) -> &Arc<Gphoto2Sdk> {
        &self.sdk
    }

    /// Release the native object now. Idempotent.
    pub(crate) fn release(&mut self) {
        if self.raw.is_null() {
            return;
        }
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        // SAFETY: `raw` was non-null and owned by this handle; it is nulled before release.
        unsafe { K::release(&self.sdk, raw) };
        tracing::debug!("Released libgphoto2 {}", K::NAME);
    }
}

impl<K: NativeKind> Drop for NativeHandle<K> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<K: NativeKind> fmt::Debug for NativeHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("kind", &K::NAME)
            .field("raw", &self.raw)
            .finish()
    }
}

// =============================================================================
// CAMERA LIST
// =============================================================================

impl NativeHandle<ListKind> {
    pub(crate) fn new_list(sdk: &Arc<Gphoto2Sdk>) -> GphotoResult<Self> {
        Self::allocate(sdk, "unable to create list", |raw| unsafe { (sdk.list_new)(raw) })
    }

    pub(crate) fn len(&self) -> GphotoResult<usize> {
        let count = check(&self.sdk, unsafe { (self.sdk.list_count)(self.raw) }, "unable to count list entries")?;
        Ok(count as usize)
    }

    pub(crate) fn name(&self, index: usize) -> GphotoResult<String> {
        self.entry(index, self.sdk.list_get_name, "unable to read list entry name")
    }

    pub(crate) fn value(&self, index: usize) -> GphotoResult<String> {
        self.entry(index, self.sdk.list_get_value, "unable to read list entry value")
    }

    /// All entry names, in list order.
    pub(crate) fn names(&self) -> GphotoResult<Vec<String>> {
        (0..self.len()?).map(|index| self.name(index)).collect()
    }

    fn entry(
        &self,
        index: usize,
        getter: unsafe extern "C" fn(*mut ffi::CameraList, c_int, *mut *const c_char) -> c_int,
        context: &str,
    ) -> GphotoResult<String> {
        let index = c_int::try_from(index)
            .map_err(|_| GphotoError::library(&self.sdk, ffi::GP_ERROR_BAD_PARAMETERS, Some(context)))?;
        let mut text: *const c_char = ptr::null();
        check(&self.sdk, unsafe { getter(self.raw, index, &mut text) }, context)?;
        // The list owns the string; copy it out before the list goes away.
        Ok(unsafe { cstr_ptr_to_string(text) })
    }
}
