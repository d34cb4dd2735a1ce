//! Camera identity and lazily negotiated session
//!
//! A [`Camera`] is only a `(model, port)` pair plus the shared [`Context`]
//! until something needs the device. The first operation allocates a native
//! camera, binds the driver abilities for the model and the port info for the
//! port, and caches the result for the lifetime of the `Camera`.
//!
//! Negotiation either completes or leaves nothing behind: a failure at any
//! step drops the half-configured native camera and a later call starts over.
//! A cached session is never renegotiated; if the device is unplugged, the
//! next operation fails and the caller should rediscover.

use crate::discovery::Context;
use crate::error::{check, check_port, GphotoResult};
use crate::ffi::{self, CameraAbilities};
use crate::handle::{AbilitiesListKind, CameraKind, NativeHandle, PortInfoListKind};
use crate::utils::to_cstring;
use std::cell::OnceCell;
use std::fmt;
use std::ptr;
use std::sync::Arc;

/// A detected camera.
///
/// `Camera` is `Send` but not `Sync`: libgphoto2's per-camera state is not
/// reentrant, so sharing one across threads needs external locking (see
/// [`SupervisedCamera`](crate::SupervisedCamera)). Readers borrowed from a
/// camera are not `Send` either.
pub struct Camera {
    // Declared first so the session is released before the context reference.
    session: OnceCell<NativeHandle<CameraKind>>,
    model: String,
    port: String,
    context: Arc<Context>,
}

impl Camera {
    /// Identify a camera without touching the device.
    pub fn new(model: impl Into<String>, port: impl Into<String>, context: Arc<Context>) -> Self {
        Self {
            session: OnceCell::new(),
            model: model.into(),
            port: port.into(),
            context,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Whether the native session has been negotiated.
    pub fn is_initialized(&self) -> bool {
        self.session.get().is_some()
    }

    /// The native camera, negotiating it on first use.
    pub(crate) fn acquire(&self) -> GphotoResult<&NativeHandle<CameraKind>> {
        if let Some(session) = self.session.get() {
            return Ok(session);
        }
        let session = self.negotiate()?;
        Ok(self.session.get_or_init(|| session))
    }

    fn negotiate(&self) -> GphotoResult<NativeHandle<CameraKind>> {
        let sdk = self.context.sdk();
        tracing::debug!("Opening session for {}", self);

        let camera = NativeHandle::<CameraKind>::allocate(sdk, "unable to create camera", |raw| unsafe {
            (sdk.camera_new)(raw)
        })?;

        // Driver abilities for the model
        let model = to_cstring(&self.model, "camera model")?;
        let abilities_list =
            NativeHandle::<AbilitiesListKind>::allocate(sdk, "unable to create abilities list", |raw| unsafe {
                (sdk.abilities_list_new)(raw)
            })?;
        check(
            sdk,
            unsafe { (sdk.abilities_list_load)(abilities_list.as_ptr(), self.context.as_ptr()) },
            "unable to load camera drivers",
        )?;
        let index = check(
            sdk,
            unsafe { (sdk.abilities_list_lookup_model)(abilities_list.as_ptr(), model.as_ptr()) },
            "camera model not supported",
        )?;
        let mut abilities = CameraAbilities::zeroed();
        check(
            sdk,
            unsafe { (sdk.abilities_list_get_abilities)(abilities_list.as_ptr(), index, &mut abilities) },
            "unable to get camera abilities",
        )?;
        check(
            sdk,
            unsafe { (sdk.camera_set_abilities)(camera.as_ptr(), abilities) },
            "unable to set camera abilities",
        )?;
        drop(abilities_list);
        tracing::debug!("Bound driver abilities for {}", self.model);

        // Port info for the port path. The info is owned by the list, so the
        // list stays alive until it is bound.
        let port = to_cstring(&self.port, "camera port")?;
        let port_list = NativeHandle::<PortInfoListKind>::allocate(sdk, "unable to create port info list", |raw| unsafe {
            (sdk.port_info_list_new)(raw)
        })?;
        check_port(
            sdk,
            unsafe { (sdk.port_info_list_load)(port_list.as_ptr()) },
            "unable to load port drivers",
        )?;
        let index = check_port(
            sdk,
            unsafe { (sdk.port_info_list_lookup_path)(port_list.as_ptr(), port.as_ptr()) },
            "unable to find port",
        )?;
        let mut info: ffi::GPPortInfo = ptr::null_mut();
        check_port(
            sdk,
            unsafe { (sdk.port_info_list_get_info)(port_list.as_ptr(), index, &mut info) },
            "unable to get port info",
        )?;
        check_port(
            sdk,
            unsafe { (sdk.camera_set_port_info)(camera.as_ptr(), info) },
            "unable to set port info",
        )?;
        drop(port_list);
        tracing::debug!("Bound port {} for {}", self.port, self.model);

        Ok(camera)
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.model, self.port)
    }
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("model", &self.model)
            .field("port", &self.port)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
