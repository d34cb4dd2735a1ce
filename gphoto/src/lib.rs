//! libgphoto2 camera bindings for Nightshade
//!
//! Discovery, folder listing, capture and streaming download for cameras
//! driven by libgphoto2. The library is loaded at runtime; nothing links
//! against it at build time.
//!
//! ```no_run
//! for camera in nightshade_gphoto::list_cameras()? {
//!     println!("{camera}");
//!     for path in camera.list_directory_recursive("/")? {
//!         println!("  {path}");
//!     }
//!     camera.capture_image_to("capture.jpg")?;
//! }
//! # Ok::<(), nightshade_gphoto::GphotoError>(())
//! ```

pub mod camera;
pub mod capture;
pub mod config;
pub mod directory;
pub mod discovery;
pub mod error;
pub mod ffi;
pub mod file;
pub(crate) mod handle;
pub mod path;
pub mod supervised;
pub mod utils;

#[cfg(test)]
pub(crate) mod fake;

pub use camera::Camera;
pub use config::{GphotoConfig, TransferTimeoutConfig};
pub use discovery::{list_cameras, list_cameras_with, Context};
pub use error::{GphotoError, GphotoResult, ReadError};
pub use ffi::Gphoto2Sdk;
pub use file::{CameraFile, ReadOutcome};
pub use path::RemotePath;
pub use supervised::SupervisedCamera;

/// Whether libgphoto2 could be loaded.
pub fn is_available() -> bool {
    Gphoto2Sdk::get().is_ok()
}

/// Load status of libgphoto2 with a human-readable message.
pub fn sdk_status() -> (bool, String) {
    match Gphoto2Sdk::get() {
        Ok(sdk) => (true, format!("libgphoto2 loaded ({} libraries)", sdk.libraries.len())),
        Err(e) => (false, e.to_string()),
    }
}
