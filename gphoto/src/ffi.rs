//! libgphoto2 SDK Wrapper
//!
//! C type mirrors for the parts of libgphoto2 2.5 this crate touches, plus the
//! runtime-loaded function table. The library is opened with `libloading`, so
//! building the crate never needs the libgphoto2 headers or import libraries.
//!
//! Port-subsystem entry points (`gp_port_*`) live in `libgphoto2_port`. They are
//! resolved from that library when it can be opened on its own, otherwise from
//! the main library's dependency chain.

#![allow(dead_code)] // FFI types must match the SDK headers even if not all fields are read

use crate::config::GphotoConfig;
use crate::error::{GphotoError, GphotoResult};
use crate::utils::cstr_ptr_to_string;
use std::ffi::{c_char, c_int, c_uchar, c_void};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

// =============================================================================
// OPAQUE SDK TYPES
// =============================================================================

/// `GPContext`
#[repr(C)]
pub struct GPContext {
    _private: [u8; 0],
}

/// `Camera`
#[repr(C)]
pub struct Camera {
    _private: [u8; 0],
}

/// `CameraList`
#[repr(C)]
pub struct CameraList {
    _private: [u8; 0],
}

/// `CameraFile`
#[repr(C)]
pub struct CameraFile {
    _private: [u8; 0],
}

/// `CameraAbilitiesList`
#[repr(C)]
pub struct CameraAbilitiesList {
    _private: [u8; 0],
}

/// `GPPortInfoList`
#[repr(C)]
pub struct GPPortInfoList {
    _private: [u8; 0],
}

/// `struct _GPPortInfo`; the public `GPPortInfo` type is a pointer to it.
#[repr(C)]
pub struct PortInfo {
    _private: [u8; 0],
}

pub type GPPortInfo = *mut PortInfo;

// =============================================================================
// RESULT CODES AND ENUM VALUES
// =============================================================================

pub const GP_OK: c_int = 0;
pub const GP_ERROR: c_int = -1;
pub const GP_ERROR_BAD_PARAMETERS: c_int = -2;
pub const GP_ERROR_NO_MEMORY: c_int = -3;
pub const GP_ERROR_UNKNOWN_PORT: c_int = -5;
pub const GP_ERROR_IO_USB_CLAIM: c_int = -53;
pub const GP_ERROR_MODEL_NOT_FOUND: c_int = -105;
pub const GP_ERROR_DIRECTORY_NOT_FOUND: c_int = -107;
pub const GP_ERROR_FILE_NOT_FOUND: c_int = -108;
pub const GP_ERROR_CAMERA_BUSY: c_int = -110;

/// `CameraCaptureType::GP_CAPTURE_IMAGE`
pub const GP_CAPTURE_IMAGE: c_int = 0;

/// `CameraFileType::GP_FILE_TYPE_NORMAL`
pub const GP_FILE_TYPE_NORMAL: c_int = 1;

// =============================================================================
// SDK STRUCTURES
// =============================================================================

/// Camera abilities - matches `CameraAbilities` from gphoto2-abilities-list.h
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CameraAbilities {
    pub model: [c_char; 128],
    pub status: c_int,           // CameraDriverStatus
    pub port: c_int,             // GPPortType
    pub speed: [c_int; 64],
    pub operations: c_int,       // CameraOperation
    pub file_operations: c_int,  // CameraFileOperation
    pub folder_operations: c_int, // CameraFolderOperation
    pub usb_vendor: c_int,
    pub usb_product: c_int,
    pub usb_class: c_int,
    pub usb_subclass: c_int,
    pub usb_protocol: c_int,
    pub library: [c_char; 1024],
    pub id: [c_char; 1024],
    pub device_type: c_int,      // GphotoDeviceType
    pub reserved2: c_int,
    pub reserved3: c_int,
    pub reserved4: c_int,
    pub reserved5: c_int,
    pub reserved6: c_int,
    pub reserved7: c_int,
    pub reserved8: c_int,
}

impl CameraAbilities {
    pub fn zeroed() -> Self {
        // SAFETY: every field is an integer or an integer array; all-zero is a valid value.
        unsafe { std::mem::zeroed() }
    }
}

/// Location of a file on the camera - matches `CameraFilePath` from gphoto2-camera.h
#[repr(C)]
pub struct CameraFilePath {
    pub name: [c_char; 128],
    pub folder: [c_char; 1024],
}

impl CameraFilePath {
    pub fn empty() -> Self {
        Self {
            name: [0; 128],
            folder: [0; 1024],
        }
    }
}

pub type SizeHandler = unsafe extern "C" fn(*mut c_void, *mut u64) -> c_int;
pub type ReadHandler = unsafe extern "C" fn(*mut c_void, *mut c_uchar, *mut u64) -> c_int;
pub type WriteHandler = unsafe extern "C" fn(*mut c_void, *mut c_uchar, *mut u64) -> c_int;

/// Handler table for `gp_file_new_from_handler` - matches `CameraFileHandler`
/// from gphoto2-file.h. The library keeps the pointer, not a copy.
#[repr(C)]
pub struct CameraFileHandler {
    pub size: Option<SizeHandler>,
    pub read: Option<ReadHandler>,
    pub write: Option<WriteHandler>,
}

// =============================================================================
// SDK LIBRARY LOADING
// =============================================================================

/// Function table for libgphoto2.
///
/// Every handle created by this crate keeps an `Arc` to the table it was
/// allocated from, so the libraries stay mapped until the last handle is gone.
pub struct Gphoto2Sdk {
    pub(crate) context_new: unsafe extern "C" fn() -> *mut GPContext,
    pub(crate) context_unref: unsafe extern "C" fn(*mut GPContext),

    pub(crate) camera_new: unsafe extern "C" fn(*mut *mut Camera) -> c_int,
    pub(crate) camera_unref: unsafe extern "C" fn(*mut Camera) -> c_int,
    pub(crate) camera_set_abilities: unsafe extern "C" fn(*mut Camera, CameraAbilities) -> c_int,
    pub(crate) camera_set_port_info: unsafe extern "C" fn(*mut Camera, GPPortInfo) -> c_int,
    pub(crate) camera_autodetect: unsafe extern "C" fn(*mut CameraList, *mut GPContext) -> c_int,
    pub(crate) camera_folder_list_folders:
        unsafe extern "C" fn(*mut Camera, *const c_char, *mut CameraList, *mut GPContext) -> c_int,
    pub(crate) camera_folder_list_files:
        unsafe extern "C" fn(*mut Camera, *const c_char, *mut CameraList, *mut GPContext) -> c_int,
    // gp_camera_file_get(camera, folder, file, type, camera_file, context)
    pub(crate) camera_file_get: unsafe extern "C" fn(
        *mut Camera,
        *const c_char,
        *const c_char,
        c_int,
        *mut CameraFile,
        *mut GPContext,
    ) -> c_int,
    pub(crate) camera_file_delete:
        unsafe extern "C" fn(*mut Camera, *const c_char, *const c_char, *mut GPContext) -> c_int,
    pub(crate) camera_capture:
        unsafe extern "C" fn(*mut Camera, c_int, *mut CameraFilePath, *mut GPContext) -> c_int,

    pub(crate) abilities_list_new: unsafe extern "C" fn(*mut *mut CameraAbilitiesList) -> c_int,
    pub(crate) abilities_list_free: unsafe extern "C" fn(*mut CameraAbilitiesList) -> c_int,
    pub(crate) abilities_list_load: unsafe extern "C" fn(*mut CameraAbilitiesList, *mut GPContext) -> c_int,
    pub(crate) abilities_list_lookup_model: unsafe extern "C" fn(*mut CameraAbilitiesList, *const c_char) -> c_int,
    pub(crate) abilities_list_get_abilities:
        unsafe extern "C" fn(*mut CameraAbilitiesList, c_int, *mut CameraAbilities) -> c_int,

    pub(crate) port_info_list_new: unsafe extern "C" fn(*mut *mut GPPortInfoList) -> c_int,
    pub(crate) port_info_list_free: unsafe extern "C" fn(*mut GPPortInfoList) -> c_int,
    pub(crate) port_info_list_load: unsafe extern "C" fn(*mut GPPortInfoList) -> c_int,
    pub(crate) port_info_list_lookup_path: unsafe extern "C" fn(*mut GPPortInfoList, *const c_char) -> c_int,
    pub(crate) port_info_list_get_info: unsafe extern "C" fn(*mut GPPortInfoList, c_int, *mut GPPortInfo) -> c_int,

    pub(crate) list_new: unsafe extern "C" fn(*mut *mut CameraList) -> c_int,
    pub(crate) list_unref: unsafe extern "C" fn(*mut CameraList) -> c_int,
    pub(crate) list_count: unsafe extern "C" fn(*mut CameraList) -> c_int,
    pub(crate) list_get_name: unsafe extern "C" fn(*mut CameraList, c_int, *mut *const c_char) -> c_int,
    pub(crate) list_get_value: unsafe extern "C" fn(*mut CameraList, c_int, *mut *const c_char) -> c_int,

    pub(crate) file_new_from_handler:
        unsafe extern "C" fn(*mut *mut CameraFile, *mut CameraFileHandler, *mut c_void) -> c_int,
    pub(crate) file_free: unsafe extern "C" fn(*mut CameraFile) -> c_int,

    pub(crate) result_as_string: unsafe extern "C" fn(c_int) -> *const c_char,
    pub(crate) port_result_as_string: unsafe extern "C" fn(c_int) -> *const c_char,

    // Must stay loaded for as long as the function pointers above are callable.
    pub(crate) libraries: Vec<libloading::Library>,
}

static GPHOTO2_SDK: OnceLock<Result<Arc<Gphoto2Sdk>, String>> = OnceLock::new();

impl Gphoto2Sdk {
    /// Load libgphoto2 using the search paths from `config`, falling back to
    /// the platform defaults.
    pub fn load(config: &GphotoConfig) -> GphotoResult<Arc<Self>> {
        let main_paths = candidate_paths(&config.library_paths, default_library_names());
        let (main, main_path) = open_first(&main_paths).ok_or_else(|| {
            GphotoError::SdkNotLoaded(format!(
                "libgphoto2 not found (tried {} locations)",
                main_paths.len()
            ))
        })?;
        tracing::info!("Found libgphoto2 at: {}", main_path.display());

        let port_paths = candidate_paths(&config.port_library_paths, default_port_library_names());
        let port = match open_first(&port_paths) {
            Some((lib, path)) => {
                tracing::info!("Found libgphoto2_port at: {}", path.display());
                Some(lib)
            }
            None => {
                tracing::debug!("libgphoto2_port not opened separately, resolving port symbols from libgphoto2");
                None
            }
        };

        let sdk = Self::from_libraries(main, port)?;
        tracing::info!("Successfully loaded all libgphoto2 functions from: {}", main_path.display());
        Ok(Arc::new(sdk))
    }

    /// Process-wide instance loaded with the default configuration.
    ///
    /// The load is attempted once; a failure is cached and reported on every call.
    pub fn get() -> GphotoResult<Arc<Self>> {
        GPHOTO2_SDK
            .get_or_init(|| Self::load(&GphotoConfig::default()).map_err(|e| e.to_string()))
            .clone()
            .map_err(GphotoError::SdkNotLoaded)
    }

    fn from_libraries(main: libloading::Library, port: Option<libloading::Library>) -> GphotoResult<Self> {
        let core = [&main];
        let port_first: Vec<&libloading::Library> = port.iter().chain(std::iter::once(&main)).collect();

        let mut sdk = Self {
            context_new: load_symbol(&core, "gp_context_new")?,
            context_unref: load_symbol(&core, "gp_context_unref")?,
            camera_new: load_symbol(&core, "gp_camera_new")?,
            camera_unref: load_symbol(&core, "gp_camera_unref")?,
            camera_set_abilities: load_symbol(&core, "gp_camera_set_abilities")?,
            camera_set_port_info: load_symbol(&core, "gp_camera_set_port_info")?,
            camera_autodetect: load_symbol(&core, "gp_camera_autodetect")?,
            camera_folder_list_folders: load_symbol(&core, "gp_camera_folder_list_folders")?,
            camera_folder_list_files: load_symbol(&core, "gp_camera_folder_list_files")?,
            camera_file_get: load_symbol(&core, "gp_camera_file_get")?,
            camera_file_delete: load_symbol(&core, "gp_camera_file_delete")?,
            camera_capture: load_symbol(&core, "gp_camera_capture")?,
            abilities_list_new: load_symbol(&core, "gp_abilities_list_new")?,
            abilities_list_free: load_symbol(&core, "gp_abilities_list_free")?,
            abilities_list_load: load_symbol(&core, "gp_abilities_list_load")?,
            abilities_list_lookup_model: load_symbol(&core, "gp_abilities_list_lookup_model")?,
            abilities_list_get_abilities: load_symbol(&core, "gp_abilities_list_get_abilities")?,
            port_info_list_new: load_symbol(&port_first, "gp_port_info_list_new")?,
            port_info_list_free: load_symbol(&port_first, "gp_port_info_list_free")?,
            port_info_list_load: load_symbol(&port_first, "gp_port_info_list_load")?,
            port_info_list_lookup_path: load_symbol(&port_first, "gp_port_info_list_lookup_path")?,
            port_info_list_get_info: load_symbol(&port_first, "gp_port_info_list_get_info")?,
            list_new: load_symbol(&core, "gp_list_new")?,
            list_unref: load_symbol(&core, "gp_list_unref")?,
            list_count: load_symbol(&core, "gp_list_count")?,
            list_get_name: load_symbol(&core, "gp_list_get_name")?,
            list_get_value: load_symbol(&core, "gp_list_get_value")?,
            file_new_from_handler: load_symbol(&core, "gp_file_new_from_handler")?,
            file_free: load_symbol(&core, "gp_file_free")?,
            result_as_string: load_symbol(&core, "gp_result_as_string")?,
            port_result_as_string: load_symbol(&port_first, "gp_port_result_as_string")?,
            libraries: Vec::new(),
        };

        drop(port_first);
        sdk.libraries.push(main);
        sdk.libraries.extend(port);
        Ok(sdk)
    }

    /// Human-readable text for a general libgphoto2 result code.
    pub fn describe(&self, code: c_int) -> String {
        unsafe { cstr_ptr_to_string((self.result_as_string)(code)) }
    }

    /// Human-readable text for a port-subsystem result code.
    pub fn describe_port(&self, code: c_int) -> String {
        unsafe { cstr_ptr_to_string((self.port_result_as_string)(code)) }
    }
}

impl fmt::Debug for Gphoto2Sdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gphoto2Sdk")
            .field("libraries", &self.libraries.len())
            .finish_non_exhaustive()
    }
}

fn load_symbol<T: Copy>(libs: &[&libloading::Library], name: &str) -> GphotoResult<T> {
    for lib in libs {
        if let Ok(symbol) = unsafe { lib.get::<T>(name.as_bytes()) } {
            return Ok(*symbol);
        }
    }
    tracing::error!("Failed to load libgphoto2 function '{}'", name);
    Err(GphotoError::SdkNotLoaded(format!("missing libgphoto2 function '{}'", name)))
}

fn open_first(paths: &[PathBuf]) -> Option<(libloading::Library, PathBuf)> {
    for path in paths {
        tracing::debug!("Trying to load libgphoto2 from: {}", path.display());
        match unsafe { libloading::Library::new(path) } {
            Ok(lib) => return Some((lib, path.clone())),
            Err(e) => tracing::debug!("libgphoto2 not found at {}: {}", path.display(), e),
        }
    }
    None
}

fn candidate_paths(configured: &[PathBuf], defaults: Vec<&'static str>) -> Vec<PathBuf> {
    configured
        .iter()
        .cloned()
        .chain(defaults.into_iter().map(PathBuf::from))
        .collect()
}

fn default_library_names() -> Vec<&'static str> {
    if cfg!(target_os = "windows") {
        vec!["libgphoto2-6.dll", "libgphoto2.dll"]
    } else if cfg!(target_os = "macos") {
        vec![
            "libgphoto2.6.dylib",
            "/opt/homebrew/lib/libgphoto2.6.dylib",
            "/usr/local/lib/libgphoto2.6.dylib",
            "/opt/local/lib/libgphoto2.6.dylib",
        ]
    } else {
        vec![
            "libgphoto2.so.6",
            "libgphoto2.so",
            "/usr/lib/x86_64-linux-gnu/libgphoto2.so.6",
            "/usr/lib/aarch64-linux-gnu/libgphoto2.so.6",
            "/usr/lib/libgphoto2.so.6",
            "/usr/local/lib/libgphoto2.so.6",
        ]
    }
}

fn default_port_library_names() -> Vec<&'static str> {
    if cfg!(target_os = "windows") {
        vec!["libgphoto2_port-12.dll", "libgphoto2_port.dll"]
    } else if cfg!(target_os = "macos") {
        vec![
            "libgphoto2_port.12.dylib",
            "/opt/homebrew/lib/libgphoto2_port.12.dylib",
            "/usr/local/lib/libgphoto2_port.12.dylib",
            "/opt/local/lib/libgphoto2_port.12.dylib",
        ]
    } else {
        vec![
            "libgphoto2_port.so.12",
            "libgphoto2_port.so",
            "/usr/lib/x86_64-linux-gnu/libgphoto2_port.so.12",
            "/usr/lib/aarch64-linux-gnu/libgphoto2_port.so.12",
            "/usr/lib/libgphoto2_port.so.12",
            "/usr/local/lib/libgphoto2_port.so.12",
        ]
    }
}
