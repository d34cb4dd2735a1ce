//! In-memory libgphoto2 used by the unit tests.
//!
//! [`install`] swaps in a [`FakeDevice`] and returns a [`FakeSession`] whose
//! `sdk()` is a function table pointing at the `extern "C"` functions below.
//! The device is process-global (blocking tasks run on other threads), so
//! sessions are serialised by a lock held for the lifetime of the session.

use crate::ffi::{
    self, CameraAbilities, CameraFileHandler, CameraFilePath, Gphoto2Sdk, GPContext, GPPortInfo, GPPortInfoList,
    GP_ERROR, GP_ERROR_BAD_PARAMETERS, GP_OK,
};
use crate::path::normalize_folder;
use crate::utils::{cstr_ptr_to_string, safe_char_array_to_string};
use std::collections::{BTreeMap, HashMap};
use std::ffi::{c_char, c_int, c_void, CString};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

static FAKE_LOCK: Mutex<()> = Mutex::new(());
static DEVICE: Mutex<Option<FakeDevice>> = Mutex::new(None);

/// Scripted camera: detection results, driver tables, storage and failures.
pub(crate) struct FakeDevice {
    detected: Vec<(String, String)>,
    models: Vec<String>,
    ports: Vec<String>,
    folders: BTreeMap<String, Vec<String>>,
    files: BTreeMap<String, Vec<(String, Vec<u8>)>>,
    capture: Option<(String, String, Vec<u8>)>,
    chunk_size: usize,
    declared_size: Option<u64>,
    skip_size_report: bool,
    failures: HashMap<String, c_int>,
    broken_folders: HashMap<String, c_int>,
    listing_delay: Option<Duration>,
    calls: Vec<String>,
    fetched: Vec<(String, String)>,
    deleted: Vec<(String, String)>,
    live: HashMap<&'static str, i64>,
    released: HashMap<&'static str, usize>,
}

impl FakeDevice {
    pub(crate) fn new() -> Self {
        let mut folders = BTreeMap::new();
        folders.insert("/".to_string(), Vec::new());
        Self {
            detected: Vec::new(),
            models: Vec::new(),
            ports: Vec::new(),
            folders,
            files: BTreeMap::new(),
            capture: None,
            chunk_size: 4096,
            declared_size: None,
            skip_size_report: false,
            failures: HashMap::new(),
            broken_folders: HashMap::new(),
            listing_delay: None,
            calls: Vec::new(),
            fetched: Vec::new(),
            deleted: Vec::new(),
            live: HashMap::new(),
            released: HashMap::new(),
        }
    }

    /// Attached camera, known to both the driver and port tables.
    pub(crate) fn with_camera(mut self, model: &str, port: &str) -> Self {
        self.detected.push((model.to_string(), port.to_string()));
        self.models.push(model.to_string());
        self.ports.push(port.to_string());
        self
    }

    /// Folder and all of its parents, children kept in insertion order.
    pub(crate) fn with_folder(mut self, path: &str) -> Self {
        self.add_folder(path);
        self
    }

    pub(crate) fn with_file(mut self, folder: &str, name: &str, data: &[u8]) -> Self {
        let folder = self.add_folder(folder);
        self.files.entry(folder).or_default().push((name.to_string(), data.to_vec()));
        self
    }

    /// What `gp_camera_capture` produces. `folder` is reported without a
    /// trailing separator, as the library does.
    pub(crate) fn with_capture(mut self, folder: &str, name: &str, data: &[u8]) -> Self {
        self.add_folder(folder);
        self.capture = Some((folder.trim_end_matches('/').to_string(), name.to_string(), data.to_vec()));
        self
    }

    /// Bytes per write callback.
    pub(crate) fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Size reported through the size callback instead of the real length.
    pub(crate) fn declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub(crate) fn skip_size_report(mut self) -> Self {
        self.skip_size_report = true;
        self
    }

    /// Make every call to the named `gp_*` function return `code`.
    pub(crate) fn fail(mut self, function: &str, code: c_int) -> Self {
        self.failures.insert(function.to_string(), code);
        self
    }

    pub(crate) fn clear_failure(&mut self, function: &str) {
        self.failures.remove(function);
    }

    /// Make listing the given folder fail with `code`.
    pub(crate) fn fail_folder(mut self, folder: &str, code: c_int) -> Self {
        self.broken_folders.insert(normalize_folder(folder), code);
        self
    }

    pub(crate) fn listing_delay(mut self, delay: Duration) -> Self {
        self.listing_delay = Some(delay);
        self
    }

    pub(crate) fn set_listing_delay(&mut self, delay: Option<Duration>) {
        self.listing_delay = delay;
    }

    fn add_folder(&mut self, path: &str) -> String {
        let mut current = "/".to_string();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let children = self.folders.entry(current.clone()).or_default();
            if !children.iter().any(|c| c == part) {
                children.push(part.to_string());
            }
            current = format!("{}{}/", current, part);
            self.folders.entry(current.clone()).or_default();
        }
        current
    }
}

/// Exclusive use of the fake library for one test.
pub(crate) struct FakeSession {
    sdk: Arc<Gphoto2Sdk>,
    _guard: MutexGuard<'static, ()>,
}

pub(crate) fn install(device: FakeDevice) -> FakeSession {
    let guard = FAKE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    *DEVICE.lock().unwrap_or_else(PoisonError::into_inner) = Some(device);
    FakeSession {
        sdk: fake_sdk(),
        _guard: guard,
    }
}

impl FakeSession {
    pub(crate) fn sdk(&self) -> Arc<Gphoto2Sdk> {
        Arc::clone(&self.sdk)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.inspect(|d| d.calls.clone())
    }

    pub(crate) fn calls_to(&self, function: &str) -> usize {
        self.inspect(|d| d.calls.iter().filter(|c| *c == function).count())
    }

    /// Allocated and not yet released objects of one kind.
    pub(crate) fn live(&self, kind: &str) -> i64 {
        self.inspect(|d| d.live.get(kind).copied().unwrap_or(0))
    }

    pub(crate) fn released(&self, kind: &str) -> usize {
        self.inspect(|d| d.released.get(kind).copied().unwrap_or(0))
    }

    /// `(folder, name)` of every `gp_camera_file_get` call.
    pub(crate) fn fetched(&self) -> Vec<(String, String)> {
        self.inspect(|d| d.fetched.clone())
    }

    /// `(folder, name)` of every `gp_camera_file_delete` call.
    pub(crate) fn deleted(&self) -> Vec<(String, String)> {
        self.inspect(|d| d.deleted.clone())
    }

    pub(crate) fn has_file(&self, folder: &str, name: &str) -> bool {
        self.inspect(|d| {
            d.files
                .get(&normalize_folder(folder))
                .is_some_and(|files| files.iter().any(|(n, _)| n == name))
        })
    }

    pub(crate) fn update(&self, change: impl FnOnce(&mut FakeDevice)) {
        self.inspect(change)
    }

    fn inspect<T>(&self, f: impl FnOnce(&mut FakeDevice) -> T) -> T {
        let mut device = DEVICE.lock().unwrap_or_else(PoisonError::into_inner);
        f(device.as_mut().expect("fake device installed"))
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        *DEVICE.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn fake_sdk() -> Arc<Gphoto2Sdk> {
    Arc::new(Gphoto2Sdk {
        context_new,
        context_unref,
        camera_new,
        camera_unref,
        camera_set_abilities,
        camera_set_port_info,
        camera_autodetect,
        camera_folder_list_folders,
        camera_folder_list_files,
        camera_file_get,
        camera_file_delete,
        camera_capture,
        abilities_list_new,
        abilities_list_free,
        abilities_list_load,
        abilities_list_lookup_model,
        abilities_list_get_abilities,
        port_info_list_new,
        port_info_list_free,
        port_info_list_load,
        port_info_list_lookup_path,
        port_info_list_get_info,
        list_new,
        list_unref,
        list_count,
        list_get_name,
        list_get_value,
        file_new_from_handler,
        file_free,
        result_as_string,
        port_result_as_string,
        libraries: Vec::new(),
    })
}

// =============================================================================
// BOOKKEEPING
// =============================================================================

fn with_device<T>(absent: T, f: impl FnOnce(&mut FakeDevice) -> T) -> T {
    let mut device = DEVICE.lock().unwrap_or_else(PoisonError::into_inner);
    match device.as_mut() {
        Some(device) => f(device),
        None => absent,
    }
}

fn record(function: &str) {
    with_device((), |d| d.calls.push(function.to_string()));
}

/// Log the call and return its injected failure, if any.
fn enter(function: &str) -> c_int {
    with_device(GP_ERROR, |d| {
        d.calls.push(function.to_string());
        d.failures.get(function).copied().unwrap_or(GP_OK)
    })
}

fn allocated(kind: &'static str) {
    with_device((), |d| *d.live.entry(kind).or_default() += 1);
}

fn freed(kind: &'static str) {
    with_device((), |d| {
        *d.live.entry(kind).or_default() -= 1;
        *d.released.entry(kind).or_default() += 1;
    });
}

unsafe fn boxed<T>(out: *mut *mut T, value: T, kind: &'static str) {
    *out = Box::into_raw(Box::new(value));
    allocated(kind);
}

unsafe fn unboxed<T>(raw: *mut T, kind: &'static str) -> c_int {
    if raw.is_null() {
        return GP_ERROR_BAD_PARAMETERS;
    }
    drop(Box::from_raw(raw));
    freed(kind);
    GP_OK
}

fn listing_pause() {
    if let Some(delay) = with_device(None, |d| d.listing_delay) {
        std::thread::sleep(delay);
    }
}

// =============================================================================
// FAKE OBJECTS
// =============================================================================

struct FakeContext {
    _serial: u64,
}

#[derive(Default)]
struct FakeCamera {
    model: Option<String>,
    port_bound: bool,
}

#[derive(Default)]
struct FakeList {
    entries: Vec<(CString, Option<CString>)>,
}

impl FakeList {
    fn fill<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) {
        self.entries = entries
            .into_iter()
            .map(|(name, value)| {
                (
                    CString::new(name).unwrap_or_default(),
                    value.map(|v| CString::new(v).unwrap_or_default()),
                )
            })
            .collect();
    }
}

#[derive(Default)]
struct FakeAbilitiesList {
    loaded: bool,
}

#[derive(Default)]
struct FakePortList {
    loaded: bool,
}

struct FakeFile {
    handler: *mut CameraFileHandler,
    data: *mut c_void,
}

unsafe fn camera_ready(camera: *mut ffi::Camera) -> bool {
    let camera = &*(camera as *mut FakeCamera);
    camera.model.is_some() && camera.port_bound
}

// =============================================================================
// CONTEXT AND CAMERA
// =============================================================================

unsafe extern "C" fn context_new() -> *mut GPContext {
    if enter("gp_context_new") != GP_OK {
        return ptr::null_mut();
    }
    let mut raw: *mut FakeContext = ptr::null_mut();
    boxed(&mut raw, FakeContext { _serial: 1 }, "context");
    raw as *mut GPContext
}

unsafe extern "C" fn context_unref(context: *mut GPContext) {
    record("gp_context_unref");
    unboxed(context as *mut FakeContext, "context");
}

unsafe extern "C" fn camera_new(out: *mut *mut ffi::Camera) -> c_int {
    let status = enter("gp_camera_new");
    if status != GP_OK {
        return status;
    }
    boxed(out as *mut *mut FakeCamera, FakeCamera::default(), "camera");
    GP_OK
}

unsafe extern "C" fn camera_unref(camera: *mut ffi::Camera) -> c_int {
    record("gp_camera_unref");
    unboxed(camera as *mut FakeCamera, "camera")
}

unsafe extern "C" fn camera_set_abilities(camera: *mut ffi::Camera, abilities: CameraAbilities) -> c_int {
    let status = enter("gp_camera_set_abilities");
    if status != GP_OK {
        return status;
    }
    (*(camera as *mut FakeCamera)).model = Some(safe_char_array_to_string(&abilities.model));
    GP_OK
}

unsafe extern "C" fn camera_set_port_info(camera: *mut ffi::Camera, info: GPPortInfo) -> c_int {
    let status = enter("gp_camera_set_port_info");
    if status != GP_OK {
        return status;
    }
    if info.is_null() {
        return GP_ERROR_BAD_PARAMETERS;
    }
    (*(camera as *mut FakeCamera)).port_bound = true;
    GP_OK
}

unsafe extern "C" fn camera_autodetect(list: *mut ffi::CameraList, _context: *mut GPContext) -> c_int {
    let status = enter("gp_camera_autodetect");
    if status != GP_OK {
        return status;
    }
    let detected = with_device(Vec::new(), |d| d.detected.clone());
    let list = &mut *(list as *mut FakeList);
    list.fill(detected.iter().map(|(model, port)| (model.as_str(), Some(port.as_str()))));
    GP_OK
}

unsafe fn list_folder(
    function: &str,
    camera: *mut ffi::Camera,
    folder: *const c_char,
    list: *mut ffi::CameraList,
    pick: fn(&FakeDevice, &str) -> Option<Vec<String>>,
) -> c_int {
    let status = enter(function);
    if status != GP_OK {
        return status;
    }
    if !camera_ready(camera) {
        return GP_ERROR_BAD_PARAMETERS;
    }
    listing_pause();

    let folder = cstr_ptr_to_string(folder);
    let names = with_device(Err(GP_ERROR), |d| {
        if let Some(code) = d.broken_folders.get(&folder) {
            return Err(*code);
        }
        pick(d, &folder).ok_or(ffi::GP_ERROR_DIRECTORY_NOT_FOUND)
    });
    match names {
        Ok(names) => {
            (*(list as *mut FakeList)).fill(names.iter().map(|n| (n.as_str(), None)));
            GP_OK
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn camera_folder_list_folders(
    camera: *mut ffi::Camera,
    folder: *const c_char,
    list: *mut ffi::CameraList,
    _context: *mut GPContext,
) -> c_int {
    list_folder("gp_camera_folder_list_folders", camera, folder, list, |d, folder| {
        d.folders.get(folder).cloned()
    })
}

unsafe extern "C" fn camera_folder_list_files(
    camera: *mut ffi::Camera,
    folder: *const c_char,
    list: *mut ffi::CameraList,
    _context: *mut GPContext,
) -> c_int {
    list_folder("gp_camera_folder_list_files", camera, folder, list, |d, folder| {
        d.folders.get(folder)?;
        Some(
            d.files
                .get(folder)
                .map(|files| files.iter().map(|(name, _)| name.clone()).collect())
                .unwrap_or_default(),
        )
    })
}

/// Reports the size, then pushes the data through the write callback in
/// `chunk_size` pieces. The device lock is not held while callbacks run.
unsafe extern "C" fn camera_file_get(
    camera: *mut ffi::Camera,
    folder: *const c_char,
    name: *const c_char,
    file_type: c_int,
    file: *mut ffi::CameraFile,
    _context: *mut GPContext,
) -> c_int {
    let status = enter("gp_camera_file_get");
    if status != GP_OK {
        return status;
    }
    if !camera_ready(camera) || file.is_null() || file_type != ffi::GP_FILE_TYPE_NORMAL {
        return GP_ERROR_BAD_PARAMETERS;
    }

    let folder = cstr_ptr_to_string(folder);
    let name = cstr_ptr_to_string(name);
    let plan = with_device(Err(GP_ERROR), |d| {
        d.fetched.push((folder.clone(), name.clone()));
        let data = d
            .files
            .get(&folder)
            .and_then(|files| files.iter().find(|(n, _)| *n == name))
            .map(|(_, data)| data.clone())
            .ok_or(ffi::GP_ERROR_FILE_NOT_FOUND)?;
        let declared = d.declared_size.unwrap_or(data.len() as u64);
        Ok((data, declared, d.chunk_size, d.skip_size_report))
    });
    let (data, declared, chunk_size, skip_size_report) = match plan {
        Ok(plan) => plan,
        Err(code) => return code,
    };

    let file = &*(file as *mut FakeFile);
    let handler = &*file.handler;

    if !skip_size_report {
        if let Some(size) = handler.size {
            let mut declared = declared;
            let status = size(file.data, &mut declared);
            if status != GP_OK {
                return status;
            }
        }
    }

    let Some(write) = handler.write else {
        return GP_ERROR_BAD_PARAMETERS;
    };
    for chunk in data.chunks(chunk_size) {
        let mut chunk = chunk.to_vec();
        let mut len = chunk.len() as u64;
        let status = write(file.data, chunk.as_mut_ptr(), &mut len);
        if status != GP_OK {
            return status;
        }
        if len != chunk.len() as u64 {
            return GP_ERROR;
        }
    }
    GP_OK
}

unsafe extern "C" fn camera_file_delete(
    camera: *mut ffi::Camera,
    folder: *const c_char,
    name: *const c_char,
    _context: *mut GPContext,
) -> c_int {
    let status = enter("gp_camera_file_delete");
    if status != GP_OK {
        return status;
    }
    if !camera_ready(camera) {
        return GP_ERROR_BAD_PARAMETERS;
    }
    let folder = cstr_ptr_to_string(folder);
    let name = cstr_ptr_to_string(name);
    with_device(GP_ERROR, |d| {
        d.deleted.push((folder.clone(), name.clone()));
        let Some(files) = d.files.get_mut(&folder) else {
            return ffi::GP_ERROR_FILE_NOT_FOUND;
        };
        let before = files.len();
        files.retain(|(n, _)| *n != name);
        if files.len() == before {
            ffi::GP_ERROR_FILE_NOT_FOUND
        } else {
            GP_OK
        }
    })
}

unsafe extern "C" fn camera_capture(
    camera: *mut ffi::Camera,
    capture_type: c_int,
    path: *mut CameraFilePath,
    _context: *mut GPContext,
) -> c_int {
    let status = enter("gp_camera_capture");
    if status != GP_OK {
        return status;
    }
    if !camera_ready(camera) || path.is_null() || capture_type != ffi::GP_CAPTURE_IMAGE {
        return GP_ERROR_BAD_PARAMETERS;
    }
    let captured = with_device(None, |d| {
        let (folder, name, data) = d.capture.clone()?;
        d.files
            .entry(normalize_folder(&folder))
            .or_default()
            .push((name.clone(), data));
        Some((folder, name))
    });
    let Some((folder, name)) = captured else {
        return GP_ERROR;
    };

    let path = &mut *path;
    write_char_array(&mut path.folder, &folder);
    write_char_array(&mut path.name, &name);
    GP_OK
}

fn write_char_array<const N: usize>(target: &mut [c_char; N], value: &str) {
    target.fill(0);
    for (slot, byte) in target.iter_mut().take(N - 1).zip(value.bytes()) {
        *slot = byte as c_char;
    }
}

// =============================================================================
// DRIVER AND PORT TABLES
// =============================================================================

unsafe extern "C" fn abilities_list_new(out: *mut *mut ffi::CameraAbilitiesList) -> c_int {
    let status = enter("gp_abilities_list_new");
    if status != GP_OK {
        return status;
    }
    boxed(out as *mut *mut FakeAbilitiesList, FakeAbilitiesList::default(), "abilities list");
    GP_OK
}

unsafe extern "C" fn abilities_list_free(list: *mut ffi::CameraAbilitiesList) -> c_int {
    record("gp_abilities_list_free");
    unboxed(list as *mut FakeAbilitiesList, "abilities list")
}

unsafe extern "C" fn abilities_list_load(list: *mut ffi::CameraAbilitiesList, _context: *mut GPContext) -> c_int {
    let status = enter("gp_abilities_list_load");
    if status != GP_OK {
        return status;
    }
    (*(list as *mut FakeAbilitiesList)).loaded = true;
    GP_OK
}

unsafe extern "C" fn abilities_list_lookup_model(list: *mut ffi::CameraAbilitiesList, model: *const c_char) -> c_int {
    let status = enter("gp_abilities_list_lookup_model");
    if status != GP_OK {
        return status;
    }
    if !(*(list as *mut FakeAbilitiesList)).loaded {
        return GP_ERROR_BAD_PARAMETERS;
    }
    let model = cstr_ptr_to_string(model);
    with_device(GP_ERROR, |d| {
        d.models
            .iter()
            .position(|m| *m == model)
            .map_or(ffi::GP_ERROR_MODEL_NOT_FOUND, |index| index as c_int)
    })
}

unsafe extern "C" fn abilities_list_get_abilities(
    _list: *mut ffi::CameraAbilitiesList,
    index: c_int,
    out: *mut CameraAbilities,
) -> c_int {
    let status = enter("gp_abilities_list_get_abilities");
    if status != GP_OK {
        return status;
    }
    let model = with_device(None, |d| usize::try_from(index).ok().and_then(|i| d.models.get(i).cloned()));
    let Some(model) = model else {
        return GP_ERROR_BAD_PARAMETERS;
    };
    write_char_array(&mut (*out).model, &model);
    GP_OK
}

unsafe extern "C" fn port_info_list_new(out: *mut *mut GPPortInfoList) -> c_int {
    let status = enter("gp_port_info_list_new");
    if status != GP_OK {
        return status;
    }
    boxed(out as *mut *mut FakePortList, FakePortList::default(), "port info list");
    GP_OK
}

unsafe extern "C" fn port_info_list_free(list: *mut GPPortInfoList) -> c_int {
    record("gp_port_info_list_free");
    unboxed(list as *mut FakePortList, "port info list")
}

unsafe extern "C" fn port_info_list_load(list: *mut GPPortInfoList) -> c_int {
    let status = enter("gp_port_info_list_load");
    if status != GP_OK {
        return status;
    }
    (*(list as *mut FakePortList)).loaded = true;
    GP_OK
}

unsafe extern "C" fn port_info_list_lookup_path(list: *mut GPPortInfoList, path: *const c_char) -> c_int {
    let status = enter("gp_port_info_list_lookup_path");
    if status != GP_OK {
        return status;
    }
    if !(*(list as *mut FakePortList)).loaded {
        return GP_ERROR_BAD_PARAMETERS;
    }
    let path = cstr_ptr_to_string(path);
    with_device(GP_ERROR, |d| {
        d.ports
            .iter()
            .position(|p| *p == path)
            .map_or(ffi::GP_ERROR_UNKNOWN_PORT, |index| index as c_int)
    })
}

unsafe extern "C" fn port_info_list_get_info(list: *mut GPPortInfoList, _index: c_int, out: *mut GPPortInfo) -> c_int {
    let status = enter("gp_port_info_list_get_info");
    if status != GP_OK {
        return status;
    }
    // The info lives inside the list in libgphoto2 too.
    *out = list as GPPortInfo;
    GP_OK
}

// =============================================================================
// LISTS AND FILES
// =============================================================================

unsafe extern "C" fn list_new(out: *mut *mut ffi::CameraList) -> c_int {
    let status = enter("gp_list_new");
    if status != GP_OK {
        return status;
    }
    boxed(out as *mut *mut FakeList, FakeList::default(), "list");
    GP_OK
}

unsafe extern "C" fn list_unref(list: *mut ffi::CameraList) -> c_int {
    record("gp_list_unref");
    unboxed(list as *mut FakeList, "list")
}

unsafe extern "C" fn list_count(list: *mut ffi::CameraList) -> c_int {
    let status = enter("gp_list_count");
    if status != GP_OK {
        return status;
    }
    (*(list as *mut FakeList)).entries.len() as c_int
}

unsafe extern "C" fn list_get_name(list: *mut ffi::CameraList, index: c_int, out: *mut *const c_char) -> c_int {
    let status = enter("gp_list_get_name");
    if status != GP_OK {
        return status;
    }
    let list = &*(list as *mut FakeList);
    match usize::try_from(index).ok().and_then(|i| list.entries.get(i)) {
        Some((name, _)) => {
            *out = name.as_ptr();
            GP_OK
        }
        None => GP_ERROR_BAD_PARAMETERS,
    }
}

unsafe extern "C" fn list_get_value(list: *mut ffi::CameraList, index: c_int, out: *mut *const c_char) -> c_int {
    let status = enter("gp_list_get_value");
    if status != GP_OK {
        return status;
    }
    let list = &*(list as *mut FakeList);
    match usize::try_from(index).ok().and_then(|i| list.entries.get(i)) {
        Some((_, value)) => {
            *out = value.as_ref().map_or(ptr::null(), |v| v.as_ptr());
            GP_OK
        }
        None => GP_ERROR_BAD_PARAMETERS,
    }
}

unsafe extern "C" fn file_new_from_handler(
    out: *mut *mut ffi::CameraFile,
    handler: *mut CameraFileHandler,
    data: *mut c_void,
) -> c_int {
    let status = enter("gp_file_new_from_handler");
    if status != GP_OK {
        return status;
    }
    if handler.is_null() {
        return GP_ERROR_BAD_PARAMETERS;
    }
    boxed(out as *mut *mut FakeFile, FakeFile { handler, data }, "file");
    GP_OK
}

unsafe extern "C" fn file_free(file: *mut ffi::CameraFile) -> c_int {
    record("gp_file_free");
    unboxed(file as *mut FakeFile, "file")
}

// =============================================================================
// RESULT DECODERS
// =============================================================================

unsafe extern "C" fn result_as_string(code: c_int) -> *const c_char {
    let text = match code {
        GP_OK => c"No error",
        GP_ERROR => c"Unspecified error",
        GP_ERROR_BAD_PARAMETERS => c"Bad parameters",
        ffi::GP_ERROR_NO_MEMORY => c"Out of memory",
        ffi::GP_ERROR_MODEL_NOT_FOUND => c"Unknown model",
        ffi::GP_ERROR_DIRECTORY_NOT_FOUND => c"Directory not found",
        ffi::GP_ERROR_FILE_NOT_FOUND => c"File not found",
        ffi::GP_ERROR_CAMERA_BUSY => c"I/O in progress",
        _ => c"Unknown error",
    };
    text.as_ptr()
}

unsafe extern "C" fn port_result_as_string(code: c_int) -> *const c_char {
    let text = match code {
        GP_OK => c"No error",
        GP_ERROR => c"Unspecified error",
        GP_ERROR_BAD_PARAMETERS => c"Bad parameters",
        ffi::GP_ERROR_NO_MEMORY => c"Out of memory",
        ffi::GP_ERROR_UNKNOWN_PORT => c"Unknown port",
        ffi::GP_ERROR_IO_USB_CLAIM => c"Could not claim the USB device",
        _ => c"Unknown error",
    };
    text.as_ptr()
}
