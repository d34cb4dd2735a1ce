//! Streaming download of camera files
//!
//! libgphoto2 delivers file contents by pushing them into a `CameraFile`
//! through write callbacks while `gp_camera_file_get` runs, and announces the
//! total through a size callback. [`CameraFile`] turns that into a pull-based
//! reader: the first read performs the whole native fetch into an internal
//! buffer, and every read (including the first) drains that buffer.
//!
//! End of stream is decided against the size the camera declared, not the
//! buffer: the read that consumes the declared size reports it. For files
//! captured by [`Camera::capture_image`](crate::Camera::capture_image) that
//! same read deletes the file from the camera. A reader dropped before the
//! end leaves the camera file in place.

use crate::camera::Camera;
use crate::discovery::Context;
use crate::error::{check, GphotoError, GphotoResult, ReadError};
use crate::ffi::{self, CameraFileHandler, GP_ERROR, GP_ERROR_BAD_PARAMETERS, GP_OK};
use crate::handle::{CameraKind, FileKind, NativeHandle};
use crate::path::RemotePath;
use crate::utils::to_cstring;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ffi::{c_int, c_uchar, c_void, CString};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::ptr;

/// Buffer size used by [`CameraFile::download_to`].
const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Handler table handed to `gp_file_new_from_handler`. libgphoto2 keeps the
/// pointer for the lifetime of the file, so it must not live on the stack.
static FILE_HANDLER: CameraFileHandler = CameraFileHandler {
    size: Some(handle_size),
    read: None,
    write: Some(handle_write),
};

/// Destination of the write and size callbacks.
///
/// Boxed by the reader so its address is stable for the duration of the
/// native fetch, whatever happens to the reader value itself.
#[derive(Default)]
struct TransferSink {
    buffer: RefCell<VecDeque<u8>>,
    declared_size: Cell<u64>,
}

unsafe extern "C" fn handle_size(private: *mut c_void, size: *mut u64) -> c_int {
    if private.is_null() || size.is_null() {
        return GP_ERROR_BAD_PARAMETERS;
    }
    let sink = &*(private as *const TransferSink);
    sink.declared_size.set(*size);
    GP_OK
}

unsafe extern "C" fn handle_write(private: *mut c_void, data: *mut c_uchar, len: *mut u64) -> c_int {
    if private.is_null() || len.is_null() {
        return GP_ERROR_BAD_PARAMETERS;
    }
    let Ok(length) = usize::try_from(*len) else {
        *len = 0;
        return GP_ERROR_BAD_PARAMETERS;
    };
    if length == 0 {
        return GP_OK;
    }
    if data.is_null() {
        *len = 0;
        return GP_ERROR_BAD_PARAMETERS;
    }

    let sink = &*(private as *const TransferSink);
    let bytes = std::slice::from_raw_parts(data as *const u8, length);
    match sink.buffer.try_borrow_mut() {
        Ok(mut buffer) => {
            buffer.extend(bytes);
            GP_OK
        }
        Err(_) => {
            *len = 0;
            GP_ERROR
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferState {
    /// No native file yet; the next read fetches.
    Unbound,
    Draining,
    /// Terminal. Reads report end of stream with no bytes.
    Exhausted,
    /// Terminal. The native fetch failed.
    Failed,
}

/// Result of one [`CameraFile::read_chunk`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes copied into the caller's buffer.
    pub bytes: usize,
    /// The declared size has been consumed. Every later read returns `0` and `true`.
    pub end_of_stream: bool,
}

impl ReadOutcome {
    fn partial(bytes: usize) -> Self {
        Self {
            bytes,
            end_of_stream: false,
        }
    }

    fn finished(bytes: usize) -> Self {
        Self {
            bytes,
            end_of_stream: true,
        }
    }
}

/// A file on the camera, downloaded on first read.
///
/// Borrows the camera's session and context; the camera cannot be dropped
/// while a reader is alive. A reader stays on the thread that owns the
/// camera:
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<nightshade_gphoto::CameraFile<'static>>();
/// ```
pub struct CameraFile<'cam> {
    session: &'cam NativeHandle<CameraKind>,
    context: &'cam Context,
    path: RemotePath,
    folder: CString,
    name: CString,
    delete_after_read: bool,
    // Freed before the sink it points at.
    file: Option<NativeHandle<FileKind>>,
    sink: Box<TransferSink>,
    state: TransferState,
    bytes_read: u64,
    pending_error: Option<GphotoError>,
}

impl<'cam> CameraFile<'cam> {
    pub(crate) fn new(camera: &'cam Camera, path: RemotePath, delete_after_read: bool) -> GphotoResult<Self> {
        let folder = to_cstring(path.folder(), "folder")?;
        let name = to_cstring(path.name(), "file name")?;
        let session = camera.acquire()?;
        Ok(Self {
            session,
            context: camera.context().as_ref(),
            path,
            folder,
            name,
            delete_after_read,
            file: None,
            sink: Box::default(),
            state: TransferState::Unbound,
            bytes_read: 0,
            pending_error: None,
        })
    }

    pub fn folder(&self) -> &str {
        self.path.folder()
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Size announced by the camera, `0` before the first read.
    pub fn declared_size(&self) -> u64 {
        self.sink.declared_size.get()
    }

    pub fn deletes_after_read(&self) -> bool {
        self.delete_after_read
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == TransferState::Exhausted
    }

    /// Copy the next bytes of the file into `buf`.
    ///
    /// The first call fetches the file from the camera; if that fails the
    /// reader is unusable and later calls return
    /// [`GphotoError::TransferFailed`]. A non-terminal outcome with fewer
    /// bytes than requested (even zero) means the camera delivered less than
    /// it declared. When deletion after read is enabled and it fails, the
    /// error carries the byte count of the final chunk, which was copied into
    /// `buf`.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, ReadError> {
        match self.state {
            TransferState::Exhausted => return Ok(ReadOutcome::finished(0)),
            TransferState::Failed => {
                return Err(ReadError::new(
                    0,
                    GphotoError::TransferFailed {
                        path: self.path.to_string(),
                    },
                ))
            }
            TransferState::Unbound => {
                if let Err(err) = self.fetch() {
                    self.state = TransferState::Failed;
                    self.sink.buffer.borrow_mut().clear();
                    return Err(ReadError::new(0, err));
                }
                self.state = TransferState::Draining;
            }
            TransferState::Draining => {}
        }

        let declared = self.declared_size();
        let limit = if declared > 0 {
            usize::try_from(declared.saturating_sub(self.bytes_read)).map_or(buf.len(), |left| left.min(buf.len()))
        } else {
            buf.len()
        };
        let (count, drained) = {
            let mut buffer = self.sink.buffer.borrow_mut();
            let count = buffer.len().min(limit);
            for (slot, byte) in buf.iter_mut().zip(buffer.drain(..count)) {
                *slot = byte;
            }
            (count, buffer.is_empty())
        };
        self.bytes_read += count as u64;

        if declared > 0 && self.bytes_read >= declared {
            return self.finish(count);
        }
        if !drained {
            return Ok(ReadOutcome::partial(count));
        }
        if self.bytes_read < declared {
            tracing::warn!(
                "Transfer of {} stopped at {} of {} declared bytes",
                self.path,
                self.bytes_read,
                declared
            );
            return Ok(ReadOutcome::partial(count));
        }
        self.finish(count)
    }

    fn fetch(&mut self) -> GphotoResult<()> {
        let session = self.session;
        let sdk = session.sdk();
        let handler = ptr::addr_of!(FILE_HANDLER) as *mut CameraFileHandler;
        let sink = &*self.sink as *const TransferSink as *mut c_void;

        let file = NativeHandle::<FileKind>::allocate(sdk, "unable to create file from handler", |raw| unsafe {
            (sdk.file_new_from_handler)(raw, handler, sink)
        })?;
        check(
            sdk,
            unsafe {
                (sdk.camera_file_get)(
                    session.as_ptr(),
                    self.folder.as_ptr(),
                    self.name.as_ptr(),
                    ffi::GP_FILE_TYPE_NORMAL,
                    file.as_ptr(),
                    self.context.as_ptr(),
                )
            },
            "unable to get file",
        )?;

        tracing::debug!(
            "Fetched {} ({} bytes buffered, {} declared)",
            self.path,
            self.sink.buffer.borrow().len(),
            self.declared_size()
        );
        self.file = Some(file);
        Ok(())
    }

    fn finish(&mut self, count: usize) -> Result<ReadOutcome, ReadError> {
        self.state = TransferState::Exhausted;
        self.file = None;

        let surplus = std::mem::take(&mut *self.sink.buffer.borrow_mut()).len();
        if surplus > 0 {
            tracing::warn!(
                "Discarded {} bytes of {} beyond the declared {}",
                surplus,
                self.path,
                self.declared_size()
            );
        }

        if !self.delete_after_read {
            return Ok(ReadOutcome::finished(count));
        }
        let sdk = self.session.sdk();
        let deleted = check(
            sdk,
            unsafe {
                (sdk.camera_file_delete)(
                    self.session.as_ptr(),
                    self.folder.as_ptr(),
                    self.name.as_ptr(),
                    self.context.as_ptr(),
                )
            },
            "unable to delete file after downloading",
        );
        match deleted {
            Ok(_) => {
                tracing::info!("Deleted {} from camera after download", self.path);
                Ok(ReadOutcome::finished(count))
            }
            Err(err) => Err(ReadError::new(count, err)),
        }
    }

    fn incomplete(&self) -> GphotoError {
        GphotoError::TransferIncomplete {
            path: self.path.to_string(),
            expected: self.declared_size(),
            received: self.bytes_read,
        }
    }

    /// Copy the rest of the file into `writer` and return the bytes written.
    ///
    /// Bytes from a final chunk whose deletion failed are written before the
    /// error is returned. A transfer that stops short of the declared size is
    /// [`GphotoError::TransferIncomplete`].
    pub fn download_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> GphotoResult<u64> {
        let mut chunk = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            match self.read_chunk(&mut chunk) {
                Ok(outcome) => {
                    writer.write_all(&chunk[..outcome.bytes])?;
                    total += outcome.bytes as u64;
                    if outcome.end_of_stream {
                        break;
                    }
                    if outcome.bytes == 0 {
                        return Err(self.incomplete());
                    }
                }
                Err(ReadError { bytes_read, source }) => {
                    writer.write_all(&chunk[..bytes_read])?;
                    writer.flush()?;
                    return Err(source);
                }
            }
        }
        writer.flush()?;
        Ok(total)
    }
}

impl Read for CameraFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.pending_error.take() {
            return Err(io::Error::other(err));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        match self.read_chunk(buf) {
            Ok(outcome) if outcome.bytes > 0 || outcome.end_of_stream => Ok(outcome.bytes),
            Ok(_) => Err(io::Error::new(io::ErrorKind::UnexpectedEof, self.incomplete())),
            Err(ReadError { bytes_read: 0, source }) => Err(io::Error::other(source)),
            Err(ReadError { bytes_read, source }) => {
                // Hand out the last chunk now, the failure on the next call.
                self.pending_error = Some(source);
                Ok(bytes_read)
            }
        }
    }
}

impl fmt::Debug for CameraFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFile")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("bytes_read", &self.bytes_read)
            .field("declared_size", &self.declared_size())
            .field("delete_after_read", &self.delete_after_read)
            .finish()
    }
}

impl Camera {
    /// Open a reader for a file on the camera.
    ///
    /// `path` is absolute, e.g. `"/store_00010001/DCIM/100CANON/IMG_0001.JPG"`.
    /// The session is negotiated here; nothing is transferred until the
    /// first read.
    pub fn get_file(&self, path: &str) -> GphotoResult<CameraFile<'_>> {
        CameraFile::new(self, RemotePath::parse(path)?, false)
    }

    /// Download a camera file into a newly created local file.
    pub fn download_file_to(&self, remote: &str, local: impl AsRef<Path>) -> GphotoResult<u64> {
        let mut reader = self.get_file(remote)?;
        let mut writer = BufWriter::new(File::create(local.as_ref())?);
        let bytes = reader.download_to(&mut writer)?;
        tracing::info!("Downloaded {} ({} bytes) to {}", remote, bytes, local.as_ref().display());
        Ok(bytes)
    }
}
