//! Still image capture

use crate::camera::Camera;
use crate::error::{check, GphotoResult};
use crate::ffi::{CameraFilePath, GP_CAPTURE_IMAGE};
use crate::file::CameraFile;
use crate::path::RemotePath;
use crate::utils::safe_char_array_to_string;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

impl Camera {
    /// Take a picture and return a reader for the new file.
    ///
    /// The file is deleted from the camera once the reader reaches end of
    /// stream. No readiness wait is done before triggering.
    pub fn capture_image(&self) -> GphotoResult<CameraFile<'_>> {
        let session = self.acquire()?;
        let sdk = session.sdk();

        let mut captured = CameraFilePath::empty();
        check(
            sdk,
            unsafe { (sdk.camera_capture)(session.as_ptr(), GP_CAPTURE_IMAGE, &mut captured, self.context().as_ptr()) },
            "unable to capture image",
        )?;

        let path = RemotePath::new(
            safe_char_array_to_string(&captured.folder),
            safe_char_array_to_string(&captured.name),
        );
        tracing::info!("Captured {} on {}", path, self);
        CameraFile::new(self, path, true)
    }

    /// Take a picture and download it to a newly created local file.
    ///
    /// Returns the number of bytes written. The camera copy is removed after
    /// the download completes.
    pub fn capture_image_to(&self, destination: impl AsRef<Path>) -> GphotoResult<u64> {
        let destination = destination.as_ref();
        let mut reader = self.capture_image()?;
        let mut writer = BufWriter::new(File::create(destination)?);
        let bytes = reader.download_to(&mut writer)?;
        tracing::info!("Saved capture {} ({} bytes) to {}", reader.path(), bytes, destination.display());
        Ok(bytes)
    }
}
