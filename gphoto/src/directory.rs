//! Folder and file listing

use crate::camera::Camera;
use crate::error::{check, GphotoResult};
use crate::handle::{ListKind, NativeHandle};
use crate::path::{is_folder_entry, normalize_folder};
use crate::utils::to_cstring;

impl Camera {
    /// List one folder on the camera.
    ///
    /// Returns absolute paths: sub-folders first (each ending with `/`), then
    /// files, each group in the order the camera reports it.
    pub fn list_directory(&self, path: &str) -> GphotoResult<Vec<String>> {
        let session = self.acquire()?;
        let sdk = session.sdk();
        let dir = normalize_folder(path);
        let folder = to_cstring(&dir, "folder")?;

        let folders = NativeHandle::<ListKind>::new_list(sdk)?;
        check(
            sdk,
            unsafe {
                (sdk.camera_folder_list_folders)(session.as_ptr(), folder.as_ptr(), folders.as_ptr(), self.context().as_ptr())
            },
            "unable to list folders",
        )?;
        let mut entries: Vec<String> = folders
            .names()?
            .into_iter()
            .map(|name| format!("{}{}/", dir, name))
            .collect();
        drop(folders);

        let files = NativeHandle::<ListKind>::new_list(sdk)?;
        check(
            sdk,
            unsafe {
                (sdk.camera_folder_list_files)(session.as_ptr(), folder.as_ptr(), files.as_ptr(), self.context().as_ptr())
            },
            "unable to list files",
        )?;
        entries.extend(files.names()?.into_iter().map(|name| format!("{}{}", dir, name)));

        tracing::debug!("Listed {} entries in {}", entries.len(), dir);
        Ok(entries)
    }

    /// Every file below `path`, depth first, folders expanded in place.
    ///
    /// Any listing failure aborts the whole walk.
    pub fn list_directory_recursive(&self, path: &str) -> GphotoResult<Vec<String>> {
        let mut files = Vec::new();
        self.expand_into(path, &mut files)?;
        Ok(files)
    }

    fn expand_into(&self, path: &str, out: &mut Vec<String>) -> GphotoResult<()> {
        for entry in self.list_directory(path)? {
            if is_folder_entry(&entry) {
                self.expand_into(&entry, out)?;
            } else {
                out.push(entry);
            }
        }
        Ok(())
    }
}
