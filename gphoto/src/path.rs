//! Camera-side path rules
//!
//! Folder paths always end with `/`. A listing entry that ends with `/` is a
//! folder, anything else is a file.

use crate::error::{GphotoError, GphotoResult};
use std::fmt;

/// Append the trailing separator if it is missing. An empty path is the root.
pub fn normalize_folder(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

pub fn is_folder_entry(entry: &str) -> bool {
    entry.ends_with('/')
}

/// A file on the camera: normalised folder plus file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    folder: String,
    name: String,
}

impl RemotePath {
    pub fn new(folder: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            folder: normalize_folder(folder.as_ref()),
            name: name.into(),
        }
    }

    /// Split an absolute path at its last separator.
    ///
    /// `"/store_00010001/DCIM/100CANON/IMG_0001.JPG"` becomes folder
    /// `"/store_00010001/DCIM/100CANON/"` and name `"IMG_0001.JPG"`. A path
    /// without a separator is taken relative to the root.
    pub fn parse(path: &str) -> GphotoResult<Self> {
        let (folder, name) = path.rsplit_once('/').unwrap_or(("", path));
        if name.is_empty() {
            return Err(GphotoError::InvalidPath(format!("{:?} does not name a file", path)));
        }
        Ok(Self::new(folder, name))
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.folder, self.name)
    }
}
