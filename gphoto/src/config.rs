//! Configuration for loading libgphoto2 and supervising camera calls

use crate::error::{GphotoError, GphotoResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Library search paths and timeouts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GphotoConfig {
    /// Extra locations for libgphoto2, tried before the platform defaults
    pub library_paths: Vec<PathBuf>,
    /// Extra locations for libgphoto2_port, tried before the platform defaults
    pub port_library_paths: Vec<PathBuf>,
    pub timeouts: TransferTimeoutConfig,
}

impl GphotoConfig {
    pub fn from_json_str(json: &str) -> GphotoResult<Self> {
        serde_json::from_str(json).map_err(|e| GphotoError::Io(e.into()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> GphotoResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(GphotoError::Io)?;
        tracing::debug!("Loaded gphoto config from {}", path.display());
        Self::from_json_str(&json)
    }
}

/// Timeouts applied by [`SupervisedCamera`](crate::SupervisedCamera)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransferTimeoutConfig {
    /// Folder and file listing (default: 30 seconds)
    pub listing_timeout_secs: u64,
    /// Whole-file download (default: 120 seconds for large RAW files)
    pub download_timeout_secs: u64,
    /// Capture plus download of the captured image (default: 60 seconds)
    pub capture_timeout_secs: u64,
}

impl Default for TransferTimeoutConfig {
    fn default() -> Self {
        Self {
            listing_timeout_secs: 30,
            download_timeout_secs: 120,
            capture_timeout_secs: 60,
        }
    }
}

impl TransferTimeoutConfig {
    /// Shorter timeouts for fast cameras on a good USB connection.
    pub fn strict() -> Self {
        Self {
            listing_timeout_secs: 10,
            download_timeout_secs: 30,
            capture_timeout_secs: 20,
        }
    }

    /// Longer timeouts for slow devices, USB 2.0 hubs and bulb captures.
    pub fn lenient() -> Self {
        Self {
            listing_timeout_secs: 60,
            download_timeout_secs: 600,
            capture_timeout_secs: 300,
        }
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}
