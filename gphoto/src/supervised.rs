//! Async, time-bounded access to a camera
//!
//! libgphoto2 calls block on USB I/O and cannot be interrupted. A
//! [`SupervisedCamera`] runs each operation on tokio's blocking pool behind a
//! mutex and stops waiting once the configured timeout expires. The native
//! call itself keeps running to completion; the next operation queues on the
//! mutex until it has.

use crate::camera::Camera;
use crate::config::TransferTimeoutConfig;
use crate::error::{GphotoError, GphotoResult};
use crate::utils::with_timeout;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub struct SupervisedCamera {
    camera: Arc<Mutex<Camera>>,
    timeouts: TransferTimeoutConfig,
    label: String,
}

impl SupervisedCamera {
    pub fn new(camera: Camera, timeouts: TransferTimeoutConfig) -> Self {
        let label = camera.to_string();
        Self {
            camera: Arc::new(Mutex::new(camera)),
            timeouts,
            label,
        }
    }

    /// `"{model} on {port}"` of the wrapped camera.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timeouts(&self) -> &TransferTimeoutConfig {
        &self.timeouts
    }

    pub async fn list_directory(&self, path: &str) -> GphotoResult<Vec<String>> {
        let path = path.to_string();
        self.run("list_directory", self.timeouts.listing_timeout(), move |camera| {
            camera.list_directory(&path)
        })
        .await
    }

    pub async fn list_directory_recursive(&self, path: &str) -> GphotoResult<Vec<String>> {
        let path = path.to_string();
        self.run("list_directory_recursive", self.timeouts.listing_timeout(), move |camera| {
            camera.list_directory_recursive(&path)
        })
        .await
    }

    pub async fn download_file_to(&self, remote: &str, local: impl AsRef<Path>) -> GphotoResult<u64> {
        let remote = remote.to_string();
        let local = local.as_ref().to_path_buf();
        self.run("download_file_to", self.timeouts.download_timeout(), move |camera| {
            camera.download_file_to(&remote, &local)
        })
        .await
    }

    pub async fn capture_image_to(&self, destination: impl AsRef<Path>) -> GphotoResult<u64> {
        let destination: PathBuf = destination.as_ref().to_path_buf();
        self.run("capture_image_to", self.timeouts.capture_timeout(), move |camera| {
            camera.capture_image_to(&destination)
        })
        .await
    }

    async fn run<T, F>(&self, operation: &str, timeout: Duration, task: F) -> GphotoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Camera) -> GphotoResult<T> + Send + 'static,
    {
        let camera = Arc::clone(&self.camera);
        let name = format!("{} on {}", operation, self.label);
        tracing::debug!("Starting {}", name);

        with_timeout(
            || async move {
                tokio::task::spawn_blocking(move || {
                    let camera = camera.lock().unwrap_or_else(PoisonError::into_inner);
                    task(&camera)
                })
                .await
                .map_err(|e| GphotoError::TaskFailed(e.to_string()))?
            },
            timeout,
            name,
        )
        .await
    }
}

impl std::fmt::Debug for SupervisedCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisedCamera")
            .field("label", &self.label)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}
