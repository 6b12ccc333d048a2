//! Camera capability check performed before the capture input is offered.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraAccess {
    Granted,
    Denied(String),
    Unavailable,
}

#[async_trait]
pub trait CameraProbe: Send + Sync {
    async fn probe(&self) -> CameraAccess;
}

/// Probes a V4L-style video device node.
///
/// Opening the node and immediately dropping it mirrors asking for a stream
/// and stopping every track right away.
pub struct DeviceCameraProbe {
    device: Option<PathBuf>,
    search_dir: PathBuf,
}

impl DeviceCameraProbe {
    /// `device` pins a specific node; otherwise the first `video*` entry in
    /// `/dev` is used.
    pub fn new(device: Option<PathBuf>) -> Self {
        Self {
            device,
            search_dir: PathBuf::from("/dev"),
        }
    }

    pub fn with_search_dir(mut self, dir: PathBuf) -> Self {
        self.search_dir = dir;
        self
    }

    async fn find_device(&self) -> Option<PathBuf> {
        let mut entries = tokio::fs::read_dir(&self.search_dir).await.ok()?;
        let mut found = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().starts_with("video") {
                found.push(entry.path());
            }
        }
        found.sort();
        found.into_iter().next()
    }
}

#[async_trait]
impl CameraProbe for DeviceCameraProbe {
    async fn probe(&self) -> CameraAccess {
        let device = match &self.device {
            Some(device) => device.clone(),
            None => match self.find_device().await {
                Some(device) => device,
                None => {
                    tracing::info!("No camera device found in {}", self.search_dir.display());
                    return CameraAccess::Unavailable;
                }
            },
        };

        match tokio::fs::File::open(&device).await {
            Ok(_) => {
                tracing::debug!("Camera {} is accessible", device.display());
                CameraAccess::Granted
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                tracing::error!("Camera access denied for {}: {}", device.display(), e);
                CameraAccess::Denied(e.to_string())
            }
            Err(e) => {
                tracing::warn!("Camera {} cannot be opened: {}", device.display(), e);
                CameraAccess::Unavailable
            }
        }
    }
}

/// Probe with a fixed answer.
pub struct MockCameraProbe {
    access: CameraAccess,
}

impl MockCameraProbe {
    pub fn new(access: CameraAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl CameraProbe for MockCameraProbe {
    async fn probe(&self) -> CameraAccess {
        self.access.clone()
    }
}
