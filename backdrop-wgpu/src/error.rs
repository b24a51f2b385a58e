use thiserror::Error;

use crate::device::CameraId;

/// Errors surfaced by the blur device and its consumers.
#[derive(Error, Debug)]
pub enum BlurError {
    /// No GPU adapter matched the request
    #[error("Failed to find suitable GPU adapter")]
    AdapterUnavailable,

    /// Device creation failed
    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// A pass wanted the scene color of a camera the host never published
    #[error("No scene color map published for camera {0:?}")]
    MissingSceneColor(CameraId),

    /// Settings document could not be parsed
    #[error("Invalid blur settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}
