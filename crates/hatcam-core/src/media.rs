//! Capability seam for platform camera access.

use crate::types::{CaptureDevice, Frame, StreamConstraints};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaAccessError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// Platform camera capability: device discovery and stream acquisition.
pub trait MediaAccess: Send + Sync + 'static {
    type Stream: MediaStream;

    /// List available video capture devices. A platform with no cameras
    /// legitimately returns an empty list.
    fn enumerate_devices(&self) -> Result<Vec<CaptureDevice>, MediaAccessError>;

    /// Acquire a capture stream honoring the constraints as ideal values.
    fn open_stream(&self, constraints: &StreamConstraints) -> Result<Self::Stream, MediaAccessError>;
}

/// An acquired capture stream.
pub trait MediaStream: Send + 'static {
    /// Grab the current frame as grayscale pixels.
    fn grab_frame(&mut self) -> Result<Frame, MediaAccessError>;

    /// Release the underlying hardware tracks. Further grabs fail.
    fn stop(&mut self);
}
