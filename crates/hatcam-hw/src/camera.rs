//! V4L2 camera capture via the `v4l` crate.

use hatcam_core::media::{MediaAccess, MediaAccessError, MediaStream};
use hatcam_core::types::{CaptureDevice, Frame, StreamConstraints};
use std::path::Path;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

use crate::convert;

const MAX_DEVICE_NODES: usize = 16;
const DEFAULT_DEVICE: &str = "/dev/video0";

/// Camera access backed by V4L2 devices under `/dev/video*`.
pub struct V4lMedia;

impl MediaAccess for V4lMedia {
    type Stream = V4lStream;

    fn enumerate_devices(&self) -> Result<Vec<CaptureDevice>, MediaAccessError> {
        let mut devices = Vec::new();

        for i in 0..MAX_DEVICE_NODES {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                continue;
            }
            devices.push(CaptureDevice {
                id: path,
                label: caps.card.clone(),
            });
        }

        tracing::debug!(count = devices.len(), "enumerated V4L2 capture devices");
        Ok(devices)
    }

    fn open_stream(&self, constraints: &StreamConstraints) -> Result<V4lStream, MediaAccessError> {
        let path = constraints
            .device_id
            .clone()
            .unwrap_or_else(|| DEFAULT_DEVICE.to_string());

        if !Path::new(&path).exists() {
            return Err(MediaAccessError::DeviceNotFound(path));
        }

        let device = Device::with_path(&path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                MediaAccessError::DeviceBusy
            } else {
                MediaAccessError::AccessDenied(format!("{path}: {e}"))
            }
        })?;

        let caps = device.query_caps().map_err(|e| {
            MediaAccessError::CaptureFailed(format!("failed to query capabilities: {e}"))
        })?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(MediaAccessError::FormatNegotiationFailed(
                "device cannot capture video".into(),
            ));
        }

        // Constraints are ideal values: ask for YUYV at the preferred size
        // and accept whatever resolution the driver negotiates.
        let mut fmt = device.format().map_err(|e| {
            MediaAccessError::FormatNegotiationFailed(format!("failed to get format: {e}"))
        })?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = constraints.width;
        fmt.height = constraints.height;

        let negotiated = device.set_format(&fmt).map_err(|e| {
            MediaAccessError::FormatNegotiationFailed(format!("failed to set format: {e}"))
        })?;
        if negotiated.fourcc != FourCC::new(b"YUYV") {
            return Err(MediaAccessError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {:?} (need YUYV)",
                negotiated.fourcc
            )));
        }

        tracing::info!(
            device = %path,
            driver = %caps.driver,
            card = %caps.card,
            width = negotiated.width,
            height = negotiated.height,
            "opened capture stream"
        );

        Ok(V4lStream {
            device: Some(device),
            width: negotiated.width,
            height: negotiated.height,
            path,
        })
    }
}

/// An open V4L2 capture stream. `stop` releases the device handle; a
/// stopped stream refuses further grabs.
pub struct V4lStream {
    device: Option<Device>,
    width: u32,
    height: u32,
    path: String,
}

impl MediaStream for V4lStream {
    fn grab_frame(&mut self) -> Result<Frame, MediaAccessError> {
        let Some(device) = self.device.as_ref() else {
            return Err(MediaAccessError::CaptureFailed(
                "stream already stopped".into(),
            ));
        };

        let mut stream = MmapStream::with_buffers(device, BufType::VideoCapture, 4)
            .map_err(|e| {
                MediaAccessError::CaptureFailed(format!("failed to create mmap stream: {e}"))
            })?;

        let (buf, _meta) = stream.next().map_err(|e| {
            MediaAccessError::CaptureFailed(format!("failed to dequeue buffer: {e}"))
        })?;

        let data = convert::yuyv_to_grayscale(buf, self.width, self.height)
            .map_err(|e| MediaAccessError::CaptureFailed(e.to_string()))?;

        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
        })
    }

    fn stop(&mut self) {
        if self.device.take().is_some() {
            tracing::info!(device = %self.path, "capture stream released");
        }
    }
}
