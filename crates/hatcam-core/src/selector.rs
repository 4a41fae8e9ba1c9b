//! Device selector: enumeration with a once-per-process cache.

use crate::media::MediaAccess;
use crate::types::CaptureDevice;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tracks the capture devices the platform exposes.
///
/// The platform enumeration runs at most once per process lifetime after
/// its first non-empty success; an empty result is returned as-is and the
/// next call enumerates again. Platform failures degrade silently to an
/// empty set, which callers treat as "no device available".
pub struct DeviceSelector<M: MediaAccess> {
    media: Arc<M>,
    cached: Mutex<Option<Vec<CaptureDevice>>>,
}

impl<M: MediaAccess> DeviceSelector<M> {
    pub fn new(media: Arc<M>) -> Self {
        Self {
            media,
            cached: Mutex::new(None),
        }
    }

    pub async fn enumerate(&self) -> Vec<CaptureDevice> {
        let mut cached = self.cached.lock().await;
        if let Some(devices) = cached.as_ref() {
            return devices.clone();
        }

        match self.media.enumerate_devices() {
            Ok(devices) => {
                if !devices.is_empty() {
                    *cached = Some(devices.clone());
                }
                tracing::debug!(count = devices.len(), "enumerated capture devices");
                devices
            }
            Err(e) => {
                tracing::warn!(error = %e, "device enumeration failed; treating as no devices");
                Vec::new()
            }
        }
    }

    /// The default device: first enumerated entry, if any.
    pub async fn default_device(&self) -> Option<String> {
        self.enumerate().await.first().map(|d| d.id.clone())
    }
}
