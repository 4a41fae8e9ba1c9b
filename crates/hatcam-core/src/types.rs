use serde::{Deserialize, Serialize};

/// Rectangle describing a detected face's position and size, in pixels
/// relative to the video frame. Produced fresh each detection cycle and
/// never retained across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    /// Detection score reported by the engine, in [0, 1].
    pub confidence: f32,
}

/// Computed screen position and size for a hat glyph, derived from a
/// [`BoundingBox`]. Ephemeral: recomputed on every detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub top: f32,
    pub left: f32,
    pub font_size: f32,
    /// Explicit width override; most hats scale by font size alone.
    pub width: Option<f32>,
}

/// A captured grayscale camera frame, handed to the detector each tick.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A camera/video input source exposed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDevice {
    pub id: String,
    pub label: String,
}

/// Preferred capture parameters for stream acquisition. Width and height
/// are "ideal" values; the driver may negotiate something close.
#[derive(Debug, Clone)]
pub struct StreamConstraints {
    pub width: u32,
    pub height: u32,
    /// Target device id; `None` lets the platform pick a default.
    pub device_id: Option<String>,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints_720p() {
        let c = StreamConstraints::default();
        assert_eq!(c.width, 1280);
        assert_eq!(c.height, 720);
        assert!(c.device_id.is_none());
    }
}
