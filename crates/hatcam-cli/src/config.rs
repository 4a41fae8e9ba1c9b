use hatcam_core::detector::DEFAULT_CONFIDENCE_THRESHOLD;
use std::time::Duration;

/// Runtime configuration, loaded from `HATCAM_*` environment variables.
pub struct Config {
    /// Path to the face detection ONNX model.
    pub model_path: String,
    /// Interval between detection ticks.
    pub tick_interval: Duration,
    /// Preferred capture width (ideal, driver may negotiate).
    pub frame_width: u32,
    /// Preferred capture height.
    pub frame_height: u32,
    /// Minimum detection score for a candidate to count as a face.
    pub confidence_threshold: f32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            model_path: std::env::var("HATCAM_MODEL_PATH")
                .unwrap_or_else(|_| "models/slim-320.onnx".to_string()),
            tick_interval: Duration::from_millis(env_u64("HATCAM_TICK_INTERVAL_MS", 60)),
            frame_width: env_u32("HATCAM_FRAME_WIDTH", 1280),
            frame_height: env_u32("HATCAM_FRAME_HEIGHT", 720),
            confidence_threshold: env_f32(
                "HATCAM_CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            ),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
