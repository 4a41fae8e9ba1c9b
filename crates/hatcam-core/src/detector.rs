//! Slim face detector via ONNX Runtime.
//!
//! Runs an UltraFace-style single-class detector: the model takes one
//! 320×240 RGB tensor and emits `scores` [1, N, 2] plus `boxes` [1, N, 4]
//! with corner coordinates normalized to [0, 1]. Post-processing is a
//! confidence threshold followed by NMS; the highest-confidence survivor
//! wins.

use crate::adapter::{DetectionError, FaceEngine, ModelLoadError};
use crate::types::{BoundingBox, Frame};
use image::imageops::FilterType;
use image::GrayImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

// --- Named constants (no magic numbers) ---
const INPUT_WIDTH: u32 = 320;
const INPUT_HEIGHT: u32 = 240;
const INPUT_MEAN: f32 = 127.0;
const INPUT_STD: f32 = 128.0;
const NMS_IOU_THRESHOLD: f32 = 0.3;

/// Minimum detection score for a candidate to count as a face.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// ONNX-backed face detector implementing [`FaceEngine`].
pub struct SlimFaceDetector {
    session: Session,
    confidence_threshold: f32,
    /// Output tensor indices (scores, boxes), resolved by name at load
    /// time; falls back to positional ordering for generic names.
    output_indices: (usize, usize),
}

impl SlimFaceDetector {
    /// Load the detection model from the given path.
    pub fn load(model_path: &str) -> Result<Self, ModelLoadError> {
        Self::load_with_threshold(model_path, DEFAULT_CONFIDENCE_THRESHOLD)
    }

    pub fn load_with_threshold(
        model_path: &str,
        confidence_threshold: f32,
    ) -> Result<Self, ModelLoadError> {
        if !Path::new(model_path).exists() {
            return Err(ModelLoadError(format!(
                "model file not found: {model_path}"
            )));
        }

        let session = Session::builder()
            .and_then(|b| Ok(b.with_intra_threads(2)?))
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| ModelLoadError(format!("{model_path}: {e}")))?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        if output_names.len() < 2 {
            return Err(ModelLoadError(format!(
                "detector model requires scores and boxes outputs, got {}",
                output_names.len()
            )));
        }

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| i.name().to_string()).collect::<Vec<_>>(),
            outputs = ?output_names,
            "loaded face detection model"
        );

        // Discover output ordering by name; exports with generic integer
        // names fall back to the standard scores-then-boxes order.
        let output_indices = resolve_output_indices(&output_names);
        tracing::debug!(?output_indices, "detector output tensor mapping");

        Ok(Self {
            session,
            confidence_threshold,
            output_indices,
        })
    }

    /// Resize the grayscale frame to the model input and replicate the
    /// single channel into the three the model expects, NCHW normalized.
    fn preprocess(&self, frame: &Frame) -> Result<Array4<f32>, DetectionError> {
        let gray = GrayImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| {
                DetectionError::FrameSource(format!(
                    "frame buffer shorter than {}x{}",
                    frame.width, frame.height
                ))
            })?;
        let resized = image::imageops::resize(&gray, INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);

        let mut input =
            Array4::<f32>::zeros((1, 3, INPUT_HEIGHT as usize, INPUT_WIDTH as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let value = (pixel[0] as f32 - INPUT_MEAN) / INPUT_STD;
            for channel in 0..3 {
                input[[0, channel, y as usize, x as usize]] = value;
            }
        }
        Ok(input)
    }
}

impl FaceEngine for SlimFaceDetector {
    fn detect_single_face(&mut self, frame: &Frame) -> Result<Option<BoundingBox>, DetectionError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(DetectionError::FrameSource("zero-sized frame".into()));
        }

        let input = self.preprocess(frame)?;
        let tensor = TensorRef::from_array_view(input.view()).map_err(engine_fault)?;
        let outputs = self.session.run(ort::inputs![tensor]).map_err(engine_fault)?;

        let (scores_idx, boxes_idx) = self.output_indices;
        let (_, scores) = outputs[scores_idx]
            .try_extract_tensor::<f32>()
            .map_err(engine_fault)?;
        let (_, boxes) = outputs[boxes_idx]
            .try_extract_tensor::<f32>()
            .map_err(engine_fault)?;

        let candidates = decode(
            scores,
            boxes,
            self.confidence_threshold,
            frame.width as f32,
            frame.height as f32,
        );
        let kept = non_max_suppression(candidates, NMS_IOU_THRESHOLD);

        tracing::debug!(kept = kept.len(), "detection pass complete");
        Ok(kept.into_iter().next())
    }
}

fn engine_fault(e: ort::Error) -> DetectionError {
    DetectionError::Engine(format!("inference failed: {e}"))
}

/// Locate the `scores` and `boxes` output tensors by name.
fn resolve_output_indices(names: &[String]) -> (usize, usize) {
    let scores = names.iter().position(|n| n == "scores");
    let boxes = names.iter().position(|n| n == "boxes");
    match (scores, boxes) {
        (Some(s), Some(b)) => (s, b),
        _ => (0, 1),
    }
}

/// Turn raw score/box tensors into pixel-space candidates above the
/// confidence threshold, best first.
fn decode(
    scores: &[f32],
    boxes: &[f32],
    threshold: f32,
    frame_w: f32,
    frame_h: f32,
) -> Vec<BoundingBox> {
    let count = scores.len() / 2;
    let mut candidates = Vec::new();

    for i in 0..count.min(boxes.len() / 4) {
        let confidence = scores[i * 2 + 1];
        if confidence < threshold {
            continue;
        }

        let x1 = boxes[i * 4].clamp(0.0, 1.0) * frame_w;
        let y1 = boxes[i * 4 + 1].clamp(0.0, 1.0) * frame_h;
        let x2 = boxes[i * 4 + 2].clamp(0.0, 1.0) * frame_w;
        let y2 = boxes[i * 4 + 3].clamp(0.0, 1.0) * frame_h;
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        candidates.push(BoundingBox {
            top: y1,
            left: x1,
            width: x2 - x1,
            height: y2 - y1,
            confidence,
        });
    }

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

/// Greedy NMS over confidence-sorted candidates.
fn non_max_suppression(candidates: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    let mut kept: Vec<BoundingBox> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| iou(k, &candidate) < iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// Intersection-over-union of two boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.left.max(b.left);
    let y1 = a.top.max(b.top);
    let x2 = (a.left + a.width).min(b.left + b.width);
    let y2 = (a.top + a.height).min(b.top + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(top: f32, left: f32, width: f32, height: f32, confidence: f32) -> BoundingBox {
        BoundingBox {
            top,
            left,
            width,
            height,
            confidence,
        }
    }

    #[test]
    fn test_resolve_output_indices_by_name() {
        // Swapped export order still maps scores/boxes correctly.
        let names = vec!["boxes".to_string(), "scores".to_string()];
        assert_eq!(resolve_output_indices(&names), (1, 0));
    }

    #[test]
    fn test_resolve_output_indices_positional_fallback() {
        let names = vec!["428".to_string(), "429".to_string()];
        assert_eq!(resolve_output_indices(&names), (0, 1));
    }

    #[test]
    fn test_decode_filters_by_threshold() {
        // Two anchors: one at 0.9, one at 0.3
        let scores = vec![0.1, 0.9, 0.7, 0.3];
        let boxes = vec![0.1, 0.1, 0.5, 0.5, 0.2, 0.2, 0.6, 0.6];
        let result = decode(&scores, &boxes, 0.7, 100.0, 100.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].confidence, 0.9);
    }

    #[test]
    fn test_decode_scales_to_frame_pixels() {
        let scores = vec![0.1, 0.9];
        let boxes = vec![0.25, 0.1, 0.75, 0.5];
        let result = decode(&scores, &boxes, 0.5, 320.0, 240.0);
        assert_eq!(result.len(), 1);
        let b = &result[0];
        assert_eq!(b.left, 80.0);
        assert_eq!(b.top, 24.0);
        assert_eq!(b.width, 160.0);
        assert_eq!(b.height, 96.0);
    }

    #[test]
    fn test_decode_drops_degenerate_boxes() {
        let scores = vec![0.0, 0.95];
        // x2 < x1
        let boxes = vec![0.8, 0.1, 0.2, 0.5];
        assert!(decode(&scores, &boxes, 0.5, 100.0, 100.0).is_empty());
    }

    #[test]
    fn test_decode_sorts_best_first() {
        let scores = vec![0.2, 0.8, 0.05, 0.95];
        let boxes = vec![0.0, 0.0, 0.3, 0.3, 0.5, 0.5, 0.9, 0.9];
        let result = decode(&scores, &boxes, 0.5, 100.0, 100.0);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].confidence, 0.95);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let a = bbox(10.0, 10.0, 50.0, 50.0, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = bbox(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = bbox(100.0, 100.0, 10.0, 10.0, 1.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_nms_suppresses_overlaps() {
        let candidates = vec![
            bbox(10.0, 10.0, 50.0, 50.0, 0.95),
            bbox(12.0, 12.0, 50.0, 50.0, 0.90), // heavy overlap with the first
            bbox(200.0, 200.0, 40.0, 40.0, 0.80),
        ];
        let kept = non_max_suppression(candidates, 0.3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.95);
        assert_eq!(kept[1].confidence, 0.80);
    }

    #[test]
    fn test_nms_keeps_all_when_disjoint() {
        let candidates = vec![
            bbox(0.0, 0.0, 10.0, 10.0, 0.9),
            bbox(50.0, 50.0, 10.0, 10.0, 0.8),
        ];
        assert_eq!(non_max_suppression(candidates, 0.3).len(), 2);
    }
}
