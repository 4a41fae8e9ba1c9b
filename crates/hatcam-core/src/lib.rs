//! hatcam-core — Hat overlay coordination engine.
//!
//! Ties a camera capability, a face-detection engine, and an overlay
//! surface together: a fixed-interval polling loop detects a single face
//! per tick and places the selected emoji hat over it.

pub mod adapter;
pub mod controller;
pub mod detector;
pub mod hats;
pub mod media;
pub mod overlay;
pub mod selector;
pub mod types;

pub use controller::{CaptureController, LoopState};
pub use hats::HatKind;
pub use types::{BoundingBox, Placement};
