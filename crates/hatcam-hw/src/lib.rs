//! hatcam-hw — V4L2 implementation of the camera-access capability.

pub mod camera;
pub mod convert;

pub use camera::{V4lMedia, V4lStream};
