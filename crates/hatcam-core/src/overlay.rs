//! Overlay positioning: pure placement composition and the render seam.

use crate::hats::HatKind;
use crate::types::{BoundingBox, Placement};

/// Where the hat glyph ends up on screen for a detected face.
///
/// Pure composition over the registry's placement functions; no I/O.
pub fn position(hat: HatKind, face: &BoundingBox) -> Placement {
    hat.placement(face)
}

/// Render target for the hat glyph.
///
/// Visibility contract: the surface stays hidden while no capture loop is
/// active and is shown only once a placement has been computed since the
/// current loop started. Every stop path hides it, so a stale placement
/// from a previous session never renders.
pub trait OverlaySurface: Send + Sync + 'static {
    /// Show the glyph at the given placement; the face box supplies the
    /// extent the surface may size itself by.
    fn show(&self, glyph: &str, placement: &Placement, face: &BoundingBox);

    /// Hide the overlay entirely.
    fn hide(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_matches_registry() {
        let face = BoundingBox {
            top: 100.0,
            left: 50.0,
            width: 80.0,
            height: 80.0,
            confidence: 1.0,
        };
        for hat in HatKind::ALL {
            assert_eq!(position(hat, &face), hat.placement(&face));
        }
    }
}
