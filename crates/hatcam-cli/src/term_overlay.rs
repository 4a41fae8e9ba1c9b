//! Terminal overlay surface: places the hat glyph on an ANSI grid scaled
//! down from frame coordinates.

use hatcam_core::overlay::OverlaySurface;
use hatcam_core::types::{BoundingBox, Placement};
use std::io::{self, Write};
use std::sync::Mutex;

const GRID_COLS: f32 = 80.0;
const GRID_ROWS: f32 = 24.0;

pub struct TermOverlay {
    frame_width: f32,
    frame_height: f32,
    out: Mutex<io::Stdout>,
}

impl TermOverlay {
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width: frame_width as f32,
            frame_height: frame_height as f32,
            out: Mutex::new(io::stdout()),
        }
    }

    /// Map a pixel-space placement to a 1-based terminal cell.
    fn cell(&self, placement: &Placement) -> (u16, u16) {
        let row = (placement.top.max(0.0) / self.frame_height * GRID_ROWS)
            .clamp(0.0, GRID_ROWS - 1.0) as u16
            + 1;
        let col = (placement.left.max(0.0) / self.frame_width * GRID_COLS)
            .clamp(0.0, GRID_COLS - 1.0) as u16
            + 1;
        (row, col)
    }
}

impl OverlaySurface for TermOverlay {
    fn show(&self, glyph: &str, placement: &Placement, _face: &BoundingBox) {
        let (row, col) = self.cell(placement);
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        let _ = write!(out, "\x1b[2J\x1b[{row};{col}H{glyph}");
        let _ = out.flush();
    }

    fn hide(&self) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        let _ = write!(out, "\x1b[2J\x1b[H");
        let _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_scales_and_clamps() {
        let overlay = TermOverlay::new(1280, 720);

        let centered = Placement {
            top: 360.0,
            left: 640.0,
            font_size: 80.0,
            width: None,
        };
        assert_eq!(overlay.cell(&centered), (13, 41));

        // Hats above the frame top clamp to the first row.
        let above = Placement {
            top: -50.0,
            left: 0.0,
            font_size: 80.0,
            width: None,
        };
        assert_eq!(overlay.cell(&above), (1, 1));
    }
}
