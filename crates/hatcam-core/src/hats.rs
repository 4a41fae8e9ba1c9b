//! The hat registry: every wearable hat, its glyph, and its placement math.

use crate::types::{BoundingBox, Placement};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("unknown hat id: {0}")]
pub struct UnknownHat(pub String);

/// The available hats. Declaration order is the presentation order.
///
/// Each variant carries a pure placement function: given a face bounding
/// box it deterministically returns where the glyph sits. No variant is
/// added or removed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatKind {
    Tophat,
    Bowhat,
    Cap,
    GraduationCap,
    RescueHelmet,
}

impl HatKind {
    pub const ALL: [HatKind; 5] = [
        HatKind::Tophat,
        HatKind::Bowhat,
        HatKind::Cap,
        HatKind::GraduationCap,
        HatKind::RescueHelmet,
    ];

    pub fn id(self) -> &'static str {
        match self {
            HatKind::Tophat => "tophat",
            HatKind::Bowhat => "bowhat",
            HatKind::Cap => "cap",
            HatKind::GraduationCap => "graduationcap",
            HatKind::RescueHelmet => "rescuehelmet",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            HatKind::Tophat => "🎩",
            HatKind::Bowhat => "👒",
            HatKind::Cap => "🧢",
            HatKind::GraduationCap => "🎓",
            HatKind::RescueHelmet => "⛑️",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, UnknownHat> {
        Self::ALL
            .into_iter()
            .find(|h| h.id() == id)
            .ok_or_else(|| UnknownHat(id.to_string()))
    }

    /// Where the glyph sits for a given face box.
    ///
    /// Pure and deterministic: same box, same placement. Brim hats sit
    /// flush on the box top edge, the top hat rides a little higher, the
    /// cap tilts off to the left.
    pub fn placement(self, b: &BoundingBox) -> Placement {
        match self {
            HatKind::Tophat => Placement {
                top: b.top - b.height * 1.1,
                left: b.left,
                font_size: b.height,
                width: None,
            },
            HatKind::Bowhat => Placement {
                top: b.top - b.height,
                left: b.left + b.width * 0.1,
                font_size: b.height,
                width: Some(b.width),
            },
            HatKind::Cap => Placement {
                top: b.top - b.height * 0.8,
                left: b.left - b.width * 0.1,
                font_size: b.height * 0.9,
                width: None,
            },
            HatKind::GraduationCap => Placement {
                top: b.top - b.height,
                left: b.left,
                font_size: b.height,
                width: None,
            },
            HatKind::RescueHelmet => Placement {
                top: b.top - b.height * 0.75,
                left: b.left,
                font_size: b.height * 0.9,
                width: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face() -> BoundingBox {
        BoundingBox {
            top: 100.0,
            left: 50.0,
            width: 80.0,
            height: 80.0,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_all_order_is_declaration_order() {
        let ids: Vec<&str> = HatKind::ALL.iter().map(|h| h.id()).collect();
        assert_eq!(
            ids,
            vec!["tophat", "bowhat", "cap", "graduationcap", "rescuehelmet"]
        );
    }

    #[test]
    fn test_from_id_roundtrip() {
        for hat in HatKind::ALL {
            assert_eq!(HatKind::from_id(hat.id()).unwrap(), hat);
        }
    }

    #[test]
    fn test_from_id_unknown() {
        let err = HatKind::from_id("fedora").unwrap_err();
        assert_eq!(err.0, "fedora");
    }

    #[test]
    fn test_tophat_placement() {
        let p = HatKind::Tophat.placement(&face());
        assert_eq!(p.top, 12.0);
        assert_eq!(p.left, 50.0);
        assert_eq!(p.font_size, 80.0);
        assert_eq!(p.width, None);
    }

    #[test]
    fn test_cap_placement() {
        let p = HatKind::Cap.placement(&face());
        assert_eq!(p.top, 36.0);
        assert_eq!(p.left, 42.0);
        assert_eq!(p.font_size, 72.0);
        assert_eq!(p.width, None);
    }

    #[test]
    fn test_bowhat_width_override() {
        let p = HatKind::Bowhat.placement(&face());
        assert_eq!(p.top, 20.0);
        assert_eq!(p.left, 58.0);
        assert_eq!(p.width, Some(80.0));
    }

    #[test]
    fn test_placement_is_deterministic() {
        let b = face();
        for hat in HatKind::ALL {
            assert_eq!(hat.placement(&b), hat.placement(&b));
        }
    }
}
