//! Cue kinds and their tone profiles.
//!
//! Phase labels are resolved to a [`CueKind`] once, when the catalog is
//! built. A label with no mapping is a catalog error, so dispatchers never
//! see an unknown cue at runtime.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Inhale,
    Hold,
    Exhale,
}

/// Parameters for a synthesized cue tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneProfile {
    /// Starting pitch.
    pub frequency_hz: f32,
    /// Pitch at the end of the tone; `None` for a flat tone.
    pub glide_to_hz: Option<f32>,
    pub length_ms: u32,
    /// Peak gain, 0.0 .. 1.0.
    pub gain: f32,
}

/// Played once when a bounded session reaches its configured duration.
pub const COMPLETION_TONE: ToneProfile = ToneProfile {
    frequency_hz: 523.25,
    glide_to_hz: Some(261.63),
    length_ms: 1200,
    gain: 0.35,
};

impl CueKind {
    /// Resolve a phase label to a cue. Matching is case-insensitive and
    /// ignores surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "inhale" | "breathe in" | "in" => Some(Self::Inhale),
            "hold" | "pause" | "rest" => Some(Self::Hold),
            "exhale" | "breathe out" | "out" => Some(Self::Exhale),
            _ => None,
        }
    }

    pub fn tone(self) -> ToneProfile {
        match self {
            Self::Inhale => ToneProfile {
                frequency_hz: 220.0,
                glide_to_hz: Some(330.0),
                length_ms: 600,
                gain: 0.25,
            },
            Self::Hold => ToneProfile {
                frequency_hz: 392.0,
                glide_to_hz: None,
                length_ms: 250,
                gain: 0.15,
            },
            Self::Exhale => ToneProfile {
                frequency_hz: 330.0,
                glide_to_hz: Some(220.0),
                length_ms: 600,
                gain: 0.25,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_resolve_case_insensitively() {
        assert_eq!(CueKind::from_label("Inhale"), Some(CueKind::Inhale));
        assert_eq!(CueKind::from_label("  EXHALE "), Some(CueKind::Exhale));
        assert_eq!(CueKind::from_label("hold"), Some(CueKind::Hold));
        assert_eq!(CueKind::from_label("breathe in"), Some(CueKind::Inhale));
    }

    #[test]
    fn unknown_label_has_no_cue() {
        assert_eq!(CueKind::from_label("sniff"), None);
        assert_eq!(CueKind::from_label(""), None);
    }

    #[test]
    fn inhale_rises_and_exhale_falls() {
        let up = CueKind::Inhale.tone();
        let down = CueKind::Exhale.tone();
        assert!(up.glide_to_hz.unwrap() > up.frequency_hz);
        assert!(down.glide_to_hz.unwrap() < down.frequency_hz);
        assert!(CueKind::Hold.tone().glide_to_hz.is_none());
    }
}
