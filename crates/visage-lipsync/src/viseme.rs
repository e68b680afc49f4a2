//! Oculus viseme set, phoneme lookup and mouth poses

use serde::{Deserialize, Serialize};
use visage_core::{BlendshapeWeights, Channel};

use Channel::*;

/// One of the 15 Oculus visemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VisemeShape {
    /// Silence
    #[default]
    #[serde(rename = "sil")]
    Sil,
    /// p, b, m
    PP,
    /// f, v
    FF,
    /// th
    TH,
    /// t, d
    DD,
    /// k, g
    #[serde(rename = "kk")]
    Kk,
    /// ch, j, sh
    CH,
    /// s, z
    SS,
    /// n, l
    #[serde(rename = "nn")]
    Nn,
    /// r
    RR,
    /// "father"
    #[serde(rename = "aa")]
    Aa,
    /// "bed"
    E,
    /// "sit"
    I,
    /// "go"
    O,
    /// "boot"
    U,
}

impl VisemeShape {
    pub const ALL: [VisemeShape; 15] = [
        VisemeShape::Sil,
        VisemeShape::PP,
        VisemeShape::FF,
        VisemeShape::TH,
        VisemeShape::DD,
        VisemeShape::Kk,
        VisemeShape::CH,
        VisemeShape::SS,
        VisemeShape::Nn,
        VisemeShape::RR,
        VisemeShape::Aa,
        VisemeShape::E,
        VisemeShape::I,
        VisemeShape::O,
        VisemeShape::U,
    ];

    /// Oculus numeric id (0-14)
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<VisemeShape> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            VisemeShape::Sil => "sil",
            VisemeShape::PP => "PP",
            VisemeShape::FF => "FF",
            VisemeShape::TH => "TH",
            VisemeShape::DD => "DD",
            VisemeShape::Kk => "kk",
            VisemeShape::CH => "CH",
            VisemeShape::SS => "SS",
            VisemeShape::Nn => "nn",
            VisemeShape::RR => "RR",
            VisemeShape::Aa => "aa",
            VisemeShape::E => "E",
            VisemeShape::I => "I",
            VisemeShape::O => "O",
            VisemeShape::U => "U",
        }
    }

    pub fn from_name(name: &str) -> Option<VisemeShape> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    #[inline]
    pub fn is_silence(self) -> bool {
        self == VisemeShape::Sil
    }

    #[inline]
    pub fn is_vowel(self) -> bool {
        matches!(
            self,
            VisemeShape::Aa | VisemeShape::E | VisemeShape::I | VisemeShape::O | VisemeShape::U
        )
    }

    #[inline]
    pub fn is_bilabial(self) -> bool {
        self == VisemeShape::PP
    }

    /// Mouth pose at full intensity. Only articulator channels appear.
    pub fn pose_table(self) -> &'static [(Channel, f32)] {
        match self {
            VisemeShape::Sil => &[],
            VisemeShape::PP => &[
                (MouthClose, 0.6),
                (MouthPressLeft, 0.5),
                (MouthPressRight, 0.5),
                (MouthRollLower, 0.2),
                (MouthRollUpper, 0.2),
                (JawOpen, 0.05),
            ],
            VisemeShape::FF => &[
                (MouthRollLower, 0.5),
                (MouthUpperUpLeft, 0.2),
                (MouthUpperUpRight, 0.2),
                (JawOpen, 0.1),
            ],
            VisemeShape::TH => &[
                (TongueOut, 0.4),
                (JawOpen, 0.15),
                (MouthUpperUpLeft, 0.1),
                (MouthUpperUpRight, 0.1),
            ],
            VisemeShape::DD => &[
                (JawOpen, 0.2),
                (MouthStretchLeft, 0.15),
                (MouthStretchRight, 0.15),
                (MouthUpperUpLeft, 0.1),
                (MouthUpperUpRight, 0.1),
            ],
            VisemeShape::Kk => &[
                (JawOpen, 0.25),
                (MouthStretchLeft, 0.2),
                (MouthStretchRight, 0.2),
            ],
            VisemeShape::CH => &[
                (MouthFunnel, 0.5),
                (MouthPucker, 0.2),
                (JawOpen, 0.15),
                (MouthUpperUpLeft, 0.15),
                (MouthUpperUpRight, 0.15),
            ],
            VisemeShape::SS => &[
                (JawOpen, 0.1),
                (MouthStretchLeft, 0.35),
                (MouthStretchRight, 0.35),
                (MouthUpperUpLeft, 0.1),
                (MouthUpperUpRight, 0.1),
                (MouthLowerDownLeft, 0.1),
                (MouthLowerDownRight, 0.1),
            ],
            VisemeShape::Nn => &[
                (JawOpen, 0.15),
                (MouthStretchLeft, 0.1),
                (MouthStretchRight, 0.1),
                (MouthUpperUpLeft, 0.05),
                (MouthUpperUpRight, 0.05),
            ],
            VisemeShape::RR => &[
                (MouthPucker, 0.3),
                (MouthFunnel, 0.3),
                (JawOpen, 0.15),
            ],
            VisemeShape::Aa => &[
                (JawOpen, 0.6),
                (MouthLowerDownLeft, 0.3),
                (MouthLowerDownRight, 0.3),
                (MouthUpperUpLeft, 0.1),
                (MouthUpperUpRight, 0.1),
            ],
            VisemeShape::E => &[
                (JawOpen, 0.35),
                (MouthStretchLeft, 0.35),
                (MouthStretchRight, 0.35),
                (MouthLowerDownLeft, 0.2),
                (MouthLowerDownRight, 0.2),
            ],
            VisemeShape::I => &[
                (JawOpen, 0.2),
                (MouthStretchLeft, 0.5),
                (MouthStretchRight, 0.5),
                (MouthUpperUpLeft, 0.1),
                (MouthUpperUpRight, 0.1),
            ],
            VisemeShape::O => &[
                (JawOpen, 0.4),
                (MouthFunnel, 0.6),
                (MouthPucker, 0.2),
            ],
            VisemeShape::U => &[
                (JawOpen, 0.15),
                (MouthPucker, 0.7),
                (MouthFunnel, 0.4),
            ],
        }
    }

    /// Mouth pose scaled by `intensity`
    pub fn pose(self, intensity: f32) -> BlendshapeWeights {
        let mut w = BlendshapeWeights::ZERO;
        for &(channel, value) in self.pose_table() {
            w.set(channel, value * intensity);
        }
        w
    }
}

impl std::fmt::Display for VisemeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// ARPAbet phoneme (stress digits allowed) to viseme
fn arpabet(symbol: &str) -> Option<VisemeShape> {
    let shape = match symbol {
        "SIL" | "SP" | "PAU" => VisemeShape::Sil,
        "P" | "B" | "M" => VisemeShape::PP,
        "F" | "V" => VisemeShape::FF,
        "TH" | "DH" => VisemeShape::TH,
        "T" | "D" => VisemeShape::DD,
        "K" | "G" | "NG" => VisemeShape::Kk,
        "CH" | "JH" | "SH" | "ZH" => VisemeShape::CH,
        "S" | "Z" => VisemeShape::SS,
        "N" | "L" => VisemeShape::Nn,
        "R" | "ER" => VisemeShape::RR,
        "AA" | "AE" | "AH" | "AW" | "AY" | "HH" => VisemeShape::Aa,
        "EH" | "EY" => VisemeShape::E,
        "IH" | "IY" | "Y" => VisemeShape::I,
        "AO" | "OW" | "OY" => VisemeShape::O,
        "UH" | "UW" | "W" => VisemeShape::U,
        _ => return None,
    };
    Some(shape)
}

/// Single spelled letter to viseme
pub fn letter_to_viseme(letter: char) -> Option<VisemeShape> {
    let shape = match letter.to_ascii_lowercase() {
        'p' | 'b' | 'm' => VisemeShape::PP,
        'f' | 'v' => VisemeShape::FF,
        't' | 'd' => VisemeShape::DD,
        'k' | 'g' | 'c' | 'q' | 'x' => VisemeShape::Kk,
        'j' => VisemeShape::CH,
        's' | 'z' => VisemeShape::SS,
        'n' | 'l' => VisemeShape::Nn,
        'r' => VisemeShape::RR,
        'a' | 'h' => VisemeShape::Aa,
        'e' => VisemeShape::E,
        'i' | 'y' => VisemeShape::I,
        'o' => VisemeShape::O,
        'u' | 'w' => VisemeShape::U,
        _ => return None,
    };
    Some(shape)
}

/// Spelled digraph (th, ch, sh) to viseme
pub fn digraph_to_viseme(first: char, second: char) -> Option<VisemeShape> {
    match (first.to_ascii_lowercase(), second.to_ascii_lowercase()) {
        ('t', 'h') => Some(VisemeShape::TH),
        ('c', 'h') | ('s', 'h') => Some(VisemeShape::CH),
        _ => None,
    }
}

/// Phoneme symbol to viseme
///
/// Accepts ARPAbet symbols (`AA1`, `hh`), single letters and the th/ch/sh
/// digraphs. Blank symbols are silence. Unknown symbols give `None`.
pub fn phoneme_to_viseme(symbol: &str) -> Option<VisemeShape> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Some(VisemeShape::Sil);
    }

    let upper = trimmed
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_ascii_uppercase();
    if let Some(shape) = arpabet(&upper) {
        return Some(shape);
    }

    let mut chars = trimmed.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(c), None, None) => letter_to_viseme(c),
        (Some(a), Some(b), None) => digraph_to_viseme(a, b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for (i, shape) in VisemeShape::ALL.iter().enumerate() {
            assert_eq!(shape.id() as usize, i);
            assert_eq!(VisemeShape::from_id(i as u8), Some(*shape));
            assert_eq!(VisemeShape::from_name(shape.name()), Some(*shape));
        }
        assert_eq!(VisemeShape::from_id(15), None);
        assert_eq!(VisemeShape::Aa.id(), 10);
        assert_eq!(VisemeShape::U.id(), 14);
    }

    #[test]
    fn test_phoneme_lookup() {
        assert_eq!(phoneme_to_viseme("AA1"), Some(VisemeShape::Aa));
        assert_eq!(phoneme_to_viseme("hh"), Some(VisemeShape::Aa));
        assert_eq!(phoneme_to_viseme("DH"), Some(VisemeShape::TH));
        assert_eq!(phoneme_to_viseme("UW0"), Some(VisemeShape::U));
        assert_eq!(phoneme_to_viseme("b"), Some(VisemeShape::PP));
        assert_eq!(phoneme_to_viseme("sh"), Some(VisemeShape::CH));
        assert_eq!(phoneme_to_viseme("Th"), Some(VisemeShape::TH));
        assert_eq!(phoneme_to_viseme(" "), Some(VisemeShape::Sil));
        assert_eq!(phoneme_to_viseme("?"), None);
        assert_eq!(phoneme_to_viseme("xyz"), None);
    }

    #[test]
    fn test_letters_cover_alphabet() {
        for c in 'a'..='z' {
            assert!(letter_to_viseme(c).is_some(), "{c}");
        }
        assert_eq!(letter_to_viseme('W'), Some(VisemeShape::U));
        assert_eq!(letter_to_viseme('1'), None);
    }

    #[test]
    fn test_poses_use_articulators_only() {
        for shape in VisemeShape::ALL {
            for (channel, value) in shape.pose_table() {
                assert!(channel.is_articulator(), "{shape} uses {channel}");
                assert!((0.0..=1.0).contains(value));
            }
        }
        assert!(VisemeShape::Sil.pose(1.0).is_zero());
    }

    #[test]
    fn test_pose_scales_with_intensity() {
        let full = VisemeShape::Aa.pose(1.0);
        let half = VisemeShape::Aa.pose(0.5);
        assert!((half.get(Channel::JawOpen) - full.get(Channel::JawOpen) * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_classes() {
        assert!(VisemeShape::O.is_vowel());
        assert!(!VisemeShape::PP.is_vowel());
        assert!(VisemeShape::PP.is_bilabial());
        assert!(VisemeShape::Sil.is_silence());
    }
}
