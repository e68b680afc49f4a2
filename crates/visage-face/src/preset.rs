//! Expression presets
//!
//! A closed set of named partial weight tables. Lookup is exhaustive, so
//! adding a preset without a table is a compile error.

use serde::{Deserialize, Serialize};
use visage_core::{BlendshapeWeights, Channel, VisageError, VisageResult};

use Channel::*;

/// Named facial expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionPreset {
    Neutral,
    Happy,
    Sad,
    Thinking,
    Concerned,
    Confident,
    Surprised,
    Attentive,
    /// Strong attention: wider eyes, lifted brows
    Alert,
    /// Inward concentration while processing
    Focused,
    Confused,
    Excited,
}

const NEUTRAL: &[(Channel, f32)] = &[];

const HAPPY: &[(Channel, f32)] = &[
    (MouthSmileLeft, 0.7),
    (MouthSmileRight, 0.7),
    (CheekSquintLeft, 0.4),
    (CheekSquintRight, 0.4),
    (EyeSquintLeft, 0.2),
    (EyeSquintRight, 0.2),
    (MouthDimpleLeft, 0.2),
    (MouthDimpleRight, 0.2),
    (BrowOuterUpLeft, 0.1),
    (BrowOuterUpRight, 0.1),
];

const SAD: &[(Channel, f32)] = &[
    (MouthFrownLeft, 0.6),
    (MouthFrownRight, 0.6),
    (BrowInnerUp, 0.6),
    (BrowDownLeft, 0.2),
    (BrowDownRight, 0.2),
    (MouthShrugLower, 0.3),
    (EyeSquintLeft, 0.1),
    (EyeSquintRight, 0.1),
];

const THINKING: &[(Channel, f32)] = &[
    (BrowInnerUp, 0.35),
    (BrowDownLeft, 0.25),
    (EyeLookUpLeft, 0.3),
    (EyeLookUpRight, 0.3),
    (MouthPressLeft, 0.25),
    (MouthPressRight, 0.25),
    (MouthLeft, 0.15),
    (EyeSquintLeft, 0.1),
    (EyeSquintRight, 0.1),
];

const CONCERNED: &[(Channel, f32)] = &[
    (BrowInnerUp, 0.55),
    (BrowDownLeft, 0.35),
    (BrowDownRight, 0.35),
    (MouthFrownLeft, 0.3),
    (MouthFrownRight, 0.3),
    (MouthPressLeft, 0.2),
    (MouthPressRight, 0.2),
    (EyeSquintLeft, 0.15),
    (EyeSquintRight, 0.15),
];

const CONFIDENT: &[(Channel, f32)] = &[
    (MouthSmileLeft, 0.35),
    (MouthSmileRight, 0.35),
    (CheekSquintLeft, 0.15),
    (CheekSquintRight, 0.15),
    (BrowOuterUpLeft, 0.15),
    (BrowOuterUpRight, 0.15),
    (EyeWideLeft, 0.1),
    (EyeWideRight, 0.1),
];

const SURPRISED: &[(Channel, f32)] = &[
    (EyeWideLeft, 0.8),
    (EyeWideRight, 0.8),
    (BrowInnerUp, 0.7),
    (BrowOuterUpLeft, 0.7),
    (BrowOuterUpRight, 0.7),
    (JawOpen, 0.4),
    (MouthFunnel, 0.2),
];

const ATTENTIVE: &[(Channel, f32)] = &[
    (EyeWideLeft, 0.2),
    (EyeWideRight, 0.2),
    (BrowOuterUpLeft, 0.2),
    (BrowOuterUpRight, 0.2),
    (BrowInnerUp, 0.15),
    (MouthSmileLeft, 0.1),
    (MouthSmileRight, 0.1),
];

const ALERT: &[(Channel, f32)] = &[
    (EyeWideLeft, 0.4),
    (EyeWideRight, 0.4),
    (BrowOuterUpLeft, 0.35),
    (BrowOuterUpRight, 0.35),
    (BrowInnerUp, 0.3),
    (MouthSmileLeft, 0.1),
    (MouthSmileRight, 0.1),
];

const FOCUSED: &[(Channel, f32)] = &[
    (BrowDownLeft, 0.35),
    (BrowDownRight, 0.35),
    (EyeSquintLeft, 0.3),
    (EyeSquintRight, 0.3),
    (MouthPressLeft, 0.2),
    (MouthPressRight, 0.2),
    (EyeLookDownLeft, 0.15),
    (EyeLookDownRight, 0.15),
];

const CONFUSED: &[(Channel, f32)] = &[
    (BrowInnerUp, 0.4),
    (BrowDownRight, 0.35),
    (BrowOuterUpLeft, 0.4),
    (MouthLeft, 0.2),
    (MouthPressLeft, 0.2),
    (EyeSquintRight, 0.2),
];

const EXCITED: &[(Channel, f32)] = &[
    (MouthSmileLeft, 0.85),
    (MouthSmileRight, 0.85),
    (CheekSquintLeft, 0.5),
    (CheekSquintRight, 0.5),
    (EyeWideLeft, 0.45),
    (EyeWideRight, 0.45),
    (BrowOuterUpLeft, 0.4),
    (BrowOuterUpRight, 0.4),
    (JawOpen, 0.2),
];

impl ExpressionPreset {
    pub const ALL: [ExpressionPreset; 12] = [
        ExpressionPreset::Neutral,
        ExpressionPreset::Happy,
        ExpressionPreset::Sad,
        ExpressionPreset::Thinking,
        ExpressionPreset::Concerned,
        ExpressionPreset::Confident,
        ExpressionPreset::Surprised,
        ExpressionPreset::Attentive,
        ExpressionPreset::Alert,
        ExpressionPreset::Focused,
        ExpressionPreset::Confused,
        ExpressionPreset::Excited,
    ];

    /// Partial weight table; channels not listed are 0
    pub fn table(self) -> &'static [(Channel, f32)] {
        match self {
            ExpressionPreset::Neutral => NEUTRAL,
            ExpressionPreset::Happy => HAPPY,
            ExpressionPreset::Sad => SAD,
            ExpressionPreset::Thinking => THINKING,
            ExpressionPreset::Concerned => CONCERNED,
            ExpressionPreset::Confident => CONFIDENT,
            ExpressionPreset::Surprised => SURPRISED,
            ExpressionPreset::Attentive => ATTENTIVE,
            ExpressionPreset::Alert => ALERT,
            ExpressionPreset::Focused => FOCUSED,
            ExpressionPreset::Confused => CONFUSED,
            ExpressionPreset::Excited => EXCITED,
        }
    }

    /// Full weight vector
    pub fn resolve(self) -> BlendshapeWeights {
        BlendshapeWeights::from_pairs(self.table())
    }

    pub fn name(self) -> &'static str {
        match self {
            ExpressionPreset::Neutral => "neutral",
            ExpressionPreset::Happy => "happy",
            ExpressionPreset::Sad => "sad",
            ExpressionPreset::Thinking => "thinking",
            ExpressionPreset::Concerned => "concerned",
            ExpressionPreset::Confident => "confident",
            ExpressionPreset::Surprised => "surprised",
            ExpressionPreset::Attentive => "attentive",
            ExpressionPreset::Alert => "alert",
            ExpressionPreset::Focused => "focused",
            ExpressionPreset::Confused => "confused",
            ExpressionPreset::Excited => "excited",
        }
    }

    pub fn from_name(name: &str) -> Option<ExpressionPreset> {
        let lower = name.to_lowercase();
        Self::ALL.into_iter().find(|p| p.name() == lower)
    }

    pub fn parse(name: &str) -> VisageResult<ExpressionPreset> {
        Self::from_name(name).ok_or_else(|| VisageError::UnknownPreset(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_is_rest() {
        assert!(ExpressionPreset::Neutral.resolve().is_zero());
    }

    #[test]
    fn test_tables_are_in_range_and_unique() {
        for preset in ExpressionPreset::ALL {
            let table = preset.table();
            for (i, (channel, value)) in table.iter().enumerate() {
                assert!((0.0..=1.0).contains(value), "{preset:?} {channel}");
                assert!(
                    !table[i + 1..].iter().any(|(c, _)| c == channel),
                    "{preset:?} lists {channel} twice"
                );
            }
        }
    }

    #[test]
    fn test_resolve_fills_missing_with_zero() {
        let happy = ExpressionPreset::Happy.resolve();
        assert_eq!(happy.get(Channel::MouthSmileLeft), 0.7);
        assert_eq!(happy.get(Channel::MouthFrownLeft), 0.0);
    }

    #[test]
    fn test_name_lookup() {
        for preset in ExpressionPreset::ALL {
            assert_eq!(ExpressionPreset::from_name(preset.name()), Some(preset));
        }
        assert_eq!(ExpressionPreset::from_name("Happy"), Some(ExpressionPreset::Happy));
        assert!(ExpressionPreset::parse("smug").is_err());
    }

    #[test]
    fn test_thinking_raises_brow_or_gaze() {
        let thinking = ExpressionPreset::Thinking.resolve();
        assert!(
            thinking.get(Channel::BrowInnerUp) > 0.0 || thinking.get(Channel::EyeLookUpLeft) > 0.0
        );
    }
}
