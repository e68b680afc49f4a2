//! Cognitive state - the externally computed snapshot that drives expression
//!
//! This is NOT produced here. A bridge delivers it and the avatar consumes
//! the latest value at tick boundaries.

use serde::{Deserialize, Serialize};

/// What the agent behind the face is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveMode {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
    Attentive,
    Processing,
    Error,
}

impl CognitiveMode {
    pub const ALL: [CognitiveMode; 7] = [
        CognitiveMode::Idle,
        CognitiveMode::Listening,
        CognitiveMode::Thinking,
        CognitiveMode::Speaking,
        CognitiveMode::Attentive,
        CognitiveMode::Processing,
        CognitiveMode::Error,
    ];

    pub fn from_name(name: &str) -> Option<CognitiveMode> {
        match name.to_lowercase().as_str() {
            "idle" => Some(CognitiveMode::Idle),
            "listening" => Some(CognitiveMode::Listening),
            "thinking" => Some(CognitiveMode::Thinking),
            "speaking" => Some(CognitiveMode::Speaking),
            "attentive" => Some(CognitiveMode::Attentive),
            "processing" => Some(CognitiveMode::Processing),
            "error" => Some(CognitiveMode::Error),
            _ => None,
        }
    }
}

/// Normalized gaze point, both axes in [-1, 1] (+x right, +y up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeTarget {
    pub x: f32,
    pub y: f32,
}

impl GazeTarget {
    pub const CENTER: GazeTarget = GazeTarget { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }.clamped()
    }

    /// Both axes clamped into [-1, 1], NaN to 0
    pub fn clamped(self) -> Self {
        let fix = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) };
        Self {
            x: fix(self.x),
            y: fix(self.y),
        }
    }
}

/// Affect and mode snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CognitiveState {
    pub mode: CognitiveMode,
    /// Emotional positivity [-1.0 - 1.0]
    pub valence: f32,
    /// Activation [0.0 - 1.0]
    pub arousal: f32,
    /// [0.0 - 1.0]
    pub attention_level: f32,
    /// [0.0 - 1.0]
    pub confidence: f32,
    pub gaze_target: Option<GazeTarget>,
    pub is_speaking: bool,
}

impl Default for CognitiveState {
    fn default() -> Self {
        Self {
            mode: CognitiveMode::Idle,
            valence: 0.0,
            arousal: 0.3,
            attention_level: 0.5,
            confidence: 1.0,
            gaze_target: None,
            is_speaking: false,
        }
    }
}

impl CognitiveState {
    pub fn new(mode: CognitiveMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_valence(mut self, valence: f32) -> Self {
        self.valence = valence;
        self
    }

    pub fn with_arousal(mut self, arousal: f32) -> Self {
        self.arousal = arousal;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_gaze_target(mut self, x: f32, y: f32) -> Self {
        self.gaze_target = Some(GazeTarget::new(x, y));
        self
    }

    pub fn speaking(mut self, is_speaking: bool) -> Self {
        self.is_speaking = is_speaking;
        self
    }

    /// Copy with every scalar clamped into its documented range
    pub fn sanitized(&self) -> CognitiveState {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        CognitiveState {
            mode: self.mode,
            valence: if self.valence.is_nan() {
                0.0
            } else {
                self.valence.clamp(-1.0, 1.0)
            },
            arousal: unit(self.arousal),
            attention_level: unit(self.attention_level),
            confidence: unit(self.confidence),
            gaze_target: self.gaze_target.map(GazeTarget::clamped),
            is_speaking: self.is_speaking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps() {
        let state = CognitiveState {
            mode: CognitiveMode::Thinking,
            valence: -3.0,
            arousal: 2.0,
            attention_level: f32::NAN,
            confidence: -1.0,
            gaze_target: Some(GazeTarget { x: 4.0, y: -4.0 }),
            is_speaking: false,
        }
        .sanitized();

        assert_eq!(state.valence, -1.0);
        assert_eq!(state.arousal, 1.0);
        assert_eq!(state.attention_level, 0.0);
        assert_eq!(state.confidence, 0.0);
        assert_eq!(state.gaze_target, Some(GazeTarget { x: 1.0, y: -1.0 }));
    }

    #[test]
    fn test_json_from_bridge() {
        let state: CognitiveState = serde_json::from_str(
            r#"{"mode":"listening","valence":0.2,"arousal":0.3,"confidence":0.8,"isSpeaking":false}"#,
        )
        .unwrap();
        assert_eq!(state.mode, CognitiveMode::Listening);
        assert_eq!(state.confidence, 0.8);
        assert_eq!(state.attention_level, 0.5);
        assert!(state.gaze_target.is_none());
    }

    #[test]
    fn test_mode_from_name() {
        for mode in CognitiveMode::ALL {
            let name = format!("{mode:?}");
            assert_eq!(CognitiveMode::from_name(&name), Some(mode));
        }
        assert_eq!(CognitiveMode::from_name("dreaming"), None);
    }
}
