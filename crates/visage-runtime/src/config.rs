//! Avatar configuration
//!
//! Parsed once at construction. Out-of-range values are clamped by
//! `sanitized()`; `validate()` reports them instead for callers that want to
//! reject bad files.

use serde::{Deserialize, Serialize};
use tracing::warn;
use visage_core::{EaseCurve, VisageError, VisageResult};
use visage_face::{profile_from_ms, BlinkTiming, EyeConfig, IdleConfig, MapperConfig};
use visage_lipsync::{CoarticulationConfig, LipSyncConfig, SyntheticConfig};

/// Renderer-facing naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// ARKit-52 channel names
    #[default]
    Arkit,
    /// VRM expression names
    Vrm,
}

/// Avatar configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Expression transition at resting arousal
    pub transition_ms: u32,
    pub ease: EaseCurve,
    /// Automatic blink interval bounds, seconds
    pub blink_interval: [f32; 2],
    pub blink_closing_ms: u32,
    pub blink_closed_ms: u32,
    pub blink_opening_ms: u32,
    /// [0.0 - 1.0]
    pub idle_intensity: f32,
    pub lipsync_transition_ms: u32,
    pub lipsync_anticipation_ms: u32,
    /// Time for lip sync to take over or release the mouth
    pub lipsync_engagement_ms: u32,
    pub seed: u64,
    pub format: OutputFormat,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            transition_ms: 120,
            ease: EaseCurve::EaseInOut,
            blink_interval: [2.0, 5.0],
            blink_closing_ms: 60,
            blink_closed_ms: 30,
            blink_opening_ms: 90,
            idle_intensity: 0.5,
            lipsync_transition_ms: 60,
            lipsync_anticipation_ms: 30,
            lipsync_engagement_ms: 100,
            seed: 0,
            format: OutputFormat::Arkit,
        }
    }
}

const MAX_TRANSITION_MS: u32 = 10_000;
const MAX_ANTICIPATION_MS: u32 = 500;
const MIN_BLINK_INTERVAL: f32 = 0.2;
const MAX_BLINK_INTERVAL: f32 = 60.0;

fn ms(value: u32) -> f32 {
    value as f32 / 1000.0
}

/// Stream ids for per-controller random seeds
const EYE_STREAM: u64 = 1;
const IDLE_STREAM: u64 = 2;

impl AvatarConfig {
    /// Parse JSON and clamp anything out of range
    pub fn from_json_str(json: &str) -> VisageResult<AvatarConfig> {
        let config: AvatarConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Parse JSON and reject anything out of range
    pub fn from_json_str_strict(json: &str) -> VisageResult<AvatarConfig> {
        let config: AvatarConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> VisageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> VisageResult<()> {
        let [min, max] = self.blink_interval;
        if !min.is_finite() || !max.is_finite() || min < MIN_BLINK_INTERVAL || max < min {
            return Err(VisageError::InvalidConfig(format!(
                "blink_interval [{min}, {max}] must be ordered and at least {MIN_BLINK_INTERVAL}s"
            )));
        }
        if max > MAX_BLINK_INTERVAL {
            return Err(VisageError::InvalidConfig(format!(
                "blink_interval max {max}s exceeds {MAX_BLINK_INTERVAL}s"
            )));
        }
        if !(0.0..=1.0).contains(&self.idle_intensity) {
            return Err(VisageError::InvalidConfig(format!(
                "idle_intensity {} outside [0, 1]",
                self.idle_intensity
            )));
        }
        for (name, value) in [
            ("blink_closing_ms", self.blink_closing_ms),
            ("blink_closed_ms", self.blink_closed_ms),
            ("blink_opening_ms", self.blink_opening_ms),
        ] {
            if value == 0 {
                return Err(VisageError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        for (name, value) in [
            ("transition_ms", self.transition_ms),
            ("lipsync_transition_ms", self.lipsync_transition_ms),
            ("lipsync_engagement_ms", self.lipsync_engagement_ms),
        ] {
            if value > MAX_TRANSITION_MS {
                return Err(VisageError::InvalidConfig(format!(
                    "{name} {value} exceeds {MAX_TRANSITION_MS}"
                )));
            }
        }
        if self.lipsync_anticipation_ms > MAX_ANTICIPATION_MS {
            return Err(VisageError::InvalidConfig(format!(
                "lipsync_anticipation_ms {} exceeds {MAX_ANTICIPATION_MS}",
                self.lipsync_anticipation_ms
            )));
        }
        Ok(())
    }

    /// Copy with every value clamped into range
    pub fn sanitized(&self) -> AvatarConfig {
        let fix = |v: f32| {
            if v.is_finite() {
                v.clamp(MIN_BLINK_INTERVAL, MAX_BLINK_INTERVAL)
            } else {
                MIN_BLINK_INTERVAL
            }
        };
        let [a, b] = self.blink_interval.map(fix);

        let out = AvatarConfig {
            transition_ms: self.transition_ms.min(MAX_TRANSITION_MS),
            ease: self.ease,
            blink_interval: if a <= b { [a, b] } else { [b, a] },
            blink_closing_ms: self.blink_closing_ms.max(1),
            blink_closed_ms: self.blink_closed_ms.max(1),
            blink_opening_ms: self.blink_opening_ms.max(1),
            idle_intensity: if self.idle_intensity.is_nan() {
                0.0
            } else {
                self.idle_intensity.clamp(0.0, 1.0)
            },
            lipsync_transition_ms: self.lipsync_transition_ms.min(MAX_TRANSITION_MS),
            lipsync_anticipation_ms: self.lipsync_anticipation_ms.min(MAX_ANTICIPATION_MS),
            lipsync_engagement_ms: self.lipsync_engagement_ms.min(MAX_TRANSITION_MS),
            seed: self.seed,
            format: self.format,
        };

        if out != *self {
            warn!(config = ?self, "Avatar configuration out of range; clamped");
        }
        out
    }

    pub fn mapper_config(&self) -> MapperConfig {
        MapperConfig {
            transition: profile_from_ms(self.transition_ms, self.ease),
            ..MapperConfig::default()
        }
    }

    pub fn eye_config(&self) -> EyeConfig {
        EyeConfig {
            blink: BlinkTiming {
                closing: ms(self.blink_closing_ms),
                closed: ms(self.blink_closed_ms),
                opening: ms(self.blink_opening_ms),
            },
            blink_interval: (self.blink_interval[0], self.blink_interval[1]),
            ..EyeConfig::default()
        }
    }

    pub fn idle_config(&self) -> IdleConfig {
        IdleConfig::default()
    }

    pub fn lipsync_config(&self) -> LipSyncConfig {
        LipSyncConfig {
            transition: ms(self.lipsync_transition_ms),
            engagement_ramp: ms(self.lipsync_engagement_ms),
            coarticulation: CoarticulationConfig {
                anticipation_ms: self.lipsync_anticipation_ms as f32,
                ..CoarticulationConfig::default()
            },
            synthetic: SyntheticConfig::default(),
            ..LipSyncConfig::default()
        }
    }

    pub fn eye_seed(&self) -> u64 {
        derive_seed(self.seed, EYE_STREAM)
    }

    pub fn idle_seed(&self) -> u64 {
        derive_seed(self.seed, IDLE_STREAM)
    }
}

/// Independent seed per random stream
fn derive_seed(seed: u64, stream: u64) -> u64 {
    seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AvatarConfig::default();
        assert_eq!(config.transition_ms, 120);
        assert_eq!(config.blink_interval, [2.0, 5.0]);
        assert_eq!(config.ease, EaseCurve::EaseInOut);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            AvatarConfig::from_json_str(r#"{"transition_ms": 200, "format": "vrm", "ease": "spring"}"#)
                .unwrap();
        assert_eq!(config.transition_ms, 200);
        assert_eq!(config.format, OutputFormat::Vrm);
        assert_eq!(config.ease, EaseCurve::Spring);
        assert_eq!(config.idle_intensity, 0.5);
    }

    #[test]
    fn test_sanitize_clamps() {
        let config = AvatarConfig::from_json_str(
            r#"{"blink_interval": [9.0, 0.05], "idle_intensity": 3.0, "blink_closed_ms": 0}"#,
        )
        .unwrap();
        assert_eq!(config.blink_interval, [MIN_BLINK_INTERVAL, 9.0]);
        assert_eq!(config.idle_intensity, 1.0);
        assert_eq!(config.blink_closed_ms, 1);
    }

    #[test]
    fn test_strict_rejects() {
        let err = AvatarConfig::from_json_str_strict(r#"{"idle_intensity": 2.0}"#).unwrap_err();
        assert!(matches!(err, VisageError::InvalidConfig(_)));

        let err = AvatarConfig::from_json_str_strict(r#"{"blink_interval": [5.0, 2.0]}"#).unwrap_err();
        assert!(matches!(err, VisageError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = AvatarConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, VisageError::Json(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = AvatarConfig {
            seed: 77,
            format: OutputFormat::Vrm,
            ..AvatarConfig::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(AvatarConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_derived_configs() {
        let config = AvatarConfig::default();
        let eye = config.eye_config();
        assert!((eye.blink.total() - 0.18).abs() < 1e-6);
        assert!((config.mapper_config().transition.duration - 0.12).abs() < 1e-6);
        assert_eq!(config.lipsync_config().coarticulation.anticipation_ms, 30.0);
        assert_ne!(config.eye_seed(), config.idle_seed());
    }
}
