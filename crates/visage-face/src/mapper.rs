//! State Mapper - cognitive state to target expression and gaze
//!
//! Everything here is a pure function of its inputs. Randomness lives in the
//! eye and idle animators, never in the mapping.

use visage_core::{BlendshapeWeights, Channel, CognitiveMode, CognitiveState, EaseCurve, GazeTarget};

use crate::{ExpressionPreset, TransitionProfile};

/// Where the eyes should go for a given state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeBias {
    /// Look at a fixed point
    Look(GazeTarget),
    /// Let the eye controller drift on its own
    Wander,
}

/// Mapper tuning
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Blend fraction toward Happy/Sad at |valence| = 1
    pub valence_gain: f32,
    /// Arousal at which no eye/brow adjustment is made
    pub resting_arousal: f32,
    pub arousal_eye_gain: f32,
    pub arousal_brow_gain: f32,
    /// Transition used at resting arousal
    pub transition: TransitionProfile,
    /// Fraction the transition shortens by at full arousal
    pub arousal_speedup: f32,
    pub thinking_gaze: GazeTarget,
    pub processing_gaze: GazeTarget,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            valence_gain: 0.6,
            resting_arousal: 0.3,
            arousal_eye_gain: 0.5,
            arousal_brow_gain: 0.3,
            transition: TransitionProfile::NORMAL,
            arousal_speedup: 0.5,
            thinking_gaze: GazeTarget { x: 0.25, y: 0.3 },
            processing_gaze: GazeTarget { x: -0.2, y: -0.25 },
        }
    }
}

/// Base preset for a mode
pub fn base_preset(mode: CognitiveMode) -> ExpressionPreset {
    match mode {
        CognitiveMode::Idle => ExpressionPreset::Neutral,
        CognitiveMode::Listening => ExpressionPreset::Attentive,
        CognitiveMode::Thinking => ExpressionPreset::Thinking,
        CognitiveMode::Speaking => ExpressionPreset::Confident,
        CognitiveMode::Attentive => ExpressionPreset::Alert,
        CognitiveMode::Processing => ExpressionPreset::Focused,
        CognitiveMode::Error => ExpressionPreset::Concerned,
    }
}

/// Stateless mapper carrying its tuning
#[derive(Debug, Clone, Default)]
pub struct StateMapper {
    pub config: MapperConfig,
}

impl StateMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Target expression for `state`
    pub fn expression(&self, state: &CognitiveState) -> BlendshapeWeights {
        let state = state.sanitized();
        let cfg = &self.config;

        // 1. Mode
        let base = base_preset(state.mode).resolve();

        // 2. Valence, continuous through 0
        let pole = if state.valence >= 0.0 {
            ExpressionPreset::Happy
        } else {
            ExpressionPreset::Sad
        };
        let t = state.valence.abs() * cfg.valence_gain;
        let mut out = BlendshapeWeights::lerp(&base, &pole.resolve(), t);

        // 3. Arousal relative to rest
        let delta = state.arousal - cfg.resting_arousal;
        if delta != 0.0 {
            for channel in [Channel::EyeWideLeft, Channel::EyeWideRight] {
                out.add_to(channel, delta * cfg.arousal_eye_gain);
            }
            for channel in [Channel::BrowOuterUpLeft, Channel::BrowOuterUpRight] {
                out.add_to(channel, delta * cfg.arousal_brow_gain);
            }
        }

        // 4. Confidence; the idle baseline keeps full magnitude
        if state.mode != CognitiveMode::Idle {
            out = BlendshapeWeights::scale(&out, state.confidence);
        }

        // 5. Every write above already clamps
        out
    }

    pub fn gaze(&self, state: &CognitiveState) -> GazeBias {
        if let Some(target) = state.gaze_target {
            return GazeBias::Look(target.clamped());
        }
        match state.mode {
            CognitiveMode::Idle => GazeBias::Wander,
            CognitiveMode::Thinking => GazeBias::Look(self.config.thinking_gaze.clamped()),
            CognitiveMode::Processing => GazeBias::Look(self.config.processing_gaze.clamped()),
            CognitiveMode::Listening
            | CognitiveMode::Speaking
            | CognitiveMode::Attentive
            | CognitiveMode::Error => GazeBias::Look(GazeTarget::CENTER),
        }
    }

    /// Transition profile; high arousal reacts faster
    pub fn transition(&self, state: &CognitiveState) -> TransitionProfile {
        let state = state.sanitized();
        let cfg = &self.config;
        let rest = cfg.resting_arousal.clamp(0.0, 0.99);
        let excess = ((state.arousal - rest) / (1.0 - rest)).clamp(0.0, 1.0);
        let speedup = cfg.arousal_speedup.clamp(0.0, 1.0);

        TransitionProfile {
            duration: cfg.transition.duration * (1.0 - speedup * excess),
            curve: cfg.transition.curve,
        }
    }
}

/// Target expression with default tuning
pub fn map_to_expression(state: &CognitiveState) -> BlendshapeWeights {
    StateMapper::default().expression(state)
}

/// Gaze bias with default tuning
pub fn map_gaze(state: &CognitiveState) -> GazeBias {
    StateMapper::default().gaze(state)
}

pub fn map_transition(state: &CognitiveState, config: &MapperConfig) -> TransitionProfile {
    StateMapper::new(config.clone()).transition(state)
}

/// Transition profile from a millisecond duration and curve
pub fn profile_from_ms(duration_ms: u32, curve: EaseCurve) -> TransitionProfile {
    TransitionProfile::new(duration_ms as f32 / 1000.0, curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mapping_is_pure() {
        let state = CognitiveState::new(CognitiveMode::Speaking)
            .with_valence(0.4)
            .with_arousal(0.8)
            .with_confidence(0.6);
        let a = map_to_expression(&state);
        let b = map_to_expression(&state);
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_thinking_looks_thoughtful() {
        let w = map_to_expression(&CognitiveState::new(CognitiveMode::Thinking));
        let lifted = [Channel::BrowInnerUp, Channel::EyeLookUpLeft, Channel::EyeLookUpRight]
            .iter()
            .any(|c| w.get(*c) > 0.0);
        assert!(lifted);
    }

    #[test]
    fn test_listening_is_scaled_attentive() {
        let state = CognitiveState::new(CognitiveMode::Listening)
            .with_valence(0.0)
            .with_arousal(0.3)
            .with_confidence(0.8);
        let expected = BlendshapeWeights::scale(&ExpressionPreset::Attentive.resolve(), 0.8);
        assert!(map_to_expression(&state).max_difference(&expected) < 1e-6);
    }

    #[test]
    fn test_valence_is_continuous_through_zero() {
        let base = CognitiveState::new(CognitiveMode::Speaking);
        let up = map_to_expression(&base.clone().with_valence(1e-4));
        let down = map_to_expression(&base.with_valence(-1e-4));
        assert!(up.max_difference(&down) < 1e-3);
    }

    #[test]
    fn test_valence_pulls_toward_poles() {
        let base = CognitiveState::new(CognitiveMode::Listening);
        let happy = map_to_expression(&base.clone().with_valence(1.0));
        let sad = map_to_expression(&base.with_valence(-1.0));
        assert!(happy.get(Channel::MouthSmileLeft) > sad.get(Channel::MouthSmileLeft));
        assert!(sad.get(Channel::MouthFrownLeft) > happy.get(Channel::MouthFrownLeft));
    }

    #[test]
    fn test_arousal_is_monotonic() {
        let mut last = -1.0;
        for step in 0..=10 {
            let state = CognitiveState::new(CognitiveMode::Attentive).with_arousal(step as f32 / 10.0);
            let wide = map_to_expression(&state).get(Channel::EyeWideLeft);
            assert!(wide >= last);
            last = wide;
        }
    }

    #[test]
    fn test_idle_ignores_confidence() {
        let sure = CognitiveState::new(CognitiveMode::Idle).with_valence(0.5);
        let unsure = sure.clone().with_confidence(0.1);
        assert_eq!(map_to_expression(&sure), map_to_expression(&unsure));

        let speaking = CognitiveState::new(CognitiveMode::Speaking);
        let quiet = speaking.clone().with_confidence(0.1);
        assert_ne!(map_to_expression(&speaking), map_to_expression(&quiet));
    }

    #[test]
    fn test_gaze_bias_by_mode() {
        let look = |mode| map_gaze(&CognitiveState::new(mode));
        assert_eq!(look(CognitiveMode::Idle), GazeBias::Wander);
        assert_eq!(look(CognitiveMode::Speaking), GazeBias::Look(GazeTarget::CENTER));

        match look(CognitiveMode::Thinking) {
            GazeBias::Look(t) => assert!(t.y > 0.0 && t.x != 0.0),
            other => panic!("unexpected {other:?}"),
        }
        match look(CognitiveMode::Processing) {
            GazeBias::Look(t) => assert!(t.y < 0.0 && t.x != 0.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_explicit_gaze_target_wins() {
        let state = CognitiveState::new(CognitiveMode::Thinking).with_gaze_target(-0.4, 0.1);
        assert_eq!(map_gaze(&state), GazeBias::Look(GazeTarget { x: -0.4, y: 0.1 }));
    }

    #[test]
    fn test_high_arousal_shortens_transition() {
        let config = MapperConfig::default();
        let calm = map_transition(&CognitiveState::new(CognitiveMode::Speaking), &config);
        let excited = map_transition(
            &CognitiveState::new(CognitiveMode::Speaking).with_arousal(1.0),
            &config,
        );
        assert_eq!(calm.duration, config.transition.duration);
        assert!(excited.duration < calm.duration);
        assert!(excited.duration > 0.0);
    }

    proptest! {
        #[test]
        fn test_output_always_in_range(
            mode in 0usize..7,
            valence in -3.0f32..3.0,
            arousal in -1.0f32..2.0,
            confidence in -1.0f32..2.0,
        ) {
            let state = CognitiveState::new(CognitiveMode::ALL[mode])
                .with_valence(valence)
                .with_arousal(arousal)
                .with_confidence(confidence);
            let w = map_to_expression(&state);
            for (_, value) in w.iter() {
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
