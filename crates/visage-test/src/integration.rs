//! End-to-end Integration Test Suite
//!
//! Scenarios that drive a full avatar through its mailboxes and check the
//! composited output:
//! - State mapping reaches its target within the transition
//! - Stopping speech releases the mouth within one lip sync transition
//! - Gaze and blink behavior per mode
//! - Generated and event-track utterances play through to completion
//! - An utterance ends speech on its own; state updates never interrupt it

use std::time::Duration;

use visage_core::{BlendshapeWeights, Channel, ChannelMask, CognitiveMode, CognitiveState};
use visage_face::ExpressionPreset;
use visage_lipsync::{from_text, from_word_timestamps, Viseme, VisemeEvent, VisemeEventTrack, VisemeShape};
use visage_runtime::AvatarConfig;

use crate::simulator::{AvatarSimulator, ScenarioBuilder, Script};

/// Outcome of one scenario
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub failures: Vec<String>,
}

impl ScenarioResult {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            failures: Vec::new(),
        }
    }

    fn check(&mut self, ok: bool, what: impl Into<String>) {
        if !ok {
            self.failures.push(what.into());
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The eight gaze channels, written by the eye controller every tick
pub fn look_channels() -> ChannelMask {
    ChannelMask::from_channels(&[
        Channel::EyeLookUpLeft,
        Channel::EyeLookUpRight,
        Channel::EyeLookDownLeft,
        Channel::EyeLookDownRight,
        Channel::EyeLookInLeft,
        Channel::EyeLookInRight,
        Channel::EyeLookOutLeft,
        Channel::EyeLookOutRight,
    ])
}

fn without(mask: ChannelMask, removed: ChannelMask) -> ChannelMask {
    let mut out = mask;
    for channel in removed.iter() {
        out.remove(channel);
    }
    out
}

fn quiet_sim(config: AvatarConfig) -> AvatarSimulator {
    ScenarioBuilder::new().with_config(config).quiet().recording().build()
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// Listening at resting arousal settles on Attentive scaled by confidence
pub fn scenario_listening_matches_attentive() -> ScenarioResult {
    let mut result = ScenarioResult::new("listening_matches_attentive");
    let mut sim = quiet_sim(AvatarConfig {
        transition_ms: 150,
        ..AvatarConfig::default()
    });

    sim.inputs().post_state(
        CognitiveState::new(CognitiveMode::Listening)
            .with_valence(0.0)
            .with_arousal(0.3)
            .with_confidence(0.8),
    );
    sim.run_for(Duration::from_millis(200));

    let expected = BlendshapeWeights::scale(&ExpressionPreset::Attentive.resolve(), 0.8);
    let base = sim.avatar().expression().current().max_difference(&expected);
    result.check(base < 1e-6, format!("expression base off by {base}"));

    let face = without(ChannelMask::ALL, look_channels());
    let out = sim.avatar().weights().max_difference_in(&expected, face);
    result.check(out < 1e-6, format!("composited output off by {out}"));
    result.check(
        !sim.avatar().expression().is_transitioning(),
        "transition still running after 200 ms",
    );
    result
}

/// A falling speaking edge releases every mouth channel within one lip sync
/// transition (plus the frame that delivers the edge)
pub fn scenario_stop_speaking_releases_mouth() -> ScenarioResult {
    let mut result = ScenarioResult::new("stop_speaking_releases_mouth");
    let config = AvatarConfig::default();
    let transition = Duration::from_millis(config.lipsync_transition_ms as u64);
    let mut sim = quiet_sim(config);

    let inputs = sim.inputs();
    inputs.post_speaking(true);
    inputs.post_visemes(vec![Viseme::new(VisemeShape::Aa, 1.0, 0, 5000)]);
    sim.run_for(Duration::from_millis(300));

    let jaw = sim.avatar().weights().get(Channel::JawOpen);
    result.check(jaw > 0.5, format!("jaw only reached {jaw} while speaking"));

    inputs.post_speaking(false);
    let mouth = ChannelMask::articulators();
    let released = sim.run_until(transition + sim.frame(), |w| {
        w.max_difference_in(&BlendshapeWeights::ZERO, mouth) == 0.0
    });
    result.check(released.is_some(), "mouth still open after one transition");
    result.check(
        sim.avatar().viseme() == (VisemeShape::Sil, 0.0),
        "lip sync target is not silence",
    );
    result.check(
        sim.avatar().lipsync().timeline().is_none(),
        "timeline survived the falling edge",
    );
    result
}

/// Thinking raises the inner brows and looks up and aside
pub fn scenario_thinking_looks_away() -> ScenarioResult {
    let mut result = ScenarioResult::new("thinking_looks_away");
    let mut sim = quiet_sim(AvatarConfig::default());

    sim.play(
        &Script::new().state(0, CognitiveState::new(CognitiveMode::Thinking)),
        Duration::from_millis(600),
    );

    let w = *sim.avatar().weights();
    result.check(w.get(Channel::BrowInnerUp) > 0.0, "inner brows not raised");
    result.check(
        w.get(Channel::EyeLookUpLeft) > 0.0 && w.get(Channel::EyeLookUpRight) > 0.0,
        "eyes not looking up",
    );
    let (x, _) = sim.avatar().eyes().gaze();
    result.check(x > 0.1, format!("gaze x {x} not shifted aside"));
    result
}

/// A triggered blink closes both lids fully and reopens them
pub fn scenario_blink_cycle() -> ScenarioResult {
    let mut result = ScenarioResult::new("blink_cycle");
    let mut sim = quiet_sim(AvatarConfig::default());

    sim.avatar_mut().eyes_mut().trigger_blink();
    result.check(sim.avatar().eyes().is_blinking(), "blink did not start");

    sim.run_for(Duration::from_millis(300));
    result.check(sim.peak(Channel::EyeBlinkLeft) == 1.0, "left lid never closed");
    result.check(sim.peak(Channel::EyeBlinkRight) == 1.0, "right lid never closed");
    result.check(!sim.avatar().eyes().is_blinking(), "blink still running");
    result.check(
        sim.avatar().weights().get(Channel::EyeBlinkLeft) == 0.0,
        "lids did not reopen",
    );
    result
}

/// Text-generated speech plays to the end and is counted once
pub fn scenario_text_utterance() -> ScenarioResult {
    let mut result = ScenarioResult::new("text_utterance");
    let mut sim = quiet_sim(AvatarConfig::default());

    let visemes = from_text("Hello there, how are you?", 1500);
    result.check(!visemes.is_empty(), "no visemes generated");

    sim.play(
        &Script::new().speaking(0, true).visemes(0, visemes),
        Duration::from_millis(4000),
    );

    result.check(sim.peak(Channel::JawOpen) > 0.2, "jaw never opened");
    result.check(
        sim.avatar().stats().utterances_finished == 1,
        format!("finished {} utterances", sim.avatar().stats().utterances_finished),
    );
    result
}

/// Word timestamps and raw events both reach the mouth
pub fn scenario_timed_sources() -> ScenarioResult {
    let mut result = ScenarioResult::new("timed_sources");

    let mut sim = quiet_sim(AvatarConfig::default());
    let words = ["mama", "papa"];
    sim.play(
        &Script::new().visemes(0, from_word_timestamps(&words, &[0.0, 0.6], &[0.5, 1.1])),
        Duration::from_millis(1500),
    );
    result.check(sim.peak(Channel::MouthClose) > 0.0, "bilabials never closed the lips");
    result.check(
        sim.avatar().stats().utterances_finished == 1,
        "word timeline did not finish",
    );

    let mut sim = quiet_sim(AvatarConfig::default());
    let track = VisemeEventTrack {
        events: vec![
            VisemeEvent { viseme_id: 10, time_ms: 0.0, weight: 1.0 },
            VisemeEvent { viseme_id: 200, time_ms: 100.0, weight: 1.0 },
            VisemeEvent { viseme_id: 14, time_ms: 300.0, weight: 1.0 },
        ],
        duration: 600.0,
    };
    sim.inputs().post_event_track(&track);
    sim.run_for(Duration::from_millis(800));
    result.check(sim.peak(Channel::MouthPucker) > 0.0, "U viseme never reached the mouth");
    result.check(
        sim.avatar().stats().utterances_finished == 1,
        "event track did not finish",
    );
    result
}

/// Speech that outlives its flag: the timeline ends before the late falling
/// edge, and the mouth must rest in between instead of cycling
pub fn scenario_utterance_ends_before_stop() -> ScenarioResult {
    let mut result = ScenarioResult::new("utterance_ends_before_stop");
    let mut sim = quiet_sim(AvatarConfig::default());

    sim.play(
        &Script::new()
            .speaking(0, true)
            .visemes(0, vec![Viseme::new(VisemeShape::E, 0.7, 0, 100)]),
        Duration::from_millis(480),
    );
    result.check(
        sim.avatar().viseme() == (VisemeShape::Sil, 0.0),
        format!("target {:?} after the utterance ended", sim.avatar().viseme()),
    );
    result.check(!sim.avatar().lipsync().is_active(), "lip sync still active");

    // Between the end of the utterance and the late flag, nothing moves
    let mut rest = quiet_sim(AvatarConfig::default());
    rest.inputs().post_speaking(true);
    rest.inputs().post_visemes(vec![Viseme::new(VisemeShape::E, 0.7, 0, 100)]);
    rest.run_for(Duration::from_millis(480));
    let settled = rest.trace().len();
    rest.run_for(Duration::from_millis(1000));
    let jaw = rest.trace()[settled..]
        .iter()
        .map(|w| w.get(Channel::JawOpen))
        .fold(0.0, f32::max);
    result.check(jaw < 1e-6, format!("jaw reached {jaw} after the utterance"));

    rest.inputs().post_speaking(false);
    rest.run_for(Duration::from_millis(100));
    result.check(
        rest.avatar().stats().utterances_finished == 1,
        format!("finished {} utterances", rest.avatar().stats().utterances_finished),
    );
    result.check(
        rest.avatar().viseme() == (VisemeShape::Sil, 0.0),
        "late falling edge disturbed the silence",
    );
    result
}

/// A cognitive update mid-utterance retargets the face but keeps playback
pub fn scenario_state_update_mid_utterance() -> ScenarioResult {
    let mut result = ScenarioResult::new("state_update_mid_utterance");
    let mut sim = quiet_sim(AvatarConfig::default());

    sim.play(
        &Script::new()
            .speaking(0, true)
            .visemes(0, vec![Viseme::new(VisemeShape::Aa, 1.0, 0, 3000)])
            .state(500, CognitiveState::new(CognitiveMode::Speaking).with_valence(0.3)),
        Duration::from_millis(800),
    );

    result.check(
        sim.avatar().state().mode == CognitiveMode::Speaking,
        "state was not applied",
    );
    result.check(
        sim.avatar().lipsync().timeline().is_some(),
        "timeline cancelled by a state update",
    );
    result.check(
        sim.avatar().viseme().0 == VisemeShape::Aa,
        format!("target {:?} after the state update", sim.avatar().viseme()),
    );
    let jaw = sim.avatar().weights().get(Channel::JawOpen);
    result.check(jaw > 0.5, format!("jaw dropped to {jaw}"));
    result.check(
        sim.avatar().stats().utterances_finished == 0,
        "utterance counted before its end",
    );
    result
}

pub fn run_all() -> Vec<ScenarioResult> {
    vec![
        scenario_listening_matches_attentive(),
        scenario_stop_speaking_releases_mouth(),
        scenario_thinking_looks_away(),
        scenario_blink_cycle(),
        scenario_text_utterance(),
        scenario_timed_sources(),
        scenario_utterance_ends_before_stop(),
        scenario_state_update_mid_utterance(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_passed(result: ScenarioResult) {
        assert!(result.passed(), "{}: {:?}", result.name, result.failures);
    }

    #[test]
    fn test_listening_matches_attentive() {
        assert_passed(scenario_listening_matches_attentive());
    }

    #[test]
    fn test_stop_speaking_releases_mouth() {
        assert_passed(scenario_stop_speaking_releases_mouth());
    }

    #[test]
    fn test_thinking_looks_away() {
        assert_passed(scenario_thinking_looks_away());
    }

    #[test]
    fn test_blink_cycle() {
        assert_passed(scenario_blink_cycle());
    }

    #[test]
    fn test_text_utterance() {
        assert_passed(scenario_text_utterance());
    }

    #[test]
    fn test_timed_sources() {
        assert_passed(scenario_timed_sources());
    }

    #[test]
    fn test_utterance_ends_before_stop() {
        assert_passed(scenario_utterance_ends_before_stop());
    }

    #[test]
    fn test_state_update_mid_utterance() {
        assert_passed(scenario_state_update_mid_utterance());
    }

    #[test]
    fn test_run_all_names_are_unique() {
        let results = run_all();
        let mut names: Vec<_> = results.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), results.len());
    }

    #[test]
    fn test_mouth_moves_smoothly() {
        let mut sim = quiet_sim(AvatarConfig::default());
        sim.play(
            &Script::new()
                .speaking(0, true)
                .visemes(0, from_text("papa", 600))
                .speaking(400, false),
            Duration::from_millis(800),
        );
        // Engagement ramps and pose easing bound the per-frame jump
        assert!(sim.max_frame_delta(ChannelMask::articulators()) < 0.9);
    }
}
