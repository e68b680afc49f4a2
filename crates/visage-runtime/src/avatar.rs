//! Avatar - the per-frame compositor
//!
//! Each tick runs the animation sources in a fixed order and returns one
//! weight vector. External inputs only enter through mailboxes polled at the
//! start of a tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;
use visage_core::{BlendshapeWeights, ChannelMask, Clock, CognitiveState, SystemClock};
use visage_face::{ExpressionController, EyeController, GazeBias, IdleAnimator, StateMapper};
use visage_lipsync::{LipSyncController, Viseme, VisemeEventTrack, VisemeShape};

use crate::{adapter_for, AvatarConfig, Mailbox, OutputAdapter};

#[derive(Clone, Debug, Default)]
pub struct AvatarStats {
    pub ticks: u64,
    pub states_applied: u64,
    pub timelines_queued: u64,
    pub utterances_finished: u64,
    pub last_tick_duration: Duration,
}

/// Thread-safe input handle. Clones post into the same avatar.
#[derive(Clone, Debug, Default)]
pub struct AvatarInputs {
    state: Mailbox<CognitiveState>,
    visemes: Mailbox<Vec<Viseme>>,
    speaking: Mailbox<bool>,
}

impl AvatarInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest cognitive state; replaces any not yet applied
    pub fn post_state(&self, state: CognitiveState) {
        self.state.post(state);
    }

    /// New utterance; replaces any not yet queued
    pub fn post_visemes(&self, visemes: Vec<Viseme>) {
        self.visemes.post(visemes);
    }

    pub fn post_event_track(&self, track: &VisemeEventTrack) {
        self.post_visemes(track.to_visemes());
    }

    pub fn post_speaking(&self, speaking: bool) {
        self.speaking.post(speaking);
    }
}

/// One animated face
pub struct Avatar {
    config: AvatarConfig,
    inputs: AvatarInputs,

    mapper: StateMapper,
    expression: ExpressionController,
    eyes: EyeController,
    idle: IdleAnimator,
    lipsync: LipSyncController,

    /// Last applied state
    state: CognitiveState,
    /// Last gaze bias pushed to the eyes
    gaze: Option<GazeBias>,
    mouth: ChannelMask,

    weights: BlendshapeWeights,
    adapter: Box<dyn OutputAdapter>,
    output: Vec<(&'static str, f32)>,

    stats: AvatarStats,
}

impl std::fmt::Debug for Avatar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Avatar")
            .field("state", &self.state)
            .field("speaking", &self.lipsync.is_speaking())
            .field("adapter", &self.adapter.name())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Avatar {
    pub fn new(config: AvatarConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Avatar whose lip sync reads time from `clock`
    pub fn with_clock(config: AvatarConfig, clock: Arc<dyn Clock>) -> Self {
        let config = config.sanitized();

        let mut idle = IdleAnimator::with_config(config.idle_config(), config.idle_seed());
        idle.set_intensity(config.idle_intensity);

        let mut eyes = EyeController::with_config(config.eye_config(), config.eye_seed());
        eyes.set_wander(true);

        debug!(seed = config.seed, format = ?config.format, "Avatar created");

        Avatar {
            mapper: StateMapper::new(config.mapper_config()),
            expression: ExpressionController::new(),
            eyes,
            idle,
            lipsync: LipSyncController::with_config(config.lipsync_config(), clock),
            inputs: AvatarInputs::new(),
            state: CognitiveState::default(),
            gaze: None,
            mouth: ChannelMask::articulators(),
            weights: BlendshapeWeights::ZERO,
            adapter: adapter_for(config.format),
            output: Vec::with_capacity(64),
            stats: AvatarStats::default(),
            config,
        }
    }

    /// Handle for posting inputs from other threads
    pub fn inputs(&self) -> AvatarInputs {
        self.inputs.clone()
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: f32) -> &BlendshapeWeights {
        let start = Instant::now();
        self.stats.ticks += 1;

        // Stage 1: Poll inputs
        self.poll_inputs();

        // Stage 2: Expression with layers
        let mut weights = self.expression.update(dt);

        // Stage 3: Gaze and blink
        self.eyes.update(dt, &mut weights);

        // Stage 4: Idle motion
        self.idle.update(dt, &mut weights);

        // Stage 5: Lip sync owns the mouth last
        self.lipsync.update(dt);
        self.blend_mouth(&mut weights);
        self.stats.utterances_finished = self.lipsync.utterances_finished();

        // Stage 6: Publish
        self.weights = weights;
        self.adapter.write(&self.weights, &mut self.output);

        self.stats.last_tick_duration = start.elapsed();
        &self.weights
    }

    /// Stage 1: Poll inputs. Speaking edges go before a new timeline so a
    /// stale "stopped" flag cannot cancel speech that arrived with it.
    fn poll_inputs(&mut self) {
        if let Some(state) = self.inputs.state.take() {
            self.apply_state(state);
        }
        if let Some(speaking) = self.inputs.speaking.take() {
            self.set_speaking(speaking);
        }
        if let Some(visemes) = self.inputs.visemes.take() {
            self.queue_visemes(visemes);
        }
    }

    /// Stage 5: Blend lip sync over the articulators by engagement
    fn blend_mouth(&self, weights: &mut BlendshapeWeights) {
        let engagement = self.lipsync.engagement();
        if engagement <= 0.0 {
            return;
        }
        let pose = self.lipsync.mouth_pose();
        for channel in self.mouth.iter() {
            let below = weights.get(channel);
            weights.set(channel, below + (pose.get(channel) - below) * engagement);
        }
    }

    /// Map a cognitive state and retarget expression and gaze
    pub fn apply_state(&mut self, state: CognitiveState) {
        let state = state.sanitized();

        let target = self.mapper.expression(&state);
        let profile = self.mapper.transition(&state);
        self.expression
            .transition_to(target, profile.duration, profile.curve);

        // Retargeting restarts the saccade hold, so only do it on change
        let gaze = self.mapper.gaze(&state);
        if self.gaze != Some(gaze) {
            match gaze {
                GazeBias::Look(at) => {
                    self.eyes.set_wander(false);
                    self.eyes.look_at(at.x, at.y);
                }
                GazeBias::Wander => self.eyes.set_wander(true),
            }
            self.gaze = Some(gaze);
        }

        debug!(
            mode = ?state.mode,
            valence = state.valence,
            arousal = state.arousal,
            transition_s = profile.duration,
            "Cognitive state applied"
        );

        // `is_speaking` is informational; lip sync follows the speaking input
        self.stats.states_applied += 1;
        self.state = state;
    }

    /// Forward speaking edges; a falling edge clears the viseme queue
    pub fn set_speaking(&mut self, speaking: bool) {
        if speaking == self.lipsync.is_speaking() {
            return;
        }
        self.lipsync.set_speaking(speaking);
        debug!(speaking, "Speaking changed");
    }

    pub fn queue_visemes(&mut self, visemes: Vec<Viseme>) {
        if !visemes.is_empty() {
            self.stats.timelines_queued += 1;
        }
        self.lipsync.queue_visemes(visemes);
    }

    pub fn clear_queue(&mut self) {
        self.lipsync.clear_queue();
    }

    /// Output of the last tick
    pub fn weights(&self) -> &BlendshapeWeights {
        &self.weights
    }

    /// Adapter output of the last tick
    pub fn output(&self) -> &[(&'static str, f32)] {
        &self.output
    }

    pub fn viseme(&self) -> (VisemeShape, f32) {
        self.lipsync.target()
    }

    pub fn state(&self) -> &CognitiveState {
        &self.state
    }

    pub fn is_speaking(&self) -> bool {
        self.lipsync.is_speaking()
    }

    pub fn stats(&self) -> &AvatarStats {
        &self.stats
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn expression(&self) -> &ExpressionController {
        &self.expression
    }

    pub fn expression_mut(&mut self) -> &mut ExpressionController {
        &mut self.expression
    }

    pub fn eyes(&self) -> &EyeController {
        &self.eyes
    }

    pub fn eyes_mut(&mut self) -> &mut EyeController {
        &mut self.eyes
    }

    pub fn idle_mut(&mut self) -> &mut IdleAnimator {
        &mut self.idle
    }

    pub fn lipsync(&self) -> &LipSyncController {
        &self.lipsync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use visage_core::{Channel, CognitiveMode, ManualClock};
    use visage_face::{BlendMode, ExpressionPreset};

    fn quiet_config() -> AvatarConfig {
        AvatarConfig {
            idle_intensity: 0.0,
            ..AvatarConfig::default()
        }
    }

    fn avatar() -> (ManualClock, Avatar) {
        let clock = ManualClock::new();
        let mut avatar = Avatar::with_clock(quiet_config(), Arc::new(clock.clone()));
        avatar.eyes_mut().set_auto_blink(false);
        (clock, avatar)
    }

    fn run(clock: &ManualClock, avatar: &mut Avatar, ticks: usize) {
        for _ in 0..ticks {
            clock.advance(Duration::from_millis(16));
            avatar.tick(0.016);
        }
    }

    #[test]
    fn test_state_arrives_through_mailbox() {
        let (clock, mut avatar) = avatar();
        let inputs = avatar.inputs();

        inputs.post_state(CognitiveState::new(CognitiveMode::Thinking));
        inputs.post_state(CognitiveState::new(CognitiveMode::Speaking));
        run(&clock, &mut avatar, 1);

        // Only the latest delivery is applied
        assert_eq!(avatar.state().mode, CognitiveMode::Speaking);
        assert_eq!(avatar.stats().states_applied, 1);
        assert_eq!(avatar.stats().ticks, 1);
    }

    #[test]
    fn test_expression_reaches_mapped_target() {
        let (clock, mut avatar) = avatar();
        avatar.apply_state(CognitiveState::new(CognitiveMode::Speaking));
        run(&clock, &mut avatar, 20);

        let smile = avatar.weights().get(Channel::MouthSmileLeft);
        assert!((smile - ExpressionPreset::Confident.resolve().get(Channel::MouthSmileLeft)).abs() < 1e-6);
    }

    #[test]
    fn test_lipsync_owns_the_mouth() {
        let (clock, mut avatar) = avatar();
        avatar
            .expression_mut()
            .add_layer("gape", BlendshapeWeights::from_pairs(&[(Channel::JawOpen, 0.9)]), 1.0, BlendMode::Override);
        avatar.set_speaking(true);
        avatar.queue_visemes(vec![Viseme::new(VisemeShape::U, 1.0, 0, 2000)]);
        run(&clock, &mut avatar, 20);

        let w = avatar.weights();
        let pose = VisemeShape::U.pose(1.0);
        assert!((w.get(Channel::JawOpen) - pose.get(Channel::JawOpen)).abs() < 1e-6);
        assert!((w.get(Channel::MouthPucker) - pose.get(Channel::MouthPucker)).abs() < 1e-6);
        assert_eq!(avatar.viseme().0, VisemeShape::U);
    }

    #[test]
    fn test_falling_speaking_edge_clears() {
        let (clock, mut avatar) = avatar();
        let inputs = avatar.inputs();
        inputs.post_speaking(true);
        inputs.post_visemes(vec![Viseme::new(VisemeShape::Aa, 1.0, 0, 5000)]);
        run(&clock, &mut avatar, 10);
        assert!(avatar.lipsync().is_active());
        assert_eq!(avatar.stats().timelines_queued, 1);

        inputs.post_speaking(false);
        run(&clock, &mut avatar, 1);
        assert!(!avatar.lipsync().is_active());
        assert_eq!(avatar.viseme(), (VisemeShape::Sil, 0.0));
    }

    #[test]
    fn test_state_speaking_flag_does_not_drive_lipsync() {
        let (clock, mut avatar) = avatar();
        avatar.apply_state(CognitiveState::new(CognitiveMode::Speaking).speaking(true));
        run(&clock, &mut avatar, 2);
        assert!(!avatar.is_speaking());
        assert!(!avatar.lipsync().is_active());

        avatar.set_speaking(true);
        avatar.queue_visemes(vec![Viseme::new(VisemeShape::Aa, 1.0, 0, 5000)]);
        run(&clock, &mut avatar, 2);
        avatar.apply_state(CognitiveState::new(CognitiveMode::Listening));
        run(&clock, &mut avatar, 1);
        assert!(avatar.is_speaking());
        assert!(avatar.lipsync().timeline().is_some());
    }

    #[test]
    fn test_state_update_mid_utterance_keeps_playing() {
        let (clock, mut avatar) = avatar();
        let inputs = avatar.inputs();
        inputs.post_speaking(true);
        inputs.post_visemes(vec![Viseme::new(VisemeShape::Aa, 1.0, 0, 3000)]);
        run(&clock, &mut avatar, 10);

        // The bridge keeps sending states without the speaking flag
        inputs.post_state(CognitiveState::new(CognitiveMode::Speaking).with_valence(0.3));
        run(&clock, &mut avatar, 2);
        assert!(avatar.lipsync().is_active());
        assert!(avatar.lipsync().timeline().is_some());
        assert_eq!(avatar.viseme().0, VisemeShape::Aa);
        assert!(avatar.weights().get(Channel::JawOpen) > 0.5);
    }

    #[test]
    fn test_speaking_after_clear_queue_restarts_lipsync() {
        let (clock, mut avatar) = avatar();
        let inputs = avatar.inputs();
        inputs.post_speaking(true);
        run(&clock, &mut avatar, 2);
        assert!(avatar.lipsync().is_active());

        avatar.clear_queue();
        assert!(!avatar.is_speaking());
        inputs.post_speaking(true);
        run(&clock, &mut avatar, 1);
        assert!(avatar.is_speaking());
        assert!(avatar.lipsync().is_active());
    }

    #[test]
    fn test_speaking_with_short_utterance_returns_to_silence() {
        let (clock, mut avatar) = avatar();
        let inputs = avatar.inputs();
        inputs.post_speaking(true);
        inputs.post_visemes(vec![Viseme::new(VisemeShape::E, 0.7, 0, 100)]);
        run(&clock, &mut avatar, 30);

        assert_eq!(avatar.viseme(), (VisemeShape::Sil, 0.0));
        assert!(!avatar.lipsync().is_active());
        assert!(!avatar.is_speaking());
        assert_eq!(avatar.stats().utterances_finished, 1);
        assert_eq!(avatar.weights().get(Channel::JawOpen), 0.0);

        // A late falling edge is harmless
        inputs.post_speaking(false);
        run(&clock, &mut avatar, 1);
        assert_eq!(avatar.viseme(), (VisemeShape::Sil, 0.0));
    }

    #[test]
    fn test_repeated_states_allow_saccades() {
        let (clock, mut avatar) = avatar();
        let inputs = avatar.inputs();

        // Listening looks at the center; the bridge streams it at about 20 Hz
        let mut max_offset = 0.0f32;
        for tick in 0..220 {
            if tick % 3 == 0 {
                inputs.post_state(CognitiveState::new(CognitiveMode::Listening));
            }
            run(&clock, &mut avatar, 1);
            if tick > 120 {
                let (x, y) = avatar.eyes().gaze();
                max_offset = max_offset.max(x.abs()).max(y.abs());
            }
        }
        assert_eq!(avatar.stats().states_applied, 74);
        assert!(max_offset > 1e-4, "gaze never jittered: {max_offset}");
    }

    #[test]
    fn test_utterance_completion_is_counted() {
        let (clock, mut avatar) = avatar();
        avatar.queue_visemes(vec![Viseme::new(VisemeShape::E, 1.0, 0, 100)]);
        run(&clock, &mut avatar, 10);
        assert_eq!(avatar.stats().utterances_finished, 1);
    }

    #[test]
    fn test_output_adapter_follows_config() {
        let clock = ManualClock::new();
        let config = AvatarConfig {
            format: crate::OutputFormat::Vrm,
            ..quiet_config()
        };
        let mut avatar = Avatar::with_clock(config, Arc::new(clock));
        avatar.tick(0.016);
        assert!(avatar.output().iter().any(|(name, _)| *name == "blinkLeft"));
    }

    proptest! {
        #[test]
        fn test_output_stays_in_range(
            steps in proptest::collection::vec((0usize..7, -2.0f32..2.0, -1.0f32..2.0, 0.0f32..0.2, any::<bool>()), 1..40),
        ) {
            let (clock, mut avatar) = avatar();
            avatar.idle_mut().set_intensity(1.0);
            for (mode, valence, arousal, dt, speaking) in steps {
                avatar.apply_state(
                    CognitiveState::new(CognitiveMode::ALL[mode])
                        .with_valence(valence)
                        .with_arousal(arousal)
                        .speaking(speaking),
                );
                clock.advance_secs(dt);
                let w = *avatar.tick(dt);
                for (_, value) in w.iter() {
                    prop_assert!((0.0..=1.0).contains(&value));
                }
            }
        }
    }

    #[test]
    fn test_independent_avatars() {
        let (clock_a, mut a) = avatar();
        let (clock_b, mut b) = avatar();
        a.apply_state(CognitiveState::new(CognitiveMode::Error));
        run(&clock_a, &mut a, 20);
        run(&clock_b, &mut b, 20);
        assert!(a.weights().get(Channel::BrowInnerUp) > 0.3);
        assert_eq!(b.state().mode, CognitiveMode::Idle);
    }
}
