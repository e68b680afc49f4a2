//! Frame simulator for avatar testing
//!
//! Drives an `Avatar` at a fixed frame interval against a `ManualClock`, so
//! lip sync playback and easing see exactly the same time.

use std::sync::Arc;
use std::time::Duration;

use visage_core::{BlendshapeWeights, Channel, ChannelMask, CognitiveState, ManualClock};
use visage_lipsync::Viseme;
use visage_runtime::{Avatar, AvatarConfig, AvatarInputs};

/// Input delivered through the avatar mailboxes
#[derive(Debug, Clone)]
pub enum ScriptedInput {
    State(CognitiveState),
    Speaking(bool),
    Visemes(Vec<Viseme>),
}

/// Inputs keyed by delivery time
#[derive(Debug, Clone, Default)]
pub struct Script {
    events: Vec<(Duration, ScriptedInput)>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, at_ms: u64, input: ScriptedInput) -> Self {
        self.events.push((Duration::from_millis(at_ms), input));
        self.events.sort_by_key(|(at, _)| *at);
        self
    }

    pub fn state(self, at_ms: u64, state: CognitiveState) -> Self {
        self.at(at_ms, ScriptedInput::State(state))
    }

    pub fn speaking(self, at_ms: u64, speaking: bool) -> Self {
        self.at(at_ms, ScriptedInput::Speaking(speaking))
    }

    pub fn visemes(self, at_ms: u64, visemes: Vec<Viseme>) -> Self {
        self.at(at_ms, ScriptedInput::Visemes(visemes))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Deterministic avatar simulator
pub struct AvatarSimulator {
    avatar: Avatar,
    inputs: AvatarInputs,
    clock: ManualClock,
    /// Fixed frame interval
    frame: Duration,
    /// Current simulation time
    current_time: Duration,
    /// Output of every frame, when recording
    trace: Vec<BlendshapeWeights>,
    recording: bool,
}

impl AvatarSimulator {
    pub fn new(config: AvatarConfig, frame: Duration) -> Self {
        let clock = ManualClock::new();
        let avatar = Avatar::with_clock(config, Arc::new(clock.clone()));
        AvatarSimulator {
            inputs: avatar.inputs(),
            avatar,
            clock,
            frame,
            current_time: Duration::ZERO,
            trace: Vec::new(),
            recording: false,
        }
    }

    /// 60 fps with default configuration
    pub fn standard() -> Self {
        Self::new(AvatarConfig::default(), Duration::from_millis(16))
    }

    /// No idle motion and no automatic blinks
    pub fn quiet(config: AvatarConfig, frame: Duration) -> Self {
        let config = AvatarConfig {
            idle_intensity: 0.0,
            ..config
        };
        let mut sim = Self::new(config, frame);
        sim.avatar.eyes_mut().set_auto_blink(false);
        sim
    }

    pub fn record(&mut self, enabled: bool) {
        self.recording = enabled;
    }

    /// Advance the clock by one frame and tick
    pub fn step(&mut self) -> BlendshapeWeights {
        self.clock.advance(self.frame);
        self.current_time += self.frame;
        let weights = *self.avatar.tick(self.frame.as_secs_f32());
        if self.recording {
            self.trace.push(weights);
        }
        weights
    }

    /// Step until at least `duration` has elapsed; returns the frame count
    pub fn run_for(&mut self, duration: Duration) -> usize {
        let end = self.current_time + duration;
        let mut frames = 0;
        while self.current_time < end {
            self.step();
            frames += 1;
        }
        frames
    }

    pub fn run_frames(&mut self, frames: usize) {
        for _ in 0..frames {
            self.step();
        }
    }

    /// Step until `done` holds for the last output, up to `limit`.
    /// Returns the time it took, or `None` if the limit passed first.
    pub fn run_until<F>(&mut self, limit: Duration, mut done: F) -> Option<Duration>
    where
        F: FnMut(&BlendshapeWeights) -> bool,
    {
        let start = self.current_time;
        while self.current_time - start < limit {
            let weights = self.step();
            if done(&weights) {
                return Some(self.current_time - start);
            }
        }
        None
    }

    /// Play `script` through the mailboxes, stepping until `duration` past
    /// the current time. Inputs land on the first frame at or after their
    /// scheduled time.
    pub fn play(&mut self, script: &Script, duration: Duration) {
        let origin = self.current_time;
        let end = origin + duration;
        let mut pending = script.events.iter().peekable();

        while self.current_time < end {
            let next_frame = self.current_time + self.frame;
            while let Some((at, input)) = pending.peek() {
                if origin + *at > next_frame {
                    break;
                }
                self.post(input.clone());
                pending.next();
            }
            self.step();
        }
    }

    fn post(&self, input: ScriptedInput) {
        match input {
            ScriptedInput::State(state) => self.inputs.post_state(state),
            ScriptedInput::Speaking(speaking) => self.inputs.post_speaking(speaking),
            ScriptedInput::Visemes(visemes) => self.inputs.post_visemes(visemes),
        }
    }

    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    pub fn inputs(&self) -> AvatarInputs {
        self.inputs.clone()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn trace(&self) -> &[BlendshapeWeights] {
        &self.trace
    }

    /// Highest recorded value of `channel`
    pub fn peak(&self, channel: Channel) -> f32 {
        self.trace.iter().map(|w| w.get(channel)).fold(0.0, f32::max)
    }

    /// Largest single-frame change within `mask` over the recording
    pub fn max_frame_delta(&self, mask: ChannelMask) -> f32 {
        self.trace
            .windows(2)
            .map(|pair| pair[0].max_difference_in(&pair[1], mask))
            .fold(0.0, f32::max)
    }
}

/// Builder for simulation scenarios
pub struct ScenarioBuilder {
    config: AvatarConfig,
    frame: Duration,
    quiet: bool,
    recording: bool,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        ScenarioBuilder {
            config: AvatarConfig::default(),
            frame: Duration::from_millis(16),
            quiet: false,
            recording: false,
        }
    }

    pub fn with_config(mut self, config: AvatarConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_frame(mut self, frame: Duration) -> Self {
        self.frame = frame;
        self
    }

    /// Disable idle motion and automatic blinks
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn recording(mut self) -> Self {
        self.recording = true;
        self
    }

    pub fn build(self) -> AvatarSimulator {
        let mut sim = if self.quiet {
            AvatarSimulator::quiet(self.config, self.frame)
        } else {
            AvatarSimulator::new(self.config, self.frame)
        };
        sim.record(self.recording);
        sim
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}
