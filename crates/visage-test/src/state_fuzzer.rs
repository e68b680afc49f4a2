//! State Fuzzer - Randomized input streams against the output invariants
//!
//! Tests:
//! - Every output weight stays finite and inside [0, 1]
//! - The lip sync target stays a valid viseme intensity
//! - Hostile inputs (NaN, out-of-range values, odd frame times) degrade
//!   gracefully

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use visage_core::{CognitiveMode, CognitiveState, ManualClock};
use visage_lipsync::{Viseme, VisemeShape};
use visage_runtime::{Avatar, AvatarConfig};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of frames to run
    pub frames: usize,
    /// Per-frame probability of a new cognitive state
    pub state_prob: f64,
    /// Per-frame probability of a speaking edge
    pub speaking_prob: f64,
    /// Per-frame probability of a new viseme timeline
    pub viseme_prob: f64,
    /// Longest frame, seconds
    pub max_frame: f32,
    /// Generate values outside their documented ranges, including NaN
    pub hostile_values: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            frames: 2000,
            state_prob: 0.05,
            speaking_prob: 0.02,
            viseme_prob: 0.02,
            max_frame: 0.05,
            hostile_values: false,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            frames: 300,
            ..Default::default()
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            frames: 20_000,
            state_prob: 0.1,
            speaking_prob: 0.05,
            viseme_prob: 0.05,
            ..Default::default()
        }
    }

    /// Out-of-range values and stalled frames
    pub fn adversarial() -> Self {
        FuzzerConfig {
            frames: 2000,
            state_prob: 0.3,
            speaking_prob: 0.2,
            viseme_prob: 0.2,
            max_frame: 1.5,
            hostile_values: true,
            seed: 7,
        }
    }
}

/// Result of a fuzzing run
#[derive(Clone, Debug, Default)]
pub struct FuzzResult {
    pub frames: usize,
    pub states_posted: usize,
    pub speaking_edges: usize,
    pub timelines_posted: usize,
    pub violations: Vec<String>,
}

impl FuzzResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Randomized driver for one avatar
pub struct StateFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
    clock: ManualClock,
    avatar: Avatar,
    speaking: bool,
}

impl StateFuzzer {
    pub fn new(config: FuzzerConfig) -> Self {
        let clock = ManualClock::new();
        let avatar_config = AvatarConfig {
            seed: config.seed,
            idle_intensity: 1.0,
            ..AvatarConfig::default()
        };
        StateFuzzer {
            rng: StdRng::seed_from_u64(config.seed),
            avatar: Avatar::with_clock(avatar_config, Arc::new(clock.clone())),
            clock,
            speaking: false,
            config,
        }
    }

    pub fn run(&mut self) -> FuzzResult {
        let mut result = FuzzResult::new();
        let inputs = self.avatar.inputs();

        for frame in 0..self.config.frames {
            if self.rng.gen_bool(self.config.state_prob) {
                inputs.post_state(self.random_state());
                result.states_posted += 1;
            }
            if self.rng.gen_bool(self.config.speaking_prob) {
                self.speaking = !self.speaking;
                inputs.post_speaking(self.speaking);
                result.speaking_edges += 1;
            }
            if self.rng.gen_bool(self.config.viseme_prob) {
                inputs.post_visemes(self.random_visemes());
                result.timelines_posted += 1;
            }

            let dt = self.random_dt();
            self.clock.advance_secs(dt);
            let weights = *self.avatar.tick(dt);
            result.frames += 1;

            for (channel, value) in weights.iter() {
                if !invariants::weight_in_range(value) {
                    result
                        .violations
                        .push(format!("frame {frame}: {} = {value}", channel.name()));
                }
            }
            let (shape, intensity) = self.avatar.viseme();
            if !invariants::viseme_target_valid(shape, intensity) {
                result
                    .violations
                    .push(format!("frame {frame}: viseme {shape} at {intensity}"));
            }
        }

        result
    }

    fn random_value(&mut self, lo: f32, hi: f32) -> f32 {
        if self.config.hostile_values {
            match self.rng.gen_range(0..10) {
                0 => f32::NAN,
                1 => self.rng.gen_range(-100.0..100.0),
                _ => self.rng.gen_range(lo..=hi),
            }
        } else {
            self.rng.gen_range(lo..=hi)
        }
    }

    fn random_state(&mut self) -> CognitiveState {
        let mode = CognitiveMode::ALL[self.rng.gen_range(0..CognitiveMode::ALL.len())];
        let mut state = CognitiveState::new(mode)
            .with_valence(self.random_value(-1.0, 1.0))
            .with_arousal(self.random_value(0.0, 1.0))
            .with_confidence(self.random_value(0.0, 1.0))
            .speaking(self.rng.gen_bool(0.3));
        if self.rng.gen_bool(0.2) {
            let x = self.random_value(-1.0, 1.0);
            let y = self.random_value(-1.0, 1.0);
            state = state.with_gaze_target(x, y);
        }
        state
    }

    fn random_visemes(&mut self) -> Vec<Viseme> {
        let count = self.rng.gen_range(0..24);
        let mut offset = self.rng.gen_range(0..200);
        (0..count)
            .map(|_| {
                let shape = VisemeShape::ALL[self.rng.gen_range(0..VisemeShape::ALL.len())];
                let weight = self.random_value(0.0, 1.0);
                let duration = self.rng.gen_range(0..250);
                let viseme = Viseme::new(shape, weight, offset, duration);
                offset += duration + self.rng.gen_range(0..40);
                viseme
            })
            .collect()
    }

    fn random_dt(&mut self) -> f32 {
        if self.config.hostile_values && self.rng.gen_bool(0.01) {
            return f32::NAN;
        }
        self.rng.gen_range(0.0..=self.config.max_frame)
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }
}

/// Invariant checks shared by the fuzzer and scenario tests
pub mod invariants {
    use visage_lipsync::VisemeShape;

    pub fn weight_in_range(value: f32) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }

    /// Silence always carries zero intensity
    pub fn viseme_target_valid(shape: VisemeShape, intensity: f32) -> bool {
        weight_in_range(intensity) && (!shape.is_silence() || intensity == 0.0)
    }
}
