//! Idle Animator - breathing and micro-movement
//!
//! Adds small deltas on top of whatever the other sources produced, so a face
//! at rest is never perfectly still.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use visage_core::{BlendshapeWeights, Channel};

/// Idle configuration
#[derive(Debug, Clone)]
pub struct IdleConfig {
    /// Breaths per second
    pub breath_rate: f32,
    /// Peak jaw opening on the in-breath
    pub breath_jaw: f32,
    /// Peak inner brow lift on the in-breath
    pub breath_brow: f32,
    /// Largest micro-movement delta per channel
    pub micro_amplitude: f32,
    /// Seconds between micro-movement knots
    pub micro_period: f32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            breath_rate: 0.25,
            breath_jaw: 0.015,
            breath_brow: 0.01,
            micro_amplitude: 0.02,
            micro_period: 1.2,
        }
    }
}

/// One smoothed random signal in [-1, 1], shared by a left/right pair
#[derive(Debug, Clone)]
struct ValueNoise {
    channels: [Channel; 2],
    from: f32,
    to: f32,
    t: f32,
}

impl ValueNoise {
    fn new(channels: [Channel; 2]) -> Self {
        Self {
            channels,
            from: 0.0,
            to: 0.0,
            t: 1.0,
        }
    }

    fn advance(&mut self, step: f32, rng: &mut StdRng) {
        self.t += step;
        while self.t >= 1.0 {
            self.t -= 1.0;
            self.from = self.to;
            self.to = rng.gen_range(-1.0..=1.0);
        }
    }

    fn value(&self) -> f32 {
        let s = self.t * self.t * (3.0 - 2.0 * self.t);
        self.from + (self.to - self.from) * s
    }
}

/// Idle animator
#[derive(Debug)]
pub struct IdleAnimator {
    config: IdleConfig,
    enabled: bool,
    intensity: f32,
    time: f32,
    rng: StdRng,
    noise: [ValueNoise; 3],
}

impl IdleAnimator {
    pub fn new(seed: u64) -> Self {
        Self::with_config(IdleConfig::default(), seed)
    }

    pub fn with_config(config: IdleConfig, seed: u64) -> Self {
        Self {
            config,
            enabled: true,
            intensity: 0.5,
            time: 0.0,
            rng: StdRng::seed_from_u64(seed),
            noise: [
                ValueNoise::new([Channel::BrowOuterUpLeft, Channel::BrowOuterUpRight]),
                ValueNoise::new([Channel::MouthSmileLeft, Channel::MouthSmileRight]),
                ValueNoise::new([Channel::EyeSquintLeft, Channel::EyeSquintRight]),
            ],
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Intensity [0.0 - 1.0]
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Largest delta this animator can apply to any channel
    pub fn max_delta(&self) -> f32 {
        let c = &self.config;
        c.breath_jaw.max(c.breath_brow).max(c.micro_amplitude).abs() * self.intensity
    }

    /// Breathing phase in [0, 1]
    fn breath(&self) -> f32 {
        let w = TAU * self.config.breath_rate * self.time;
        let slow = 0.5 + 0.5 * w.sin();
        let fast = 0.5 + 0.5 * (2.0 * w + 1.3).sin();
        0.7 * slow + 0.3 * fast
    }

    pub fn update(&mut self, dt: f32, weights: &mut BlendshapeWeights) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if !self.enabled {
            return;
        }

        self.time += dt;
        let period = self.config.micro_period.max(0.05);
        for noise in self.noise.iter_mut() {
            noise.advance(dt / period, &mut self.rng);
        }

        if self.intensity <= 0.0 {
            return;
        }

        let breath = self.breath() * self.intensity;
        weights.add_to(Channel::JawOpen, self.config.breath_jaw * breath);
        weights.add_to(Channel::BrowInnerUp, self.config.breath_brow * breath);

        let amp = self.config.micro_amplitude * self.intensity;
        for noise in &self.noise {
            let delta = noise.value() * amp;
            for channel in noise.channels {
                weights.add_to(channel, delta);
            }
        }
    }
}
