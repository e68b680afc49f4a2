//! Eye Controller - gaze smoothing, blinking and micro-saccades
//!
//! Gaze approaches its target exponentially, which is critically damped and
//! never overshoots. Blinks run a fixed four-phase state machine. When nobody
//! has told the eyes where to look for a while, small decaying jumps
//! (micro-saccades) keep them from looking painted on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;
use visage_core::{BlendshapeWeights, Channel, GazeTarget};

/// Blink state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Open,
    Closing,
    Closed,
    Opening,
}

/// Per-phase blink durations in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkTiming {
    pub closing: f32,
    pub closed: f32,
    pub opening: f32,
}

impl BlinkTiming {
    /// Shortest allowed phase, keeps the phase loop finite
    const MIN_PHASE: f32 = 0.001;

    pub fn total(&self) -> f32 {
        self.closing + self.closed + self.opening
    }

    fn sanitized(self) -> Self {
        let fix = |v: f32| if v.is_finite() { v.max(Self::MIN_PHASE) } else { Self::MIN_PHASE };
        Self {
            closing: fix(self.closing),
            closed: fix(self.closed),
            opening: fix(self.opening),
        }
    }
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self {
            closing: 0.06,
            closed: 0.03,
            opening: 0.09,
        }
    }
}

/// Eye configuration
#[derive(Debug, Clone)]
pub struct EyeConfig {
    /// Exponential gaze approach rate (1/s)
    pub gaze_rate: f32,
    pub blink: BlinkTiming,
    /// Automatic blink interval bounds in seconds
    pub blink_interval: (f32, f32),
    /// Seconds without `look_at` before micro-saccades start
    pub saccade_hold: f32,
    /// Seconds between micro-saccades
    pub saccade_interval: (f32, f32),
    /// Largest saccade offset per axis
    pub saccade_amplitude: f32,
    /// Saccade offset decay rate (1/s)
    pub saccade_decay: f32,
    /// Seconds between wander retargets
    pub wander_interval: (f32, f32),
    /// Wander range per axis
    pub wander_range: (f32, f32),
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            gaze_rate: 10.0,
            blink: BlinkTiming::default(),
            blink_interval: (2.0, 5.0),
            saccade_hold: 1.5,
            saccade_interval: (0.4, 1.6),
            saccade_amplitude: 0.04,
            saccade_decay: 6.0,
            wander_interval: (2.0, 4.0),
            wander_range: (0.3, 0.15),
        }
    }
}

/// Shortest automatic blink interval
const MIN_BLINK_INTERVAL: f32 = 0.2;

fn sanitize_range(min: f32, max: f32, floor: f32) -> (f32, f32) {
    let fix = |v: f32| if v.is_finite() { v.max(floor) } else { floor };
    let (a, b) = (fix(min), fix(max));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Eye controller
#[derive(Debug)]
pub struct EyeController {
    config: EyeConfig,
    rng: StdRng,

    target: GazeTarget,
    smoothed: (f32, f32),
    /// Seconds since the last explicit `look_at`
    since_look_at: f32,

    saccade_offset: (f32, f32),
    saccade_timer: f32,

    wander: bool,
    wander_timer: f32,

    phase: BlinkPhase,
    phase_elapsed: f32,
    blink_countdown: f32,
    auto_blink: bool,
}

impl EyeController {
    pub fn new(seed: u64) -> Self {
        Self::with_config(EyeConfig::default(), seed)
    }

    pub fn with_config(mut config: EyeConfig, seed: u64) -> Self {
        config.blink = config.blink.sanitized();
        let (min, max) = config.blink_interval;
        config.blink_interval = sanitize_range(min, max, MIN_BLINK_INTERVAL);
        let (min, max) = config.saccade_interval;
        config.saccade_interval = sanitize_range(min, max, 0.05);
        let (min, max) = config.wander_interval;
        config.wander_interval = sanitize_range(min, max, 0.1);

        let mut ctrl = Self {
            since_look_at: config.saccade_hold,
            config,
            rng: StdRng::seed_from_u64(seed),
            target: GazeTarget::CENTER,
            smoothed: (0.0, 0.0),
            saccade_offset: (0.0, 0.0),
            saccade_timer: 0.0,
            wander: false,
            wander_timer: 0.0,
            phase: BlinkPhase::Open,
            phase_elapsed: 0.0,
            blink_countdown: 0.0,
            auto_blink: true,
        };
        ctrl.blink_countdown = ctrl.next_blink_interval();
        ctrl.saccade_timer = ctrl.next_saccade_interval();
        ctrl
    }

    /// Look at a point, both axes clamped into [-1, 1]
    pub fn look_at(&mut self, x: f32, y: f32) {
        self.target = GazeTarget::new(x, y);
        self.since_look_at = 0.0;
    }

    pub fn look_at_camera(&mut self) {
        self.look_at(0.0, 0.0);
    }

    /// Drift between nearby random targets until the next `look_at`
    pub fn set_wander(&mut self, enabled: bool) {
        if enabled && !self.wander {
            self.wander_timer = 0.0;
        }
        self.wander = enabled;
    }

    /// Force a blink. No-op while a blink is already running.
    pub fn trigger_blink(&mut self) {
        if self.phase == BlinkPhase::Open {
            self.phase = BlinkPhase::Closing;
            self.phase_elapsed = 0.0;
        }
    }

    /// Bounds of the automatic blink countdown, in seconds
    pub fn set_blink_rate(&mut self, min: f32, max: f32) {
        self.config.blink_interval = sanitize_range(min, max, MIN_BLINK_INTERVAL);
        let (_, max) = self.config.blink_interval;
        if self.blink_countdown > max {
            self.blink_countdown = self.next_blink_interval();
        }
    }

    /// Enable or disable automatic blinking. Forced blinks still work.
    pub fn set_auto_blink(&mut self, enabled: bool) {
        if enabled && !self.auto_blink {
            self.blink_countdown = self.next_blink_interval();
        }
        self.auto_blink = enabled;
    }

    /// Advance and write eye channels into `weights`
    pub fn update(&mut self, dt: f32, weights: &mut BlendshapeWeights) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.advance_wander(dt);

        // Gaze smoothing
        let k = 1.0 - (-self.config.gaze_rate * dt).exp();
        self.smoothed.0 += (self.target.x - self.smoothed.0) * k;
        self.smoothed.1 += (self.target.y - self.smoothed.1) * k;

        self.advance_blink(dt);
        self.advance_saccades(dt);

        self.write(weights);
    }

    fn advance_wander(&mut self, dt: f32) {
        if !self.wander {
            return;
        }
        self.wander_timer -= dt;
        if self.wander_timer <= 0.0 {
            let (rx, ry) = self.config.wander_range;
            let x = if rx > 0.0 { self.rng.gen_range(-rx..=rx) } else { 0.0 };
            let y = if ry > 0.0 { self.rng.gen_range(-ry..=ry) } else { 0.0 };
            self.target = GazeTarget::new(x, y);
            let (min, max) = self.config.wander_interval;
            self.wander_timer = self.rng.gen_range(min..=max);
        }
    }

    fn advance_blink(&mut self, dt: f32) {
        let mut remaining = dt;
        loop {
            match self.phase {
                BlinkPhase::Open => {
                    if !self.auto_blink {
                        break;
                    }
                    self.blink_countdown -= remaining;
                    if self.blink_countdown > 0.0 {
                        break;
                    }
                    remaining = -self.blink_countdown;
                    self.phase = BlinkPhase::Closing;
                    self.phase_elapsed = 0.0;
                    trace!("Automatic blink");
                }
                phase => {
                    self.phase_elapsed += remaining;
                    let duration = self.phase_duration(phase);
                    if self.phase_elapsed < duration {
                        break;
                    }
                    remaining = self.phase_elapsed - duration;
                    self.phase_elapsed = 0.0;
                    self.phase = match phase {
                        BlinkPhase::Closing => BlinkPhase::Closed,
                        BlinkPhase::Closed => BlinkPhase::Opening,
                        _ => BlinkPhase::Open,
                    };
                    if self.phase == BlinkPhase::Open {
                        self.blink_countdown = self.next_blink_interval();
                    }
                }
            }
        }
    }

    fn advance_saccades(&mut self, dt: f32) {
        let decay = (-self.config.saccade_decay * dt).exp();
        self.saccade_offset.0 *= decay;
        self.saccade_offset.1 *= decay;

        self.since_look_at += dt;
        if self.since_look_at < self.config.saccade_hold {
            return;
        }

        self.saccade_timer -= dt;
        if self.saccade_timer <= 0.0 {
            let amp = self.config.saccade_amplitude.abs();
            if amp > 0.0 {
                self.saccade_offset = (
                    self.rng.gen_range(-amp..=amp),
                    self.rng.gen_range(-amp..=amp),
                );
            }
            self.saccade_timer = self.next_saccade_interval();
        }
    }

    fn write(&self, weights: &mut BlendshapeWeights) {
        let (x, y) = self.gaze();

        let right = x.max(0.0);
        let left = (-x).max(0.0);
        let up = y.max(0.0);
        let down = (-y).max(0.0);

        weights.set(Channel::EyeLookOutRight, right);
        weights.set(Channel::EyeLookInLeft, right);
        weights.set(Channel::EyeLookOutLeft, left);
        weights.set(Channel::EyeLookInRight, left);
        weights.set(Channel::EyeLookUpLeft, up);
        weights.set(Channel::EyeLookUpRight, up);
        weights.set(Channel::EyeLookDownLeft, down);
        weights.set(Channel::EyeLookDownRight, down);

        let blink = self.blink_amount();
        weights.raise_to(Channel::EyeBlinkLeft, blink);
        weights.raise_to(Channel::EyeBlinkRight, blink);
    }

    fn phase_duration(&self, phase: BlinkPhase) -> f32 {
        match phase {
            BlinkPhase::Open => 0.0,
            BlinkPhase::Closing => self.config.blink.closing,
            BlinkPhase::Closed => self.config.blink.closed,
            BlinkPhase::Opening => self.config.blink.opening,
        }
    }

    fn next_blink_interval(&mut self) -> f32 {
        let (min, max) = self.config.blink_interval;
        self.rng.gen_range(min..=max)
    }

    fn next_saccade_interval(&mut self) -> f32 {
        let (min, max) = self.config.saccade_interval;
        self.rng.gen_range(min..=max)
    }

    pub fn is_blinking(&self) -> bool {
        self.phase != BlinkPhase::Open
    }

    pub fn blink_phase(&self) -> BlinkPhase {
        self.phase
    }

    /// Eyelid closure [0.0 - 1.0]
    pub fn blink_amount(&self) -> f32 {
        let t = |duration: f32| (self.phase_elapsed / duration).clamp(0.0, 1.0);
        match self.phase {
            BlinkPhase::Open => 0.0,
            BlinkPhase::Closing => t(self.config.blink.closing),
            BlinkPhase::Closed => 1.0,
            BlinkPhase::Opening => 1.0 - t(self.config.blink.opening),
        }
    }

    /// Smoothed gaze plus micro-saccade offset, clamped
    pub fn gaze(&self) -> (f32, f32) {
        (
            (self.smoothed.0 + self.saccade_offset.0).clamp(-1.0, 1.0),
            (self.smoothed.1 + self.saccade_offset.1).clamp(-1.0, 1.0),
        )
    }

    pub fn target(&self) -> GazeTarget {
        self.target
    }

    pub fn config(&self) -> &EyeConfig {
        &self.config
    }
}
