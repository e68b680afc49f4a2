//! Clocks for wall-clock anchored playback
//!
//! Lip sync follows the audio, which plays in real time. Playback position is
//! read from a clock rather than accumulated from frame deltas, so dropped or
//! uneven frames never drift the mouth away from the voice.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source
/// INVARIANT: `now()` never decreases
pub trait Clock: Send + Sync {
    /// Time since the clock's origin
    fn now(&self) -> Duration;
}

/// Real monotonic clock backed by `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for simulations and tests.
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(delta);
    }

    /// Negative, NaN or unrepresentable deltas are ignored
    pub fn advance_secs(&self, secs: f32) {
        if let Ok(delta) = Duration::try_from_secs_f32(secs) {
            self.advance(delta);
        }
    }

    /// Jump to an absolute time. Earlier times are ignored.
    pub fn set(&self, time: Duration) {
        let mut now = self.now.lock();
        if time > *now {
            *now = time;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
