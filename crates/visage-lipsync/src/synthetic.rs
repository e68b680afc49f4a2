//! Synthetic talking cycle for speech without viseme timing

use std::f32::consts::PI;

/// Open/close cycle parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticConfig {
    /// Seconds per open/close/open period
    pub period: f32,
    /// Jaw intensity at the closed point
    pub floor: f32,
    /// Added intensity at the open point
    pub depth: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            period: 0.3,
            floor: 0.15,
            depth: 0.45,
        }
    }
}

/// Fixed rhythmic mouth motion
#[derive(Debug, Clone)]
pub struct SyntheticMouth {
    config: SyntheticConfig,
    t: f32,
}

impl SyntheticMouth {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config, t: 0.0 }
    }

    pub fn reset(&mut self) {
        self.t = 0.0;
    }

    /// Advance and return the open intensity
    pub fn advance(&mut self, dt: f32) -> f32 {
        let period = self.config.period.max(0.01);
        self.t = (self.t + dt.max(0.0)) % period;
        let open = (2.0 * PI * self.t / period).sin().abs();
        (self.config.floor + self.config.depth * open).clamp(0.0, 1.0)
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_stays_in_band() {
        let mut mouth = SyntheticMouth::new(SyntheticConfig::default());
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for _ in 0..200 {
            let v = mouth.advance(0.016);
            lo = lo.min(v);
            hi = hi.max(v);
        }
        assert!(lo >= 0.15 - 1e-6);
        assert!(hi <= 0.6 + 1e-6);
        assert!(hi - lo > 0.3);
    }
}
