//! Easing curves for weight transitions

use serde::{Deserialize, Serialize};

/// Damping of the spring curve (higher settles faster)
const SPRING_DAMPING: f32 = 6.0;
/// Angular frequency of the spring curve, in radians over the unit interval
const SPRING_FREQUENCY: f32 = 9.0;

/// Curve applied to linear transition progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseCurve {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    /// Under-damped spring. May exceed 1.0 mid-transition but lands exactly on 1.0.
    Spring,
}

impl EaseCurve {
    /// Evaluate at progress `t`, clamped to [0, 1].
    ///
    /// Every curve returns exactly 0.0 at t = 0 and exactly 1.0 at t = 1.
    #[inline]
    pub fn evaluate(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t >= 1.0 {
            return 1.0;
        }

        match self {
            EaseCurve::Linear => t,
            EaseCurve::EaseIn => t * t,
            EaseCurve::EaseOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            EaseCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
            EaseCurve::Spring => {
                1.0 - (-SPRING_DAMPING * t).exp() * (SPRING_FREQUENCY * t).cos()
            }
        }
    }

    /// Whether the curve can leave [0, 1] mid-transition
    pub fn overshoots(self) -> bool {
        matches!(self, EaseCurve::Spring)
    }

    pub fn from_name(name: &str) -> Option<EaseCurve> {
        match name.to_lowercase().as_str() {
            "linear" => Some(EaseCurve::Linear),
            "easein" | "ease_in" | "ease-in" => Some(EaseCurve::EaseIn),
            "easeout" | "ease_out" | "ease-out" => Some(EaseCurve::EaseOut),
            "easeinout" | "ease_in_out" | "ease-in-out" => Some(EaseCurve::EaseInOut),
            "spring" => Some(EaseCurve::Spring),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EaseCurve; 5] = [
        EaseCurve::Linear,
        EaseCurve::EaseIn,
        EaseCurve::EaseOut,
        EaseCurve::EaseInOut,
        EaseCurve::Spring,
    ];

    #[test]
    fn test_endpoints_exact() {
        for curve in ALL {
            assert_eq!(curve.evaluate(0.0), 0.0, "{curve:?} at 0");
            assert_eq!(curve.evaluate(1.0), 1.0, "{curve:?} at 1");
        }
    }

    #[test]
    fn test_input_clamping() {
        for curve in ALL {
            assert_eq!(curve.evaluate(-0.5), 0.0);
            assert_eq!(curve.evaluate(1.5), 1.0);
            assert_eq!(curve.evaluate(f32::NAN), 0.0);
        }
    }

    #[test]
    fn test_non_spring_curves_stay_in_unit_range() {
        for curve in ALL.into_iter().filter(|c| !c.overshoots()) {
            let mut last = 0.0;
            for step in 0..=100 {
                let v = curve.evaluate(step as f32 / 100.0);
                assert!((0.0..=1.0).contains(&v));
                assert!(v >= last, "{curve:?} must be monotonic");
                last = v;
            }
        }
    }

    #[test]
    fn test_shapes() {
        assert_eq!(EaseCurve::EaseIn.evaluate(0.5), 0.25);
        assert_eq!(EaseCurve::EaseOut.evaluate(0.5), 0.75);
        assert_eq!(EaseCurve::EaseInOut.evaluate(0.5), 0.5);
    }

    #[test]
    fn test_spring_overshoots() {
        let peak = (0..100)
            .map(|i| EaseCurve::Spring.evaluate(i as f32 / 100.0))
            .fold(0.0, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(EaseCurve::from_name("easeInOut"), Some(EaseCurve::EaseInOut));
        assert_eq!(EaseCurve::from_name("ease-out"), Some(EaseCurve::EaseOut));
        assert_eq!(EaseCurve::from_name("bounce"), None);
    }
}
