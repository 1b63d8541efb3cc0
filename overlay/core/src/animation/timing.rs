//! Easing Curves
//!
//! Frame-rate independent interpolation helpers. Every curve maps a progress
//! value in `0.0..=1.0` onto an eased value in the same range.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Easing functions for exit and entry interpolation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// Cubic ease out
    #[default]
    EaseOutCubic,

    /// Cubic ease in and out (closest match to a fast-out/slow-in curve)
    EaseInOutCubic,
}

impl EasingFunction {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Fraction of `total` covered by `elapsed`, clamped to `0.0..=1.0`
///
/// A zero-length window counts as already complete.
#[must_use]
pub fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

/// Linear interpolation between `from` and `to`
#[must_use]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [EasingFunction::EaseOutCubic, EasingFunction::EaseInOutCubic] {
            assert!(easing.apply(0.0).abs() < 1e-5, "{easing:?} should start at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{easing:?} should end at 1");
        }
    }

    #[test]
    fn test_easing_clamps_input() {
        assert_eq!(EasingFunction::EaseOutCubic.apply(-1.0), 0.0);
        assert_eq!(EasingFunction::EaseInOutCubic.apply(2.0), 1.0);
    }

    #[test]
    fn test_easing_curve_shapes() {
        // Ease-out is past the midpoint early; ease-in-out is symmetric
        assert!(EasingFunction::EaseOutCubic.apply(0.5) > 0.8);
        assert!((EasingFunction::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-5);
        assert!(EasingFunction::EaseInOutCubic.apply(0.25) < 0.25);
    }

    #[test]
    fn test_only_cubic_curves_deserialize() {
        let curve: EasingFunction = serde_json::from_str("\"ease_in_out_cubic\"").unwrap();
        assert_eq!(curve, EasingFunction::EaseInOutCubic);
        assert!(serde_json::from_str::<EasingFunction>("\"linear\"").is_err());
    }

    #[test]
    fn test_progress() {
        let total = Duration::from_millis(300);
        assert_eq!(progress(Duration::ZERO, total), 0.0);
        assert!((progress(Duration::from_millis(150), total) - 0.5).abs() < 1e-5);
        assert_eq!(progress(Duration::from_millis(900), total), 1.0);
        assert_eq!(progress(Duration::from_millis(5), Duration::ZERO), 1.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 200.0, 0.5), 100.0);
        assert_eq!(lerp(1.0, 0.8, 0.0), 1.0);
    }
}
