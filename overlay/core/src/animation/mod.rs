//! Animation State Machine
//!
//! Every queued overlay item walks the same four-state lifecycle. Visual
//! parameters are a pure function of the current state and the time spent in
//! it, so a renderer can sample them at any frame without keeping its own
//! animation state.
//!
//! # Architecture
//!
//! ```text
//!   insert            entry slot reached       hold elapsed / marked
//! ─────────► Pending ──────────────────► Visible ─────────────────► Exiting
//!               │                                                     │
//!               └──────────────── marked ───────────────────────────► │
//!                                                                     │ exit elapsed
//!                                                                     ▼
//!                                                                  Removed
//! ```
//!
//! `Removed` is terminal: the owning queue deletes the item once it is seen
//! there.

mod timing;

pub use timing::{lerp, progress, EasingFunction};

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// States
// ============================================================================

/// Lifecycle state of one queued item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    /// Inserted, waiting for its entry slot
    Pending,
    /// Fully shown
    Visible,
    /// Playing the exit animation
    Exiting,
    /// Exit finished; the owning queue deletes the item
    Removed,
}

impl AnimationState {
    /// Whether the item has not started leaving yet
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Visible)
    }

    /// Short lowercase label used in logs and status output
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Visible => "visible",
            Self::Exiting => "exiting",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Timing and Style
// ============================================================================

/// Durations that drive state transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationTiming {
    /// Delay between the entry slots of consecutively inserted items
    pub entry_stagger: Duration,
    /// Time spent `Visible` before exiting on its own; `None` holds forever
    pub hold: Option<Duration>,
    /// Length of the exit animation
    pub exit: Duration,
}

impl AnimationTiming {
    /// Transient notification cards: staggered entry, 2 s hold, 300 ms exit
    #[must_use]
    pub const fn notification() -> Self {
        Self {
            entry_stagger: Duration::from_millis(50),
            hold: Some(Duration::from_millis(2000)),
            exit: Duration::from_millis(300),
        }
    }

    /// Persistent badges: staggered entry, held until hidden, 300 ms exit
    #[must_use]
    pub const fn badge() -> Self {
        Self {
            entry_stagger: Duration::from_millis(50),
            hold: None,
            exit: Duration::from_millis(300),
        }
    }
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self::notification()
    }
}

/// Shape of the slide/fade/scale animation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationStyle {
    /// Horizontal travel in logical pixels (enters from `-d`, exits to `+d`)
    pub slide_distance: f32,
    /// Scale while waiting to enter
    pub hidden_scale: f32,
    /// Scale reached at the end of the exit
    pub exit_scale: f32,
    /// Curve for offset and scale during the exit
    pub easing: EasingFunction,
}

impl AnimationStyle {
    /// Notification cards slide in at full size and shrink while leaving
    #[must_use]
    pub const fn notification() -> Self {
        Self {
            slide_distance: 200.0,
            hidden_scale: 1.0,
            exit_scale: 0.8,
            easing: EasingFunction::EaseInOutCubic,
        }
    }

    /// Badges grow in from 80% and shrink back out
    #[must_use]
    pub const fn badge() -> Self {
        Self {
            slide_distance: 200.0,
            hidden_scale: 0.8,
            exit_scale: 0.8,
            easing: EasingFunction::EaseOutCubic,
        }
    }
}

impl Default for AnimationStyle {
    fn default() -> Self {
        Self::notification()
    }
}

// ============================================================================
// Visual Parameters
// ============================================================================

/// Visual parameters sampled for one frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnimationParams {
    /// Horizontal offset in logical pixels
    pub offset_x: f32,
    /// Opacity in `0.0..=1.0`
    pub opacity: f32,
    /// Uniform scale factor
    pub scale: f32,
}

impl AnimationParams {
    /// Fully shown, at rest
    pub const SHOWN: Self = Self {
        offset_x: 0.0,
        opacity: 1.0,
        scale: 1.0,
    };

    /// Parameters for a state that does not depend on elapsed time
    ///
    /// `Exiting` has no resting value; it reports where the exit ends.
    #[must_use]
    pub fn resting(state: AnimationState, style: &AnimationStyle) -> Self {
        match state {
            AnimationState::Pending => Self {
                offset_x: -style.slide_distance,
                opacity: 0.0,
                scale: style.hidden_scale,
            },
            AnimationState::Visible => Self::SHOWN,
            AnimationState::Exiting | AnimationState::Removed => Self {
                offset_x: style.slide_distance,
                opacity: 0.0,
                scale: style.exit_scale,
            },
        }
    }

    /// Sample the parameters of an item
    ///
    /// `exit_from` is where the exit started; it only matters while
    /// `Exiting`. Opacity fades linearly, offset and scale follow the style's
    /// easing curve.
    #[must_use]
    pub fn sample(
        state: AnimationState,
        elapsed_in_state: Duration,
        exit_from: Self,
        timing: &AnimationTiming,
        style: &AnimationStyle,
    ) -> Self {
        if state != AnimationState::Exiting {
            return Self::resting(state, style);
        }

        let t = progress(elapsed_in_state, timing.exit);
        let eased = style.easing.apply(t);
        let target = Self::resting(AnimationState::Removed, style);

        Self {
            offset_x: lerp(exit_from.offset_x, target.offset_x, eased),
            opacity: lerp(exit_from.opacity, target.opacity, t),
            scale: lerp(exit_from.scale, target.scale, eased),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resting_params() {
        let style = AnimationStyle::notification();

        let pending = AnimationParams::resting(AnimationState::Pending, &style);
        assert_eq!(pending.offset_x, -200.0);
        assert_eq!(pending.opacity, 0.0);

        assert_eq!(
            AnimationParams::resting(AnimationState::Visible, &style),
            AnimationParams::SHOWN
        );

        let removed = AnimationParams::resting(AnimationState::Removed, &style);
        assert_eq!(removed.offset_x, 200.0);
        assert_eq!(removed.scale, 0.8);
    }

    #[test]
    fn test_exit_sample_moves_toward_removed() {
        let timing = AnimationTiming::notification();
        let style = AnimationStyle::notification();

        let start = AnimationParams::sample(
            AnimationState::Exiting,
            Duration::ZERO,
            AnimationParams::SHOWN,
            &timing,
            &style,
        );
        assert_eq!(start, AnimationParams::SHOWN);

        let half = AnimationParams::sample(
            AnimationState::Exiting,
            Duration::from_millis(150),
            AnimationParams::SHOWN,
            &timing,
            &style,
        );
        assert!((half.opacity - 0.5).abs() < 1e-4);
        assert!(half.offset_x > 0.0 && half.offset_x < 200.0);
        assert!(half.scale < 1.0 && half.scale > 0.8);

        let end = AnimationParams::sample(
            AnimationState::Exiting,
            Duration::from_millis(300),
            AnimationParams::SHOWN,
            &timing,
            &style,
        );
        assert!((end.offset_x - 200.0).abs() < 1e-3);
        assert!(end.opacity.abs() < 1e-5);
    }

    #[test]
    fn test_exit_from_pending_stays_invisible() {
        let timing = AnimationTiming::badge();
        let style = AnimationStyle::badge();
        let from = AnimationParams::resting(AnimationState::Pending, &style);

        let mid = AnimationParams::sample(
            AnimationState::Exiting,
            Duration::from_millis(100),
            from,
            &timing,
            &style,
        );
        assert_eq!(mid.opacity, 0.0);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(AnimationState::Pending.to_string(), "pending");
        assert!(AnimationState::Visible.is_live());
        assert!(!AnimationState::Exiting.is_live());
    }
}
