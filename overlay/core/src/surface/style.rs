//! Badge color styles
//!
//! Both styles are pure functions of elapsed time (and row position), so a
//! badge's colors can be sampled at any frame without extra state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Rgba;

/// Seven-color rainbow used by the gradient style
pub const RAINBOW_PALETTE: [Rgba; 7] = [
    Rgba::from_rgb(0xFF0000),
    Rgba::from_rgb(0xFF8000),
    Rgba::from_rgb(0xFFFF00),
    Rgba::from_rgb(0x00FF00),
    Rgba::from_rgb(0x00FFFF),
    Rgba::from_rgb(0x0000FF),
    Rgba::from_rgb(0x8000FF),
];

/// Translucent black behind gradient badges (70% opaque)
pub const BADGE_BACKGROUND: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 179,
};

const GRADIENT_CYCLE: Duration = Duration::from_millis(2000);
const RAINBOW_CYCLE: Duration = Duration::from_millis(5000);
const RAINBOW_SPREAD: f32 = 0.7;
const HUE_STEP_DEGREES: f32 = 15.0;
const HUE_STEPS: usize = 24;

/// How badges are colored
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStyle {
    /// Rainbow gradient text on a translucent dark pill
    #[default]
    Gradient,
    /// Glowing text whose hue flows down the list
    Rainbow,
}

impl std::str::FromStr for BadgeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradient" => Ok(Self::Gradient),
            "rainbow" => Ok(Self::Rainbow),
            other => Err(format!("unknown badge style '{other}'")),
        }
    }
}

/// Position within a repeating cycle, in `0.0..1.0`
#[allow(clippy::cast_precision_loss)]
fn cycle_phase(elapsed: Duration, cycle: Duration) -> f32 {
    let cycle_ms = cycle.as_millis().max(1);
    let within = elapsed.as_millis() % cycle_ms;
    within as f32 / cycle_ms as f32
}

/// Three consecutive palette colors, shifting one step every 2/7 s
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn gradient_stops(elapsed: Duration) -> [Rgba; 3] {
    let len = RAINBOW_PALETTE.len();
    let offset = cycle_phase(elapsed, GRADIENT_CYCLE) * len as f32;
    let first = offset as usize % len;

    [
        RAINBOW_PALETTE[first],
        RAINBOW_PALETTE[(first + 1) % len],
        RAINBOW_PALETTE[(first + 2) % len],
    ]
}

/// Hue for `row` of `total` rows, flowing with time
///
/// Rows are spread over 70% of the hue ramp so the top and bottom of the list
/// never share a color.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rainbow_color(elapsed: Duration, row: usize, total: usize) -> Rgba {
    let row_ratio = row as f32 / total.saturating_sub(1).max(1) as f32;
    let position = (cycle_phase(elapsed, RAINBOW_CYCLE) + row_ratio * RAINBOW_SPREAD) % 1.0;
    Rgba::from_hsv(hue_on_ramp(position), 1.0, 1.0)
}

/// Interpolate along the 24-step hue ramp (0 to 345 degrees)
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn hue_on_ramp(position: f32) -> f32 {
    let scaled = position.clamp(0.0, 1.0) * (HUE_STEPS - 1) as f32;
    let index = scaled as usize;
    let fract = scaled - scaled.floor();

    let hue_at = |step: usize| (step % HUE_STEPS) as f32 * HUE_STEP_DEGREES;
    let from = hue_at(index);
    let to = hue_at(index + 1);

    let delta = match to - from {
        d if d > 180.0 => d - 360.0,
        d if d < -180.0 => d + 360.0,
        d => d,
    };
    (from + fract * delta).rem_euclid(360.0)
}
