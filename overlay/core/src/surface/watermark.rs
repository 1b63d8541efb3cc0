//! Watermark Surface
//!
//! A title line plus optional user text, pinned to a screen corner. There
//! is no queue behind it: while enabled it never reports itself empty, so
//! the window stays up until it is dismissed or the watermark is turned off.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{FrameRow, OverlaySurface, Rgba, SurfaceFrame, SurfaceId};
use crate::animation::AnimationParams;
use crate::layout::{Anchor, LayoutDescriptor};
use crate::lifecycle::RenderScope;
use crate::queue::ItemId;

/// Longest user text kept, in characters
pub const WATERMARK_TEXT_LIMIT: usize = 20;

/// Accepted text sizes in logical pixels
pub const WATERMARK_TEXT_SIZES: RangeInclusive<u16> = 5..=300;

/// One full hue turn of the rainbow mode (0.1 degree per millisecond)
const RAINBOW_HUE_CYCLE: Duration = Duration::from_millis(3600);

const SHADOW_COLOR: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 38,
};

/// Tuning for the watermark
#[derive(Clone, Debug, PartialEq)]
pub struct WatermarkSettings {
    /// Whether the watermark may be shown
    pub enabled: bool,
    /// First line, always drawn
    pub title: String,
    /// Second line, drawn when not blank
    pub text: String,
    /// Text color when the rainbow mode is off
    pub color: Rgba,
    /// Text size in logical pixels
    pub text_size: u16,
    /// Opacity in percent
    pub opacity: u8,
    /// Cycle the hue instead of using `color`
    pub rainbow: bool,
    /// Draw a faint drop shadow
    pub shadow: bool,
    /// Screen position
    pub position: Anchor,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Lumina".to_string(),
            text: String::new(),
            color: Rgba::from_rgb(0xFF_FF_FF),
            text_size: 28,
            opacity: 100,
            rainbow: false,
            shadow: false,
            position: Anchor::Center,
        }
    }
}

impl WatermarkSettings {
    /// Clamp every value into its accepted range
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.text = truncate(&self.text);
        self.text_size = clamp_text_size(self.text_size);
        self.opacity = self.opacity.min(100);
        self
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(WATERMARK_TEXT_LIMIT).collect()
}

fn clamp_text_size(size: u16) -> u16 {
    size.clamp(*WATERMARK_TEXT_SIZES.start(), *WATERMARK_TEXT_SIZES.end())
}

/// Persistent branding overlay
#[derive(Debug)]
pub struct WatermarkSurface {
    settings: WatermarkSettings,
    row: ItemId,
}

impl WatermarkSurface {
    /// Create the surface; out-of-range settings are clamped
    #[must_use]
    pub fn new(settings: WatermarkSettings) -> Self {
        Self {
            settings: settings.normalized(),
            row: ItemId::next(),
        }
    }

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &WatermarkSettings {
        &self.settings
    }

    /// Whether the watermark may be shown
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Allow or forbid showing the watermark
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Replace the user text, keeping at most [`WATERMARK_TEXT_LIMIT`] characters
    pub fn set_text(&mut self, text: &str) {
        let text = truncate(text);
        if text != self.settings.text {
            debug!(text = %text, "Watermark text changed");
            self.settings.text = text;
        }
    }

    /// Change the fixed text color
    pub fn set_color(&mut self, color: Rgba) {
        self.settings.color = color;
    }

    /// Change the text size, clamped to [`WATERMARK_TEXT_SIZES`]
    pub fn set_text_size(&mut self, size: u16) {
        self.settings.text_size = clamp_text_size(size);
    }

    /// Change the opacity, clamped to 100 percent
    pub fn set_opacity(&mut self, percent: u8) {
        self.settings.opacity = percent.min(100);
    }

    /// Turn hue cycling on or off
    pub fn set_rainbow(&mut self, rainbow: bool) {
        self.settings.rainbow = rainbow;
    }

    /// Turn the drop shadow on or off
    pub fn set_shadow(&mut self, shadow: bool) {
        self.settings.shadow = shadow;
    }

    /// Move the watermark; takes effect on the next attach
    pub fn set_position(&mut self, position: Anchor) {
        self.settings.position = position;
    }

    /// Text color `elapsed` after the window was attached
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn text_color(&self, elapsed: Duration) -> Rgba {
        let base = if self.settings.rainbow {
            let cycle_ms = RAINBOW_HUE_CYCLE.as_millis();
            let hue = (elapsed.as_millis() % cycle_ms) as f32 / 10.0;
            Rgba::from_hsv(hue, 1.0, 1.0)
        } else {
            self.settings.color
        };
        base.with_alpha(f32::from(self.settings.opacity) / 100.0)
    }
}

impl OverlaySurface for WatermarkSurface {
    fn identity(&self) -> SurfaceId {
        SurfaceId::watermark()
    }

    fn layout(&self) -> LayoutDescriptor {
        LayoutDescriptor::watermark(self.settings.position)
    }

    fn advance(&mut self, _now: Instant) -> bool {
        false
    }

    fn compose(&mut self, now: Instant, scope: RenderScope<'_>) -> SurfaceFrame {
        let elapsed = now.saturating_duration_since(scope.context.attached_at());
        let detail = Some(self.settings.text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let row = FrameRow {
            item: self.row,
            text: self.settings.title.clone(),
            detail,
            params: AnimationParams::SHOWN,
            progress: None,
            colors: vec![self.text_color(elapsed)],
            background: None,
            text_size: Some(self.settings.text_size),
            shadow: self.settings.shadow.then_some(SHADOW_COLOR),
        };

        SurfaceFrame {
            surface: self.identity(),
            sequence: scope.context.frames_rendered(),
            rows: vec![row],
        }
    }

    fn is_empty(&self) -> bool {
        !self.settings.enabled
    }

    fn is_animating(&self) -> bool {
        self.settings.enabled && self.settings.rainbow
    }

    fn empty_grace(&self) -> Duration {
        Duration::ZERO
    }
}
