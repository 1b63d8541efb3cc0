//! Frames delivered to the host

use serde::{Deserialize, Serialize};

use super::SurfaceId;
use crate::animation::AnimationParams;
use crate::queue::ItemId;

/// 8-bit RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba {
    /// Opaque color from a packed `0xRRGGBB` value
    #[must_use]
    pub const fn from_rgb(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
            a: 0xFF,
        }
    }

    /// Same color with alpha replaced by `alpha` in `0.0..=1.0`
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: unit_to_byte(alpha),
            ..self
        }
    }

    /// Color from hue in degrees, saturation and value in `0.0..=1.0`
    #[must_use]
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let value = value.clamp(0.0, 1.0);

        let chroma = value * saturation;
        let sector = hue / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let m = value - chroma;

        let (r, g, b) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        Self {
            r: unit_to_byte(r + m),
            g: unit_to_byte(g + m),
            b: unit_to_byte(b + m),
            a: 0xFF,
        }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional)
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return None;
        }
        let byte = |at: usize| u8::from_str_radix(&digits[at..at + 2], 16).ok();
        Some(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if digits.len() == 8 { byte(6)? } else { 0xFF },
        })
    }

    /// Packed `#RRGGBBAA` string
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_byte(unit: f32) -> u8 {
    (unit.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// One rendered item
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameRow {
    /// Source item
    pub item: ItemId,
    /// Primary text
    pub text: String,
    /// Secondary text
    pub detail: Option<String>,
    /// Animation parameters at render time
    pub params: AnimationParams,
    /// Remaining-time bar in `0.0..=1.0`, if the row shows one
    pub progress: Option<f32>,
    /// Foreground colors (a single color or gradient stops)
    pub colors: Vec<Rgba>,
    /// Background fill
    pub background: Option<Rgba>,
    /// Text size in logical pixels, when the surface sets one
    pub text_size: Option<u16>,
    /// Drop shadow color
    pub shadow: Option<Rgba>,
}

/// Complete content of a surface for one frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SurfaceFrame {
    /// Surface the frame belongs to
    pub surface: SurfaceId,
    /// Frame number within the current attach cycle
    pub sequence: u64,
    /// Rows, top to bottom
    pub rows: Vec<FrameRow>,
}

impl SurfaceFrame {
    /// Frame with no rows
    #[must_use]
    pub fn empty(surface: SurfaceId, sequence: u64) -> Self {
        Self {
            surface,
            sequence,
            rows: Vec::new(),
        }
    }
}
