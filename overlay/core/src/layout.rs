//! Layout Descriptors
//!
//! Placement requests handed to the host when a surface is presented. A
//! descriptor states what the surface would like; [`LayoutDescriptor::resolve`]
//! narrows it to what the host can actually honour.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::HostCapabilities;

/// Screen corner (or center) a surface is pinned to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Top-left in left-to-right locales
    TopStart,
    /// Top-right in left-to-right locales
    TopEnd,
    /// Bottom-left in left-to-right locales
    BottomStart,
    /// Bottom-right in left-to-right locales
    BottomEnd,
    /// Screen center
    Center,
}

impl std::str::FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "top_start" | "top_left" => Ok(Self::TopStart),
            "top_end" | "top_right" => Ok(Self::TopEnd),
            "bottom_start" | "bottom_left" => Ok(Self::BottomStart),
            "bottom_end" | "bottom_right" => Ok(Self::BottomEnd),
            "center" => Ok(Self::Center),
            other => Err(format!("unknown anchor '{other}'")),
        }
    }
}

/// How the surface is sized
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    /// Shrink to the content
    WrapContent,
    /// Fill the screen
    MatchParent,
    /// Fixed size in logical pixels
    Fixed {
        /// Width
        width: u32,
        /// Height
        height: u32,
    },
}

/// Window layer the surface is placed on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowLayer {
    /// Regular application overlay layer
    ApplicationOverlay,
    /// Overlay the host treats as trusted (drawn above other overlays)
    TrustedOverlay,
}

/// Placement request for one overlay surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    /// Anchor corner
    pub anchor: Anchor,
    /// Horizontal inset from the anchor in logical pixels
    pub offset_x: i32,
    /// Vertical inset from the anchor in logical pixels
    pub offset_y: i32,
    /// Sizing mode
    pub size: SizeMode,
    /// Requested window layer
    pub layer: WindowLayer,
    /// Window may take keyboard focus
    pub focusable: bool,
    /// Window receives touches inside its bounds
    pub touchable: bool,
    /// Let input fall through to whatever is below
    pub input_transparent: bool,
}

impl LayoutDescriptor {
    /// Notification cards: bottom-end corner, 20px inset, click-through
    #[must_use]
    pub fn notification() -> Self {
        Self {
            anchor: Anchor::BottomEnd,
            offset_x: 20,
            offset_y: 20,
            size: SizeMode::WrapContent,
            layer: WindowLayer::TrustedOverlay,
            focusable: false,
            touchable: false,
            input_transparent: true,
        }
    }

    /// Module badge list: top-end corner, tight inset, never takes input
    #[must_use]
    pub fn module_badges() -> Self {
        Self {
            anchor: Anchor::TopEnd,
            offset_x: 3,
            offset_y: 2,
            size: SizeMode::WrapContent,
            layer: WindowLayer::TrustedOverlay,
            focusable: false,
            touchable: false,
            input_transparent: false,
        }
    }

    /// Watermark pinned to `anchor` with a 16px margin
    #[must_use]
    pub fn watermark(anchor: Anchor) -> Self {
        Self {
            anchor,
            offset_x: 16,
            offset_y: 16,
            size: SizeMode::WrapContent,
            layer: WindowLayer::ApplicationOverlay,
            focusable: false,
            touchable: false,
            input_transparent: false,
        }
    }

    /// Narrow the request to what `caps` supports
    ///
    /// Unsupported options degrade instead of failing: a trusted layer falls
    /// back to the application overlay layer, and a window that cannot be
    /// input transparent becomes non-focusable and non-touchable instead.
    #[must_use]
    pub fn resolve(&self, caps: &HostCapabilities) -> Self {
        let mut resolved = self.clone();

        if resolved.layer == WindowLayer::TrustedOverlay && !caps.trusted_overlay {
            debug!("Host lacks trusted overlays, falling back to application layer");
            resolved.layer = WindowLayer::ApplicationOverlay;
        }

        if resolved.input_transparent && !caps.input_transparency {
            debug!("Host cannot pass input through overlays, blocking focus and touch");
            resolved.input_transparent = false;
            resolved.focusable = false;
            resolved.touchable = false;
        }

        resolved
    }
}
