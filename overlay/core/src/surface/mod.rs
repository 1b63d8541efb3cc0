//! Overlay Surfaces
//!
//! A surface is one window's worth of queued, animated content. The UI
//! scheduler drives every surface through the same [`OverlaySurface`] trait:
//! advance the queue, compose a frame if anything moved, and report when it
//! has gone empty so the window can be dismissed.
//!
//! Three surfaces ship with the engine:
//!
//! - [`NotificationSurface`] - short-lived enable/disable cards
//! - [`ModuleBadgeSurface`] - persistent list of enabled module names
//! - [`WatermarkSurface`] - branding text, shown and dismissed explicitly

mod frame;
mod module_badge;
mod notification;
mod style;
mod watermark;

pub use frame::{FrameRow, Rgba, SurfaceFrame};
pub use module_badge::{Badge, BadgeSettings, DisplayCase, ModuleBadgeSurface};
pub use notification::{ModuleAction, Notification, NotificationSettings, NotificationSurface};
pub use style::{gradient_stops, rainbow_color, BadgeStyle, BADGE_BACKGROUND, RAINBOW_PALETTE};
pub use watermark::{
    WatermarkSettings, WatermarkSurface, WATERMARK_TEXT_LIMIT, WATERMARK_TEXT_SIZES,
};

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::layout::LayoutDescriptor;
use crate::lifecycle::RenderScope;

/// Stable identity of an overlay surface
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(String);

impl SurfaceId {
    /// Identity from an arbitrary name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The notification card surface
    #[must_use]
    pub fn notifications() -> Self {
        Self::new("notifications")
    }

    /// The module badge list surface
    #[must_use]
    pub fn module_badges() -> Self {
        Self::new("module-badges")
    }

    /// The watermark surface
    #[must_use]
    pub fn watermark() -> Self {
        Self::new("watermark")
    }

    /// Name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Content source for one overlay window
pub trait OverlaySurface: Send {
    /// Identity used with the registry
    fn identity(&self) -> SurfaceId;

    /// Requested window placement
    fn layout(&self) -> LayoutDescriptor;

    /// Apply due state transitions; returns `true` if anything changed
    fn advance(&mut self, now: Instant) -> bool;

    /// Build the frame for `now`
    fn compose(&mut self, now: Instant, scope: RenderScope<'_>) -> SurfaceFrame;

    /// Whether nothing is left to show
    fn is_empty(&self) -> bool;

    /// Whether frames change with time alone (no state transition needed)
    fn is_animating(&self) -> bool;

    /// How long the surface may sit empty before its window is dismissed
    fn empty_grace(&self) -> Duration;
}
