//! Notification Surface
//!
//! Short-lived cards announcing that a module was enabled or disabled. Cards
//! are keyed by module name plus action, so toggling a module off and on again
//! shows two cards while repeated identical toggles collapse into one.
//!
//! Each card enters on its stagger slot, holds, then slides out on its own.
//! The queue is bounded; a full queue drops its oldest card.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FrameRow, OverlaySurface, Rgba, SurfaceFrame, SurfaceId};
use crate::animation::{progress, AnimationStyle, AnimationTiming};
use crate::layout::LayoutDescriptor;
use crate::lifecycle::RenderScope;
use crate::queue::{AnimatedItem, BoundedQueueStore, Capacity, ItemId, StoreError};

const ENABLED_ACCENT: Rgba = Rgba::from_rgb(0x4CAF50);
const DISABLED_ACCENT: Rgba = Rgba::from_rgb(0xF44336);
const CARD_BACKGROUND: Rgba = Rgba {
    r: 0x1E,
    g: 0x1E,
    b: 0x1E,
    a: 242,
};

/// What happened to a module
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModuleAction {
    /// Module switched on
    Enable,
    /// Module switched off
    Disable,
}

impl ModuleAction {
    /// Action matching a toggle's new state
    #[must_use]
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enable
        } else {
            Self::Disable
        }
    }

    /// Key suffix (`ENABLE` / `DISABLE`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "ENABLE",
            Self::Disable => "DISABLE",
        }
    }

    /// Text shown on the card
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Enable => "Enabled",
            Self::Disable => "Disabled",
        }
    }
}

impl fmt::Display for ModuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of one notification card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Module display name
    pub module_name: String,
    /// What happened
    pub action: ModuleAction,
}

impl Notification {
    /// Card for `module_name`
    #[must_use]
    pub fn new(module_name: impl Into<String>, action: ModuleAction) -> Self {
        Self {
            module_name: module_name.into(),
            action,
        }
    }

    /// Dedup key: `"<name>-ENABLE"` or `"<name>-DISABLE"`
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}", self.module_name, self.action.as_str())
    }
}

/// Tuning for the notification surface
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationSettings {
    /// Maximum cards on screen
    pub capacity: usize,
    /// Entry stagger, hold and exit durations
    pub timing: AnimationTiming,
    /// Length of the countdown bar
    pub progress: Duration,
    /// Time the window stays up after the last card leaves
    pub empty_grace: Duration,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            capacity: 3,
            timing: AnimationTiming::notification(),
            progress: Duration::from_millis(2500),
            empty_grace: Duration::from_millis(100),
        }
    }
}

/// Bounded queue of enable/disable cards
#[derive(Debug)]
pub struct NotificationSurface {
    settings: NotificationSettings,
    store: BoundedQueueStore<Notification>,
}

impl NotificationSurface {
    /// Create the surface
    ///
    /// # Errors
    ///
    /// [`StoreError::ZeroCapacity`] if `settings.capacity` is zero.
    pub fn new(settings: NotificationSettings) -> Result<Self, StoreError> {
        let capacity = Capacity::bounded(settings.capacity)?;
        let store =
            BoundedQueueStore::new(capacity, settings.timing, AnimationStyle::notification());
        Ok(Self { settings, store })
    }

    /// Queue a card; `None` if an identical card is already showing
    pub fn push(&mut self, notification: Notification, now: Instant) -> Option<ItemId> {
        let key = notification.key();
        let id = self.store.insert(key.clone(), notification, now).map(AnimatedItem::id)?;
        debug!(key = %key, item_id = %id, queued = self.store.len(), "Queued notification");
        Some(id)
    }

    /// Queue an "Enabled" card
    pub fn on_module_enabled(&mut self, module_name: &str, now: Instant) -> Option<ItemId> {
        self.push(Notification::new(module_name, ModuleAction::Enable), now)
    }

    /// Queue a "Disabled" card
    pub fn on_module_disabled(&mut self, module_name: &str, now: Instant) -> Option<ItemId> {
        self.push(Notification::new(module_name, ModuleAction::Disable), now)
    }

    /// Underlying queue
    #[must_use]
    pub fn store(&self) -> &BoundedQueueStore<Notification> {
        &self.store
    }

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    /// Remaining share of the countdown bar, counted from the card's entry slot
    fn remaining(&self, item: &AnimatedItem<Notification>, now: Instant) -> f32 {
        let shown_for = now.saturating_duration_since(item.visible_at());
        1.0 - progress(shown_for, self.settings.progress)
    }
}

impl OverlaySurface for NotificationSurface {
    fn identity(&self) -> SurfaceId {
        SurfaceId::notifications()
    }

    fn layout(&self) -> LayoutDescriptor {
        LayoutDescriptor::notification()
    }

    fn advance(&mut self, now: Instant) -> bool {
        let changes = self.store.advance(now);
        let removed = self.store.collect_removed();
        for item in &removed {
            debug!(key = %item.key(), item_id = %item.id(), "Notification finished");
        }
        !changes.is_empty() || !removed.is_empty()
    }

    fn compose(&mut self, now: Instant, scope: RenderScope<'_>) -> SurfaceFrame {
        let rows = self
            .store
            .iter()
            .map(|item| {
                let notification = item.payload();
                let accent = match notification.action {
                    ModuleAction::Enable => ENABLED_ACCENT,
                    ModuleAction::Disable => DISABLED_ACCENT,
                };
                FrameRow {
                    item: item.id(),
                    text: notification.module_name.clone(),
                    detail: Some(notification.action.label().to_string()),
                    params: self.store.params(item, now),
                    progress: Some(self.remaining(item, now)),
                    colors: vec![accent, accent.with_alpha(0.8)],
                    background: Some(CARD_BACKGROUND),
                    text_size: None,
                    shadow: None,
                }
            })
            .collect();

        SurfaceFrame {
            surface: self.identity(),
            sequence: scope.context.frames_rendered(),
            rows,
        }
    }

    fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn is_animating(&self) -> bool {
        // Countdown bars move every frame while any card is up
        !self.store.is_empty()
    }

    fn empty_grace(&self) -> Duration {
        self.settings.empty_grace
    }
}
