//! Module Badge Surface
//!
//! Persistent list of the modules that are currently on, one badge per
//! module name. Badges stay until hidden; the list is drawn longest name
//! first so it forms a ragged right-aligned edge.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::style::{gradient_stops, rainbow_color, BadgeStyle, BADGE_BACKGROUND};
use super::{FrameRow, OverlaySurface, SurfaceFrame, SurfaceId};
use crate::animation::{AnimationStyle, AnimationTiming};
use crate::layout::LayoutDescriptor;
use crate::lifecycle::RenderScope;
use crate::queue::{AnimatedItem, BoundedQueueStore, Capacity, ItemId};

const ORDER_KEY: &str = "display_order";

/// Letter case applied to badge text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayCase {
    /// Leave names untouched
    #[default]
    AsIs,
    /// ALL CAPS
    Upper,
    /// all lowercase
    Lower,
    /// First letter of each word capitalized
    Capitalized,
}

impl DisplayCase {
    /// Apply the case to `name`
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::AsIs => name.to_string(),
            Self::Upper => name.to_uppercase(),
            Self::Lower => name.to_lowercase(),
            Self::Capitalized => name
                .split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<String>>()
                .join(" "),
        }
    }
}

impl std::str::FromStr for DisplayCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "as_is" | "none" => Ok(Self::AsIs),
            "upper" => Ok(Self::Upper),
            "lower" => Ok(Self::Lower),
            "capitalized" => Ok(Self::Capitalized),
            other => Err(format!("unknown display case '{other}'")),
        }
    }
}

/// Payload of one badge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Badge {
    /// Module name as reported by the feature layer
    pub name: String,
}

/// Tuning for the badge surface
#[derive(Clone, Debug, PartialEq)]
pub struct BadgeSettings {
    /// Whether badges are shown at all
    pub enabled: bool,
    /// Coloring
    pub style: BadgeStyle,
    /// Letter case
    pub case: DisplayCase,
    /// Entry stagger and exit durations
    pub timing: AnimationTiming,
    /// Time the window stays up after the last badge leaves
    pub empty_grace: Duration,
}

impl Default for BadgeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            style: BadgeStyle::default(),
            case: DisplayCase::default(),
            timing: AnimationTiming::badge(),
            empty_grace: Duration::from_millis(100),
        }
    }
}

/// List of enabled modules
#[derive(Debug)]
pub struct ModuleBadgeSurface {
    settings: BadgeSettings,
    store: BoundedQueueStore<Badge>,
}

impl ModuleBadgeSurface {
    /// Create the surface
    #[must_use]
    pub fn new(settings: BadgeSettings) -> Self {
        let store = BoundedQueueStore::new(
            Capacity::Unbounded,
            settings.timing,
            AnimationStyle::badge(),
        );
        Self { settings, store }
    }

    /// Whether badges are shown at all
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Turn the whole surface on or off; stored badges are kept
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Change the coloring
    pub fn set_style(&mut self, style: BadgeStyle) {
        self.settings.style = style;
    }

    /// Change the letter case
    pub fn set_case(&mut self, case: DisplayCase) {
        self.settings.case = case;
    }

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &BadgeSettings {
        &self.settings
    }

    /// Add a badge for `name`
    ///
    /// Ignored while the surface is disabled or the badge is already up. A
    /// badge that is mid-exit is dropped and started over.
    pub fn show(&mut self, name: &str, now: Instant) -> Option<ItemId> {
        if !self.settings.enabled {
            debug!(module = %name, "Badges disabled, ignoring show");
            return None;
        }
        if self.store.contains(name) && !self.store.is_active(name) {
            self.store.remove(name);
            debug!(module = %name, "Restarting badge that was leaving");
        }
        self.store
            .insert(name, Badge { name: name.to_string() }, now)
            .map(AnimatedItem::id)
    }

    /// Start the exit animation for `name`
    pub fn hide(&mut self, name: &str, now: Instant) -> bool {
        self.store.mark_for_removal(name, now)
    }

    /// Flip `name`; returns whether the badge is now active
    pub fn toggle(&mut self, name: &str, now: Instant) -> bool {
        if self.store.is_active(name) {
            self.hide(name, now);
            false
        } else {
            self.show(name, now).is_some()
        }
    }

    /// Whether `name` currently has an active badge
    #[must_use]
    pub fn is_module_enabled(&self, name: &str) -> bool {
        self.store.is_active(name)
    }

    /// Underlying queue
    #[must_use]
    pub fn store(&self) -> &BoundedQueueStore<Badge> {
        &self.store
    }

    /// Badges in drawing order: longest displayed name first, ties by age
    #[must_use]
    pub fn display_order(&self) -> Vec<&AnimatedItem<Badge>> {
        let case = self.settings.case;
        let mut ordered: Vec<_> = self.store.iter().collect();
        ordered.sort_by_key(|item| Reverse(case.apply(&item.payload().name).chars().count()));
        ordered
    }
}

impl OverlaySurface for ModuleBadgeSurface {
    fn identity(&self) -> SurfaceId {
        SurfaceId::module_badges()
    }

    fn layout(&self) -> LayoutDescriptor {
        LayoutDescriptor::module_badges()
    }

    fn advance(&mut self, now: Instant) -> bool {
        let changes = self.store.advance(now);
        let removed = self.store.collect_removed();
        for item in &removed {
            debug!(module = %item.key(), item_id = %item.id(), "Badge removed");
        }
        !changes.is_empty() || !removed.is_empty()
    }

    fn compose(&mut self, now: Instant, scope: RenderScope<'_>) -> SurfaceFrame {
        let ordered = self.display_order();
        let total = ordered.len();
        let elapsed = now.saturating_duration_since(scope.context.attached_at());

        let order = Value::from(
            ordered
                .iter()
                .map(|item| item.id().as_u64())
                .collect::<Vec<u64>>(),
        );
        if scope.state.get(ORDER_KEY) != Some(&order) {
            debug!(badges = total, "Badge order changed");
            scope.state.set(ORDER_KEY, order);
        }

        let rows = ordered
            .iter()
            .enumerate()
            .map(|(row, item)| {
                let (colors, background) = match self.settings.style {
                    BadgeStyle::Gradient => {
                        (gradient_stops(elapsed).to_vec(), Some(BADGE_BACKGROUND))
                    }
                    BadgeStyle::Rainbow => (vec![rainbow_color(elapsed, row, total)], None),
                };
                FrameRow {
                    item: item.id(),
                    text: self.settings.case.apply(&item.payload().name),
                    detail: None,
                    params: self.store.params(item, now),
                    progress: None,
                    colors,
                    background,
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
        // Colors cycle continuously
        !self.store.is_empty()
    }

    fn empty_grace(&self) -> Duration {
        self.settings.empty_grace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationState;
    use pretty_assertions::assert_eq;

    fn enabled_surface() -> ModuleBadgeSurface {
        ModuleBadgeSurface::new(BadgeSettings {
            enabled: true,
            ..BadgeSettings::default()
        })
    }

    fn names(surface: &ModuleBadgeSurface) -> Vec<String> {
        surface
            .display_order()
            .iter()
            .map(|item| item.payload().name.clone())
            .collect()
    }

    #[test]
    fn test_disabled_surface_ignores_show() {
        let mut surface = ModuleBadgeSurface::new(BadgeSettings::default());
        assert!(surface.show("Fly", Instant::now()).is_none());
        assert!(surface.is_empty());
    }

    #[test]
    fn test_show_dedups_by_name() {
        let now = Instant::now();
        let mut surface = enabled_surface();

        assert!(surface.show("Fly", now).is_some());
        assert!(surface.show("Fly", now).is_none());
        assert_eq!(surface.store().len(), 1);
        assert!(surface.is_module_enabled("Fly"));
    }

    #[test]
    fn test_display_order_longest_first() {
        let now = Instant::now();
        let mut surface = enabled_surface();

        for name in ["Fly", "KillAura", "Speed", "Nuker"] {
            surface.show(name, now);
        }

        assert_eq!(names(&surface), vec!["KillAura", "Speed", "Nuker", "Fly"]);
    }

    #[test]
    fn test_toggle() {
        let now = Instant::now();
        let mut surface = enabled_surface();

        assert!(surface.toggle("Fly", now));
        assert!(!surface.toggle("Fly", now));
        assert!(!surface.is_module_enabled("Fly"));
        assert_eq!(
            surface.store().get("Fly").map(AnimatedItem::state),
            Some(AnimationState::Exiting)
        );
    }

    #[test]
    fn test_show_while_exiting_restarts_badge() {
        let now = Instant::now();
        let mut surface = enabled_surface();

        let first = surface.show("Fly", now).expect("shown");
        surface.hide("Fly", now);
        let second = surface.show("Fly", now).expect("restarted");

        assert_ne!(first, second);
        assert_eq!(surface.store().len(), 1);
        assert!(surface.is_module_enabled("Fly"));
    }

    #[test]
    fn test_badges_hold_until_hidden() {
        let t0 = Instant::now();
        let mut surface = enabled_surface();
        surface.show("Fly", t0);

        surface.advance(t0 + Duration::from_secs(60));
        assert_eq!(
            surface.store().get("Fly").map(AnimatedItem::state),
            Some(AnimationState::Visible)
        );

        let later = t0 + Duration::from_secs(61);
        surface.hide("Fly", later);
        surface.advance(later + Duration::from_millis(300));
        assert!(surface.is_empty());
    }

    #[test]
    fn test_display_case() {
        assert_eq!(DisplayCase::Upper.apply("kill aura"), "KILL AURA");
        assert_eq!(DisplayCase::Lower.apply("Fly"), "fly");
        assert_eq!(DisplayCase::Capitalized.apply("kill aura"), "Kill Aura");
        assert_eq!(DisplayCase::AsIs.apply("fLy"), "fLy");
        assert_eq!("as_is".parse::<DisplayCase>(), Ok(DisplayCase::AsIs));
    }
}
