//! Queued items and their per-item state machine

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::animation::{AnimationParams, AnimationState, AnimationStyle, AnimationTiming};

/// Unique identifier for a queued item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    /// Allocate a fresh id
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// A state change observed while advancing a queue
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateChange {
    /// Item that moved
    pub id: ItemId,
    /// Item key
    pub key: String,
    /// State before the advance
    pub from: AnimationState,
    /// State after the advance
    pub to: AnimationState,
}

/// One element in a [`BoundedQueueStore`](super::BoundedQueueStore)
#[derive(Clone, Debug)]
pub struct AnimatedItem<P> {
    id: ItemId,
    key: String,
    payload: P,
    state: AnimationState,
    inserted_at: Instant,
    visible_at: Instant,
    state_entered_at: Instant,
    exit_from: AnimationParams,
    marked: bool,
}

impl<P> AnimatedItem<P> {
    pub(crate) fn new(key: String, payload: P, inserted_at: Instant, visible_at: Instant) -> Self {
        Self {
            id: ItemId::next(),
            key,
            payload,
            state: AnimationState::Pending,
            inserted_at,
            visible_at,
            state_entered_at: inserted_at,
            exit_from: AnimationParams::SHOWN,
            marked: false,
        }
    }

    /// Item id
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Dedup key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Caller-supplied payload
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// When the item was inserted
    #[must_use]
    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    /// Scheduled entry slot
    #[must_use]
    pub fn visible_at(&self) -> Instant {
        self.visible_at
    }

    /// When the current state began
    #[must_use]
    pub fn state_entered_at(&self) -> Instant {
        self.state_entered_at
    }

    /// Whether removal was requested explicitly
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Counted against dedup: not marked and not yet leaving
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.marked && self.state.is_live()
    }

    /// Time spent in the current state
    #[must_use]
    pub fn elapsed_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered_at)
    }

    /// Visual parameters at `now`
    #[must_use]
    pub fn params(
        &self,
        now: Instant,
        timing: &AnimationTiming,
        style: &AnimationStyle,
    ) -> AnimationParams {
        AnimationParams::sample(
            self.state,
            self.elapsed_in_state(now),
            self.exit_from,
            timing,
            style,
        )
    }

    /// Request removal, starting the exit immediately
    ///
    /// Returns `false` when the item was already marked or already leaving.
    pub(crate) fn mark(&mut self, now: Instant, style: &AnimationStyle) -> bool {
        if self.marked {
            return false;
        }
        self.marked = true;
        if !self.state.is_live() {
            return false;
        }
        self.begin_exit(now, style);
        true
    }

    fn begin_exit(&mut self, at: Instant, style: &AnimationStyle) {
        self.exit_from = AnimationParams::resting(self.state, style);
        self.state = AnimationState::Exiting;
        self.state_entered_at = at;
    }

    /// Apply every transition that is due at `now`
    ///
    /// Transitions are stamped with the instant they were due rather than
    /// `now`, so a late tick does not stretch the hold or the exit.
    pub(crate) fn advance(
        &mut self,
        now: Instant,
        timing: &AnimationTiming,
        style: &AnimationStyle,
    ) -> Option<StateChange> {
        let before = self.state;

        loop {
            match self.state {
                AnimationState::Pending if now >= self.visible_at => {
                    self.state = AnimationState::Visible;
                    self.state_entered_at = self.visible_at;
                }
                AnimationState::Visible => match timing.hold {
                    Some(hold) if now >= self.state_entered_at + hold => {
                        let due = self.state_entered_at + hold;
                        self.begin_exit(due, style);
                    }
                    _ => break,
                },
                AnimationState::Exiting if now >= self.state_entered_at + timing.exit => {
                    self.state = AnimationState::Removed;
                    self.state_entered_at += timing.exit;
                }
                _ => break,
            }
        }

        (before != self.state).then(|| StateChange {
            id: self.id,
            key: self.key.clone(),
            from: before,
            to: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(now: Instant, visible_at: Instant) -> AnimatedItem<()> {
        AnimatedItem::new("a".to_string(), (), now, visible_at)
    }

    #[test]
    fn test_item_ids_are_unique() {
        let a = ItemId::next();
        let b = ItemId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_full_lifecycle_in_one_advance() {
        let t0 = Instant::now();
        let timing = AnimationTiming::notification();
        let style = AnimationStyle::notification();
        let mut it = item(t0, t0 + Duration::from_millis(50));

        assert!(it.advance(t0, &timing, &style).is_none());
        assert_eq!(it.state(), AnimationState::Pending);

        let change = it
            .advance(t0 + Duration::from_secs(10), &timing, &style)
            .expect("state should change");
        assert_eq!(change.from, AnimationState::Pending);
        assert_eq!(change.to, AnimationState::Removed);
    }

    #[test]
    fn test_hold_is_measured_from_entry_slot() {
        let t0 = Instant::now();
        let timing = AnimationTiming::notification();
        let style = AnimationStyle::notification();
        let mut it = item(t0, t0 + Duration::from_millis(50));

        it.advance(t0 + Duration::from_millis(60), &timing, &style);
        assert_eq!(it.state(), AnimationState::Visible);

        it.advance(t0 + Duration::from_millis(2049), &timing, &style);
        assert_eq!(it.state(), AnimationState::Visible);

        it.advance(t0 + Duration::from_millis(2050), &timing, &style);
        assert_eq!(it.state(), AnimationState::Exiting);
    }

    #[test]
    fn test_mark_is_idempotent() {
        let t0 = Instant::now();
        let style = AnimationStyle::badge();
        let mut it = item(t0, t0);

        assert!(it.mark(t0, &style));
        assert_eq!(it.state(), AnimationState::Exiting);
        assert!(!it.is_active());
        assert!(!it.mark(t0, &style));
    }

    #[test]
    fn test_marked_pending_item_never_becomes_visible() {
        let t0 = Instant::now();
        let timing = AnimationTiming::badge();
        let style = AnimationStyle::badge();
        let mut it = item(t0, t0 + Duration::from_millis(100));

        it.mark(t0, &style);
        it.advance(t0 + Duration::from_millis(150), &timing, &style);
        assert_eq!(it.state(), AnimationState::Exiting);
        it.advance(t0 + Duration::from_millis(300), &timing, &style);
        assert_eq!(it.state(), AnimationState::Removed);
    }
}
