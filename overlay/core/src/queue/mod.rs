//! Bounded Queue Store
//!
//! Insertion-ordered collection of [`AnimatedItem`]s keyed by a string. The
//! store owns the dedup and eviction policy; the animation state machine lives
//! on each item.
//!
//! # Architecture
//!
//! ```text
//!  insert(key) ──► dedup on active keys ──► evict index 0 if full ──► push back
//!                                                                       │
//!  mark_for_removal(key) ──► Exiting ◄────────── advance(now) ◄──────────┘
//!                               │
//!                               ▼
//!  collect_removed() ◄──── Removed            remove(key): forced, immediate
//! ```
//!
//! Invariant: `keys` holds exactly the keys of `items`, so no two stored items
//! share a key. A key becomes insertable again only once its item is deleted,
//! either by `remove` or by `collect_removed` after the exit has finished.

mod item;

pub use item::{AnimatedItem, ItemId, StateChange};

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use crate::animation::{AnimationParams, AnimationState, AnimationStyle, AnimationTiming};

/// Errors raised when configuring a store
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A bounded store needs room for at least one item
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
}

/// Maximum number of items a store keeps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capacity {
    /// Evict the oldest item once this many are stored
    Bounded(NonZeroUsize),
    /// Never evict
    Unbounded,
}

impl Capacity {
    /// Bounded capacity, rejecting zero
    pub fn bounded(limit: usize) -> Result<Self, StoreError> {
        NonZeroUsize::new(limit)
            .map(Self::Bounded)
            .ok_or(StoreError::ZeroCapacity)
    }

    /// Item limit, if any
    #[must_use]
    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Bounded(limit) => Some(limit.get()),
            Self::Unbounded => None,
        }
    }
}

/// Keyed, insertion-ordered store of animated items
#[derive(Debug)]
pub struct BoundedQueueStore<P> {
    capacity: Capacity,
    timing: AnimationTiming,
    style: AnimationStyle,
    items: VecDeque<AnimatedItem<P>>,
    keys: HashSet<String>,
}

impl<P> BoundedQueueStore<P> {
    /// Create an empty store
    #[must_use]
    pub fn new(capacity: Capacity, timing: AnimationTiming, style: AnimationStyle) -> Self {
        Self {
            capacity,
            timing,
            style,
            items: VecDeque::new(),
            keys: HashSet::new(),
        }
    }

    /// Insert a new item unless an item with `key` is already stored
    ///
    /// When the store is full the item at index 0 is dropped first, whatever
    /// its state. The new item's entry slot is staggered behind any item
    /// still waiting to enter.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        payload: P,
        now: Instant,
    ) -> Option<&AnimatedItem<P>> {
        let key = key.into();
        if self.keys.contains(&key) {
            debug!(key = %key, "Ignoring duplicate insert");
            return None;
        }

        if let Some(limit) = self.capacity.limit() {
            while self.items.len() >= limit {
                let Some(evicted) = self.items.pop_front() else {
                    break;
                };
                self.keys.remove(evicted.key());
                debug!(
                    key = %evicted.key(),
                    item_id = %evicted.id(),
                    state = %evicted.state(),
                    "Evicted oldest item to make room"
                );
            }
        }

        let visible_at = self.next_entry_slot(now);
        self.keys.insert(key.clone());
        self.items
            .push_back(AnimatedItem::new(key, payload, now, visible_at));
        self.items.back()
    }

    /// Start the exit animation for the item with `key`
    ///
    /// Returns `true` if an item was found and marked by this call. Marking an
    /// already-marked or exiting item changes nothing.
    pub fn mark_for_removal(&mut self, key: &str, now: Instant) -> bool {
        let style = self.style;
        let marked = self
            .items
            .iter_mut()
            .find(|item| item.key() == key)
            .is_some_and(|item| item.mark(now, &style));
        if marked {
            debug!(key = %key, "Marked item for removal");
        }
        marked
    }

    /// Delete the item with `key` immediately, skipping any exit animation
    pub fn remove(&mut self, key: &str) -> Option<AnimatedItem<P>> {
        let index = self.items.iter().position(|item| item.key() == key)?;
        self.keys.remove(key);
        self.items.remove(index)
    }

    /// Whether `key` is stored, not marked, and not yet leaving
    #[must_use]
    pub fn is_active(&self, key: &str) -> bool {
        self.get(key).is_some_and(AnimatedItem::is_active)
    }

    /// Whether an item with `key` is stored, in any state
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Item stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AnimatedItem<P>> {
        self.items.iter().find(|item| item.key() == key)
    }

    /// Items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &AnimatedItem<P>> {
        self.items.iter()
    }

    /// Number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Configured capacity
    #[must_use]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Configured timing
    #[must_use]
    pub fn timing(&self) -> &AnimationTiming {
        &self.timing
    }

    /// Configured animation style
    #[must_use]
    pub fn style(&self) -> &AnimationStyle {
        &self.style
    }

    /// Visual parameters of `item` at `now`
    #[must_use]
    pub fn params(&self, item: &AnimatedItem<P>, now: Instant) -> AnimationParams {
        item.params(now, &self.timing, &self.style)
    }

    /// Whether any item is mid-transition (entering or exiting)
    #[must_use]
    pub fn has_transient(&self) -> bool {
        self.items.iter().any(|item| {
            matches!(
                item.state(),
                AnimationState::Pending | AnimationState::Exiting
            )
        })
    }

    /// Apply every due transition and report what moved
    pub fn advance(&mut self, now: Instant) -> Vec<StateChange> {
        let timing = self.timing;
        let style = self.style;
        let mut changes = Vec::new();

        for item in &mut self.items {
            if let Some(change) = item.advance(now, &timing, &style) {
                changes.push(change);
            }
        }

        changes
    }

    /// Delete every item that finished its exit
    pub fn collect_removed(&mut self) -> Vec<AnimatedItem<P>> {
        let (finished, kept): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| item.state() == AnimationState::Removed);
        self.items = kept;
        for item in &finished {
            self.keys.remove(item.key());
        }
        finished.into()
    }

    fn next_entry_slot(&self, now: Instant) -> Instant {
        self.items
            .iter()
            .filter(|item| item.state() == AnimationState::Pending && item.visible_at() >= now)
            .map(AnimatedItem::visible_at)
            .max()
            .map_or(now, |latest| latest + self.timing.entry_stagger)
    }
}
