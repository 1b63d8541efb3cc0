//! Overlay Surface Registry
//!
//! Keyed set of surface lifecycles. `show` attaches a surface at most once no
//! matter how many callers race to it; `dismiss` detaches it and never touches
//! the host for a surface that was not attached.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────── UI scheduler task ─────────────────────┐
//! │  OverlaySurfaceRegistry                                     │
//! │    declared:   SurfaceId -> (layout, retention)             │
//! │    lifecycles: SurfaceId -> SurfaceLifecycle (lazy)         │
//! │    host:       Arc<dyn HostWindowService>                   │
//! └──────────────┬─────────────────────────────────────────────┘
//!                │ writes on every phase change
//!                ▼
//!        PhaseView (Arc<DashMap>)  ◄──── read from any thread
//! ```
//!
//! The registry itself is owned by the scheduler task, so mutations are
//! serialized without locks. Other threads observe phases through the
//! lock-free [`PhaseView`] mirror.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::host::HostWindowService;
use crate::layout::LayoutDescriptor;
use crate::lifecycle::{
    InvalidationHandle, LifecycleError, RenderScope, RetentionPolicy, SurfaceLifecycle,
    SurfacePhase,
};
use crate::surface::{SurfaceFrame, SurfaceId};

/// Result of a successful `show`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowOutcome {
    /// The surface was attached by this call
    Attached,
    /// The surface was already on screen; nothing changed
    AlreadyAttached,
}

/// Result of `dismiss`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissOutcome {
    /// The surface was detached by this call
    Detached,
    /// The surface was not on screen; the host was not called
    NotAttached,
}

/// Read-only, thread-safe view of surface phases
#[derive(Clone, Debug, Default)]
pub struct PhaseView {
    phases: Arc<DashMap<SurfaceId, SurfacePhase>>,
}

impl PhaseView {
    /// Phase of `surface`; unknown surfaces report `Detached`
    #[must_use]
    pub fn phase(&self, surface: &SurfaceId) -> SurfacePhase {
        self.phases
            .get(surface)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Whether `surface` is on screen
    #[must_use]
    pub fn is_shown(&self, surface: &SurfaceId) -> bool {
        self.phase(surface) == SurfacePhase::Attached
    }

    /// Every surface currently on screen
    #[must_use]
    pub fn attached(&self) -> Vec<SurfaceId> {
        let mut attached: Vec<SurfaceId> = self
            .phases
            .iter()
            .filter(|entry| *entry.value() == SurfacePhase::Attached)
            .map(|entry| entry.key().clone())
            .collect();
        attached.sort();
        attached
    }

    fn set(&self, surface: &SurfaceId, phase: SurfacePhase) {
        self.phases.insert(surface.clone(), phase);
    }
}

#[derive(Debug, Clone)]
struct Declaration {
    layout: LayoutDescriptor,
    retention: RetentionPolicy,
}

/// Owner of every overlay surface lifecycle
pub struct OverlaySurfaceRegistry {
    host: Arc<dyn HostWindowService>,
    declared: HashMap<SurfaceId, Declaration>,
    lifecycles: HashMap<SurfaceId, SurfaceLifecycle>,
    phases: PhaseView,
}

impl std::fmt::Debug for OverlaySurfaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySurfaceRegistry")
            .field("declared", &self.declared.keys().collect::<Vec<_>>())
            .field("lifecycles", &self.lifecycles)
            .finish_non_exhaustive()
    }
}

impl OverlaySurfaceRegistry {
    /// Registry presenting through `host`
    #[must_use]
    pub fn new(host: Arc<dyn HostWindowService>) -> Self {
        Self {
            host,
            declared: HashMap::new(),
            lifecycles: HashMap::new(),
            phases: PhaseView::default(),
        }
    }

    /// Make `surface` known; its lifecycle is built on first `show`
    pub fn declare(
        &mut self,
        surface: SurfaceId,
        layout: LayoutDescriptor,
        retention: RetentionPolicy,
    ) {
        debug!(surface = %surface, anchor = ?layout.anchor, "Declared overlay surface");
        self.phases.set(&surface, SurfacePhase::Detached);
        self.declared.insert(surface, Declaration { layout, retention });
    }

    /// Shared phase mirror
    #[must_use]
    pub fn phase_view(&self) -> PhaseView {
        self.phases.clone()
    }

    /// Declared surfaces, sorted
    #[must_use]
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        let mut surfaces: Vec<SurfaceId> = self.declared.keys().cloned().collect();
        surfaces.sort();
        surfaces
    }

    /// Lifecycle of `surface`, if it was ever shown
    #[must_use]
    pub fn lifecycle(&self, surface: &SurfaceId) -> Option<&SurfaceLifecycle> {
        self.lifecycles.get(surface)
    }

    /// Whether `surface` is on screen
    #[must_use]
    pub fn is_shown(&self, surface: &SurfaceId) -> bool {
        self.lifecycles
            .get(surface)
            .is_some_and(SurfaceLifecycle::is_attached)
    }

    /// Attach `surface` unless it already is
    pub fn show(
        &mut self,
        surface: &SurfaceId,
        now: Instant,
    ) -> Result<ShowOutcome, LifecycleError> {
        let lifecycle = match self.lifecycles.entry(surface.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let declaration = self
                    .declared
                    .get(surface)
                    .ok_or_else(|| LifecycleError::UnknownSurface(surface.clone()))?;
                entry.insert(
                    SurfaceLifecycle::new(surface.clone(), declaration.layout.clone())
                        .with_retention(declaration.retention),
                )
            }
        };

        if lifecycle.is_attached() {
            debug!(surface = %surface, "Surface already shown");
            return Ok(ShowOutcome::AlreadyAttached);
        }

        self.phases.set(surface, SurfacePhase::Attaching);
        let result = lifecycle.attach(self.host.as_ref(), now);
        self.phases.set(surface, lifecycle.phase());

        result.map(|()| {
            info!(surface = %surface, "Surface shown");
            ShowOutcome::Attached
        })
    }

    /// Detach `surface` if it is on screen
    pub fn dismiss(&mut self, surface: &SurfaceId) -> Result<DismissOutcome, LifecycleError> {
        if !self.declared.contains_key(surface) {
            return Err(LifecycleError::UnknownSurface(surface.clone()));
        }

        let Some(lifecycle) = self.lifecycles.get_mut(surface) else {
            debug!(surface = %surface, "Dismiss before first show ignored");
            return Ok(DismissOutcome::NotAttached);
        };

        if !lifecycle.is_attached() {
            return Ok(DismissOutcome::NotAttached);
        }

        self.phases.set(surface, SurfacePhase::Detaching);
        lifecycle.detach(self.host.as_ref());
        self.phases.set(surface, lifecycle.phase());
        info!(surface = %surface, "Surface dismissed");
        Ok(DismissOutcome::Detached)
    }

    /// Change the layout of `surface`
    ///
    /// A surface that is on screen is detached and presented again with the
    /// new layout; otherwise the layout is used on the next `show`.
    pub fn relayout(
        &mut self,
        surface: &SurfaceId,
        layout: LayoutDescriptor,
        now: Instant,
    ) -> Result<(), LifecycleError> {
        let declaration = self
            .declared
            .get_mut(surface)
            .ok_or_else(|| LifecycleError::UnknownSurface(surface.clone()))?;
        declaration.layout = layout.clone();

        let Some(lifecycle) = self.lifecycles.get_mut(surface) else {
            return Ok(());
        };
        let was_attached = lifecycle.is_attached();
        if was_attached {
            self.phases.set(surface, SurfacePhase::Detaching);
            lifecycle.detach(self.host.as_ref());
            self.phases.set(surface, lifecycle.phase());
        }
        lifecycle.set_layout(layout);
        debug!(surface = %surface, reattach = was_attached, "Surface layout changed");

        if was_attached {
            self.show(surface, now)?;
        }
        Ok(())
    }

    /// Detach everything that is on screen
    pub fn dismiss_all(&mut self) -> usize {
        let mut detached = 0;
        for (surface, lifecycle) in &mut self.lifecycles {
            if lifecycle.detach(self.host.as_ref()) {
                self.phases.set(surface, lifecycle.phase());
                detached += 1;
            }
        }
        detached
    }

    /// Ask for a re-render of `surface` on the next tick
    pub fn invalidate(&self, surface: &SurfaceId) {
        if let Some(lifecycle) = self.lifecycles.get(surface) {
            lifecycle.request_content_invalidate();
        }
    }

    /// Re-render handle for `surface`, once it has been shown
    #[must_use]
    pub fn invalidation_handle(&self, surface: &SurfaceId) -> Option<InvalidationHandle> {
        self.lifecycles
            .get(surface)
            .map(SurfaceLifecycle::invalidation_handle)
    }

    /// Consume a pending re-render request for `surface`
    pub fn take_invalidation(&self, surface: &SurfaceId) -> bool {
        self.lifecycles
            .get(surface)
            .is_some_and(SurfaceLifecycle::take_invalidation)
    }

    /// Compose and deliver a frame for `surface`; `false` if not on screen
    pub fn render<F>(&mut self, surface: &SurfaceId, compose: F) -> bool
    where
        F: FnOnce(RenderScope<'_>) -> SurfaceFrame,
    {
        match self.lifecycles.get_mut(surface) {
            Some(lifecycle) => lifecycle.render(self.host.as_ref(), compose),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, HostRejected};
    use crate::layout::Anchor;
    use pretty_assertions::assert_eq;

    fn registry() -> (Arc<HeadlessHost>, OverlaySurfaceRegistry) {
        let host = Arc::new(HeadlessHost::new());
        let mut registry = OverlaySurfaceRegistry::new(host.clone());
        registry.declare(
            SurfaceId::notifications(),
            LayoutDescriptor::notification(),
            RetentionPolicy::DiscardOnDetach,
        );
        (host, registry)
    }

    #[test]
    fn test_show_twice_presents_once() {
        let (host, mut registry) = registry();
        let id = SurfaceId::notifications();

        assert_eq!(registry.show(&id, Instant::now()), Ok(ShowOutcome::Attached));
        assert_eq!(
            registry.show(&id, Instant::now()),
            Ok(ShowOutcome::AlreadyAttached)
        );
        assert_eq!(host.present_count(), 1);
        assert!(registry.phase_view().is_shown(&id));
    }

    #[test]
    fn test_dismiss_never_shown_skips_host() {
        let (host, mut registry) = registry();

        assert_eq!(
            registry.dismiss(&SurfaceId::notifications()),
            Ok(DismissOutcome::NotAttached)
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_dismiss_after_show() {
        let (host, mut registry) = registry();
        let id = SurfaceId::notifications();

        registry.show(&id, Instant::now()).expect("show should succeed");
        assert_eq!(registry.dismiss(&id), Ok(DismissOutcome::Detached));
        assert_eq!(registry.dismiss(&id), Ok(DismissOutcome::NotAttached));
        assert_eq!(host.remove_count(), 1);
        assert_eq!(registry.phase_view().phase(&id), SurfacePhase::Detached);
    }

    #[test]
    fn test_unknown_surface() {
        let (_host, mut registry) = registry();
        let id = SurfaceId::new("nope");

        assert_eq!(
            registry.show(&id, Instant::now()),
            Err(LifecycleError::UnknownSurface(id.clone()))
        );
        assert_eq!(
            registry.dismiss(&id),
            Err(LifecycleError::UnknownSurface(id))
        );
    }

    #[test]
    fn test_rejection_leaves_surface_detached_and_retryable() {
        let (host, mut registry) = registry();
        let id = SurfaceId::notifications();
        host.reject_with(Some(HostRejected::MissingPermission));

        let err = registry.show(&id, Instant::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::HostRejected { .. }));
        assert!(!registry.is_shown(&id));
        assert_eq!(registry.phase_view().phase(&id), SurfacePhase::Detached);

        host.reject_with(None);
        assert_eq!(registry.show(&id, Instant::now()), Ok(ShowOutcome::Attached));
    }

    #[test]
    fn test_render_only_when_shown() {
        let (host, mut registry) = registry();
        let id = SurfaceId::notifications();

        assert!(!registry.render(&id, |scope| SurfaceFrame::empty(
            scope.context.surface().clone(),
            0
        )));

        registry.show(&id, Instant::now()).expect("show should succeed");
        assert!(registry.take_invalidation(&id));
        assert!(registry.render(&id, |scope| SurfaceFrame::empty(
            scope.context.surface().clone(),
            0
        )));
        assert_eq!(host.update_count(), 1);
    }

    #[test]
    fn test_dismiss_all() {
        let (host, mut registry) = registry();
        registry.declare(
            SurfaceId::module_badges(),
            LayoutDescriptor::module_badges(),
            RetentionPolicy::DiscardOnDetach,
        );

        registry
            .show(&SurfaceId::notifications(), Instant::now())
            .expect("show should succeed");
        registry
            .show(&SurfaceId::module_badges(), Instant::now())
            .expect("show should succeed");
        assert_eq!(
            registry.phase_view().attached(),
            vec![SurfaceId::module_badges(), SurfaceId::notifications()]
        );

        assert_eq!(registry.dismiss_all(), 2);
        assert_eq!(host.live_windows(), 0);
        assert!(registry.phase_view().attached().is_empty());
    }

    #[test]
    fn test_relayout_represents_shown_surface() {
        let (host, mut registry) = registry();
        let id = SurfaceId::notifications();
        let moved = LayoutDescriptor {
            anchor: Anchor::TopStart,
            ..LayoutDescriptor::notification()
        };

        registry.show(&id, Instant::now()).expect("show should succeed");
        registry
            .relayout(&id, moved.clone(), Instant::now())
            .expect("relayout should succeed");

        assert!(registry.is_shown(&id));
        assert_eq!(host.present_count(), 2);
        assert_eq!(host.remove_count(), 1);
        assert_eq!(host.last_layout(&id).map(|layout| layout.anchor), Some(Anchor::TopStart));
        assert_eq!(registry.lifecycle(&id).map(SurfaceLifecycle::attach_count), Some(2));
    }

    #[test]
    fn test_relayout_of_hidden_surface_waits_for_show() {
        let (host, mut registry) = registry();
        let id = SurfaceId::notifications();
        let moved = LayoutDescriptor {
            anchor: Anchor::Center,
            ..LayoutDescriptor::notification()
        };

        registry
            .relayout(&id, moved, Instant::now())
            .expect("relayout should succeed");
        assert!(host.calls().is_empty());

        registry.show(&id, Instant::now()).expect("show should succeed");
        assert_eq!(host.last_layout(&id).map(|layout| layout.anchor), Some(Anchor::Center));
        assert_eq!(
            registry.relayout(
                &SurfaceId::new("missing"),
                LayoutDescriptor::notification(),
                Instant::now()
            ),
            Err(LifecycleError::UnknownSurface(SurfaceId::new("missing")))
        );
    }
}
