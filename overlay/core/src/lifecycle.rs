//! Surface Lifecycle
//!
//! Tracks whether one overlay surface is on screen and owns everything tied
//! to a single attach cycle: the host handle, the render context and (unless
//! the retention policy keeps it) the retained rendering state.
//!
//! # Architecture
//!
//! ```text
//!            attach()                 host.present() ok
//! Detached ───────────► Attaching ─────────────────────► Attached
//!    ▲                      │ host rejected                  │
//!    └──────────────────────┘                                │ detach()
//!    ▲                                                       ▼
//!    └──────────────────────────────────────────────── Detaching
//!                       host.remove() done
//! ```
//!
//! Only `Detached` and `Attached` are observable between calls; the
//! intermediate phases exist while the host is being talked to.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::host::{HostHandle, HostRejected, HostWindowService};
use crate::layout::LayoutDescriptor;
use crate::surface::{SurfaceFrame, SurfaceId};

// ============================================================================
// Errors
// ============================================================================

/// Errors from surface lifecycle operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// `attach` called on a surface that is not detached
    #[error("surface {0} is already attached")]
    AlreadyAttached(SurfaceId),

    /// The host refused to present the surface
    #[error("host rejected surface {surface}: {reason}")]
    HostRejected {
        /// Surface identity
        surface: SurfaceId,
        /// Host-reported reason
        #[source]
        reason: HostRejected,
    },

    /// The surface is turned off and may not be shown
    #[error("surface {0} is turned off")]
    Disabled(SurfaceId),

    /// No surface with this identity was declared
    #[error("no overlay surface registered as {0}")]
    UnknownSurface(SurfaceId),

    /// The UI scheduler has stopped
    #[error("UI scheduler is not running")]
    SchedulerClosed,
}

// ============================================================================
// Phases and Policies
// ============================================================================

/// Attachment phase of a surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfacePhase {
    /// Not on screen
    #[default]
    Detached,
    /// Being presented
    Attaching,
    /// On screen
    Attached,
    /// Being removed
    Detaching,
}

impl fmt::Display for SurfacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Detached => "detached",
            Self::Attaching => "attaching",
            Self::Attached => "attached",
            Self::Detaching => "detaching",
        };
        f.write_str(label)
    }
}

/// What happens to retained state when a surface detaches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Start every attach cycle with empty state
    #[default]
    DiscardOnDetach,
    /// Keep state across attach cycles for the lifetime of the lifecycle
    RetainAcrossAttach,
}

// ============================================================================
// Retained State and Render Context
// ============================================================================

/// Free-form rendering state that survives between frames
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetainedState {
    values: HashMap<String, Value>,
}

impl RetainedState {
    /// Value stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Store `value` under `key`, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Drop the value under `key`
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Number of stored values
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-attach rendering context; created on attach, dropped on detach
#[derive(Clone, Debug)]
pub struct RenderContext {
    surface: SurfaceId,
    handle: HostHandle,
    attached_at: Instant,
    frames_rendered: u64,
}

impl RenderContext {
    /// Surface being rendered
    #[must_use]
    pub fn surface(&self) -> &SurfaceId {
        &self.surface
    }

    /// Host window receiving frames
    #[must_use]
    pub fn handle(&self) -> HostHandle {
        self.handle
    }

    /// When this attach cycle started
    #[must_use]
    pub fn attached_at(&self) -> Instant {
        self.attached_at
    }

    /// Frames delivered during this attach cycle
    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

/// Mutable view handed to a surface while it composes a frame
#[derive(Debug)]
pub struct RenderScope<'a> {
    /// Context of the current attach cycle
    pub context: &'a RenderContext,
    /// State retained between frames
    pub state: &'a mut RetainedState,
}

/// Cloneable flag that asks for a re-render on the next tick
#[derive(Clone, Debug, Default)]
pub struct InvalidationHandle {
    pending: Arc<AtomicBool>,
}

impl InvalidationHandle {
    /// Ask for a re-render
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Whether a re-render is pending
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consume a pending request
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Attachment state and per-attach resources of one surface
#[derive(Debug)]
pub struct SurfaceLifecycle {
    identity: SurfaceId,
    layout: LayoutDescriptor,
    retention: RetentionPolicy,
    phase: SurfacePhase,
    context: Option<RenderContext>,
    retained: Option<RetainedState>,
    invalidation: InvalidationHandle,
    attach_count: u64,
}

impl SurfaceLifecycle {
    /// Detached lifecycle for `identity`
    #[must_use]
    pub fn new(identity: SurfaceId, layout: LayoutDescriptor) -> Self {
        Self {
            identity,
            layout,
            retention: RetentionPolicy::default(),
            phase: SurfacePhase::Detached,
            context: None,
            retained: None,
            invalidation: InvalidationHandle::default(),
            attach_count: 0,
        }
    }

    /// Set the retention policy
    #[must_use]
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Surface identity
    #[must_use]
    pub fn identity(&self) -> &SurfaceId {
        &self.identity
    }

    /// Requested layout
    #[must_use]
    pub fn layout(&self) -> &LayoutDescriptor {
        &self.layout
    }

    /// Replace the requested layout; refused while on screen
    pub fn set_layout(&mut self, layout: LayoutDescriptor) -> bool {
        if self.phase != SurfacePhase::Detached {
            return false;
        }
        self.layout = layout;
        true
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    /// Whether the surface is on screen
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.phase == SurfacePhase::Attached
    }

    /// Host handle while attached
    #[must_use]
    pub fn host_handle(&self) -> Option<HostHandle> {
        self.context.as_ref().map(RenderContext::handle)
    }

    /// Render context while attached
    #[must_use]
    pub fn render_context(&self) -> Option<&RenderContext> {
        self.context.as_ref()
    }

    /// Retained state, if any exists
    #[must_use]
    pub fn retained_state(&self) -> Option<&RetainedState> {
        self.retained.as_ref()
    }

    /// Number of successful attaches so far
    #[must_use]
    pub fn attach_count(&self) -> u64 {
        self.attach_count
    }

    /// Present the surface through `host`
    ///
    /// On rejection the lifecycle falls back to `Detached` and nothing is
    /// left half-built.
    pub fn attach(
        &mut self,
        host: &dyn HostWindowService,
        now: Instant,
    ) -> Result<(), LifecycleError> {
        if self.phase != SurfacePhase::Detached {
            return Err(LifecycleError::AlreadyAttached(self.identity.clone()));
        }

        self.phase = SurfacePhase::Attaching;
        let layout = self.layout.resolve(&host.capabilities());

        let handle = match host.present(&self.identity, &layout) {
            Ok(handle) => handle,
            Err(reason) => {
                self.phase = SurfacePhase::Detached;
                warn!(surface = %self.identity, reason = %reason, "Host rejected overlay surface");
                return Err(LifecycleError::HostRejected {
                    surface: self.identity.clone(),
                    reason,
                });
            }
        };

        self.context = Some(RenderContext {
            surface: self.identity.clone(),
            handle,
            attached_at: now,
            frames_rendered: 0,
        });
        if self.retained.is_none() {
            self.retained = Some(RetainedState::default());
        }
        self.attach_count += 1;
        self.phase = SurfacePhase::Attached;
        self.invalidation.request();

        info!(
            surface = %self.identity,
            handle = %handle,
            attach_count = self.attach_count,
            "Overlay surface attached"
        );
        Ok(())
    }

    /// Take the surface off screen
    ///
    /// Returns `false` (and does not touch the host) when not attached.
    pub fn detach(&mut self, host: &dyn HostWindowService) -> bool {
        if self.phase != SurfacePhase::Attached {
            debug!(surface = %self.identity, phase = %self.phase, "Detach ignored");
            return false;
        }

        self.phase = SurfacePhase::Detaching;
        if let Some(context) = self.context.take() {
            host.remove(context.handle);
        }
        if self.retention == RetentionPolicy::DiscardOnDetach {
            self.retained = None;
        }
        self.phase = SurfacePhase::Detached;

        info!(surface = %self.identity, "Overlay surface detached");
        true
    }

    /// Ask for a re-render on the next frame; no-op while detached
    pub fn request_content_invalidate(&self) {
        if self.is_attached() {
            self.invalidation.request();
        }
    }

    /// Handle that producers can keep to request re-renders
    #[must_use]
    pub fn invalidation_handle(&self) -> InvalidationHandle {
        self.invalidation.clone()
    }

    /// Consume a pending re-render request
    pub fn take_invalidation(&self) -> bool {
        self.invalidation.take()
    }

    /// Compose a frame with `compose` and deliver it to the host
    ///
    /// Returns `false` when not attached.
    pub fn render<F>(&mut self, host: &dyn HostWindowService, compose: F) -> bool
    where
        F: FnOnce(RenderScope<'_>) -> SurfaceFrame,
    {
        if !self.is_attached() {
            return false;
        }
        let (Some(context), Some(state)) = (self.context.as_mut(), self.retained.as_mut()) else {
            return false;
        };

        let frame = compose(RenderScope {
            context: &*context,
            state,
        });
        host.update(context.handle, &frame);
        context.frames_rendered += 1;
        true
    }
}
