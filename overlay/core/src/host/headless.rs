//! In-process host that draws nothing and remembers everything

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{HostCapabilities, HostHandle, HostRejected, HostWindowService};
use crate::layout::LayoutDescriptor;
use crate::surface::{SurfaceFrame, SurfaceId};

/// A call observed by [`HeadlessHost`]
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    /// Surface presented
    Present {
        /// Surface identity
        surface: SurfaceId,
        /// Handle returned to the caller
        handle: HostHandle,
        /// Layout that was requested
        layout: LayoutDescriptor,
    },
    /// Presentation refused
    Rejected {
        /// Surface identity
        surface: SurfaceId,
        /// Why
        reason: HostRejected,
    },
    /// Content replaced
    Update {
        /// Target window
        handle: HostHandle,
        /// Number of rows in the frame
        rows: usize,
    },
    /// Window removed
    Remove {
        /// Target window
        handle: HostHandle,
    },
}

#[derive(Debug, Default)]
struct Ledger {
    next_handle: u64,
    rejection: Option<HostRejected>,
    calls: Vec<HostCall>,
    windows: HashMap<HostHandle, SurfaceId>,
    frames: HashMap<SurfaceId, SurfaceFrame>,
}

/// Host implementation without a display
#[derive(Debug)]
pub struct HeadlessHost {
    capabilities: HostCapabilities,
    ledger: Mutex<Ledger>,
}

impl HeadlessHost {
    /// Headless host that supports every optional feature
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::full())
    }

    /// Headless host with explicit capabilities
    #[must_use]
    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self {
            capabilities,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Refuse every following `present` with `reason`, or accept again with `None`
    pub fn reject_with(&self, reason: Option<HostRejected>) {
        self.ledger.lock().rejection = reason;
    }

    /// Every call so far, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.ledger.lock().calls.clone()
    }

    /// Number of successful presentations
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.count(|call| matches!(call, HostCall::Present { .. }))
    }

    /// Number of window removals
    #[must_use]
    pub fn remove_count(&self) -> usize {
        self.count(|call| matches!(call, HostCall::Remove { .. }))
    }

    /// Number of content updates
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.count(|call| matches!(call, HostCall::Update { .. }))
    }

    /// Whether `surface` currently has a window
    #[must_use]
    pub fn is_presented(&self, surface: &SurfaceId) -> bool {
        self.ledger
            .lock()
            .windows
            .values()
            .any(|presented| presented == surface)
    }

    /// Number of windows currently on screen
    #[must_use]
    pub fn live_windows(&self) -> usize {
        self.ledger.lock().windows.len()
    }

    /// Last frame delivered for `surface`
    #[must_use]
    pub fn last_frame(&self, surface: &SurfaceId) -> Option<SurfaceFrame> {
        self.ledger.lock().frames.get(surface).cloned()
    }

    /// Layout requested by the most recent presentation of `surface`
    #[must_use]
    pub fn last_layout(&self, surface: &SurfaceId) -> Option<LayoutDescriptor> {
        self.ledger.lock().calls.iter().rev().find_map(|call| match call {
            HostCall::Present {
                surface: presented,
                layout,
                ..
            } if presented == surface => Some(layout.clone()),
            _ => None,
        })
    }

    fn count(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.ledger.lock().calls.iter().filter(|call| predicate(call)).count()
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostWindowService for HeadlessHost {
    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn present(
        &self,
        surface: &SurfaceId,
        layout: &LayoutDescriptor,
    ) -> Result<HostHandle, HostRejected> {
        let mut ledger = self.ledger.lock();

        if let Some(reason) = ledger.rejection.clone() {
            warn!(surface = %surface, reason = %reason, "Headless host refusing surface");
            ledger.calls.push(HostCall::Rejected {
                surface: surface.clone(),
                reason: reason.clone(),
            });
            return Err(reason);
        }

        ledger.next_handle += 1;
        let handle = HostHandle::new(ledger.next_handle);
        ledger.windows.insert(handle, surface.clone());
        ledger.calls.push(HostCall::Present {
            surface: surface.clone(),
            handle,
            layout: layout.clone(),
        });

        info!(
            surface = %surface,
            handle = %handle,
            anchor = ?layout.anchor,
            layer = ?layout.layer,
            "Presented overlay surface"
        );
        Ok(handle)
    }

    fn update(&self, handle: HostHandle, frame: &SurfaceFrame) {
        let mut ledger = self.ledger.lock();

        let Some(surface) = ledger.windows.get(&handle).cloned() else {
            warn!(handle = %handle, "Update for unknown window ignored");
            return;
        };

        ledger.calls.push(HostCall::Update {
            handle,
            rows: frame.rows.len(),
        });
        ledger.frames.insert(surface, frame.clone());
    }

    fn remove(&self, handle: HostHandle) {
        let mut ledger = self.ledger.lock();

        match ledger.windows.remove(&handle) {
            Some(surface) => {
                ledger.frames.remove(&surface);
                debug!(surface = %surface, handle = %handle, "Removed overlay surface");
            }
            None => warn!(handle = %handle, "Remove for unknown window"),
        }
        ledger.calls.push(HostCall::Remove { handle });
    }
}
