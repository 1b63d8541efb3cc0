//! Host Windowing Boundary
//!
//! The overlay engine never talks to a display server directly. Everything
//! that places pixels on screen goes through [`HostWindowService`], which a
//! platform integration implements. The engine only ever calls it from the UI
//! scheduler task, so implementations never see concurrent calls from it.
//!
//! [`HeadlessHost`] is the in-process implementation used by the daemon and
//! the tests: it records every call and can be told to refuse presentation.

mod headless;

pub use headless::{HeadlessHost, HostCall};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::LayoutDescriptor;
use crate::surface::{SurfaceFrame, SurfaceId};

/// Opaque handle for a window the host has presented
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostHandle(u64);

impl HostHandle {
    /// Wrap a host-specific raw handle
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-{}", self.0)
    }
}

/// First platform version with a trusted overlay layer
pub const TRUSTED_OVERLAY_SINCE: u32 = 31;

/// First platform version that can pass input through an overlay window
pub const INPUT_TRANSPARENCY_SINCE: u32 = 26;

/// Optional features a host may support
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Platform API level the host runs on; 0 when unknown
    pub platform_version: u32,
    /// Host can place surfaces on a trusted overlay layer
    pub trusted_overlay: bool,
    /// Host can make surfaces ignore focus and touch
    pub input_transparency: bool,
}

impl HostCapabilities {
    /// Feature set implied by `platform_version`
    #[must_use]
    pub const fn for_platform_version(platform_version: u32) -> Self {
        Self {
            platform_version,
            trusted_overlay: platform_version >= TRUSTED_OVERLAY_SINCE,
            input_transparency: platform_version >= INPUT_TRANSPARENCY_SINCE,
        }
    }

    /// Everything supported
    #[must_use]
    pub const fn full() -> Self {
        Self::for_platform_version(u32::MAX)
    }

    /// Nothing optional supported
    #[must_use]
    pub const fn minimal() -> Self {
        Self::for_platform_version(0)
    }
}

/// Reasons a host refuses to present a surface
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostRejected {
    /// The user has not granted overlay permission
    #[error("overlay permission has not been granted")]
    MissingPermission,

    /// The windowing service is gone or not yet available
    #[error("host windowing service is unavailable")]
    Unavailable,

    /// Host-specific refusal
    #[error("host refused presentation: {0}")]
    Refused(String),
}

/// Platform windowing integration
pub trait HostWindowService: Send + Sync {
    /// Optional features this host supports
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::default()
    }

    /// Present a surface with an already resolved layout
    fn present(
        &self,
        surface: &SurfaceId,
        layout: &LayoutDescriptor,
    ) -> Result<HostHandle, HostRejected>;

    /// Replace the content of a presented surface
    fn update(&self, handle: HostHandle, frame: &SurfaceFrame) {
        let _ = (handle, frame);
    }

    /// Take a presented surface off screen
    fn remove(&self, handle: HostHandle);
}
