//! Overlay Core - Floating Surface Lifecycle and Animated Notification Queues
//!
//! Manages small overlay windows drawn above everything else (a toast stack
//! in one corner, a list of enabled modules in another, a branding watermark)
//! without depending on any windowing toolkit. A host adapter presents and removes the actual
//! windows; this crate decides when, and what goes in them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Feature layer (any thread)                   │
//! │     ToggleListener   NotificationApi   ModuleBadgeApi            │
//! │                      WatermarkApi      RegistryApi               │
//! └───────────────────────────┬─────────────────────────────────────┘
//!                             │ UiCommand (mpsc)
//! ┌───────────────────────────┼─────────────────────────────────────┐
//! │                      UiScheduler (one task)                      │
//! │  ┌──────────────────┐  ┌───────────────────┐  ┌───────────────┐ │
//! │  │ NotificationSurf │  │ ModuleBadgeSurf   │  │ SurfaceRegistry│ │
//! │  │  BoundedQueue(3) │  │  BoundedQueue(∞)  │  │  Lifecycle x N │ │
//! │  └──────────────────┘  └───────────────────┘  └───────┬───────┘ │
//! │  ┌──────────────────┐                                 │         │
//! │  │ WatermarkSurface │                                 │         │
//! │  └──────────────────┘                                 │         │
//! └─────────────────────────────────────────────────────────┼────────┘
//!                                                           │
//!                                              HostWindowService
//!                                         (present / update / remove)
//! ```
//!
//! # Key Types
//!
//! - [`OverlayContext`]: starts the scheduler and hands out producer APIs
//! - [`BoundedQueueStore`]: keyed, deduplicating, capacity-bounded item queue
//! - [`SurfaceLifecycle`]: attach/detach state machine for one window
//! - [`OverlaySurfaceRegistry`]: named surfaces with show/dismiss semantics
//! - [`HostWindowService`]: seam to the platform window manager
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use overlay_core::{HeadlessHost, OverlayConfig, OverlayContext, ToggleListener};
//!
//! #[tokio::main]
//! async fn main() {
//!     let host = Arc::new(HeadlessHost::new());
//!     let context = OverlayContext::start(&OverlayConfig::default(), host).unwrap();
//!
//!     context.on_toggle("Fly", true);
//!     context.shutdown().await;
//! }
//! ```

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod config;
pub mod context;
pub mod host;
pub mod layout;
pub mod lifecycle;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod surface;

// Re-exports for convenience
pub use animation::{
    AnimationParams, AnimationState, AnimationStyle, AnimationTiming, EasingFunction,
};
pub use context::{
    ModuleBadgeApi, NotificationApi, OverlayContext, RegistryApi, ToggleListener, WatermarkApi,
};
pub use host::{HeadlessHost, HostCall, HostCapabilities, HostHandle, HostRejected, HostWindowService};
pub use layout::{Anchor, LayoutDescriptor, SizeMode, WindowLayer};
pub use lifecycle::{
    InvalidationHandle, LifecycleError, RenderContext, RenderScope, RetainedState,
    RetentionPolicy, SurfaceLifecycle, SurfacePhase,
};
pub use queue::{AnimatedItem, BoundedQueueStore, Capacity, ItemId, StateChange, StoreError};
pub use registry::{DismissOutcome, OverlaySurfaceRegistry, PhaseView, ShowOutcome};
pub use scheduler::{
    BadgeCommand, DispatchError, ItemStatus, OverlaySnapshot, SchedulerConfig, SurfaceStatus,
    UiCommand, UiHandle, UiScheduler, WatermarkCommand, MIN_FRAME_INTERVAL,
};
pub use surface::{
    Badge, BadgeSettings, BadgeStyle, DisplayCase, FrameRow, ModuleAction, ModuleBadgeSurface,
    Notification, NotificationSettings, NotificationSurface, OverlaySurface, Rgba, SurfaceFrame,
    SurfaceId, WatermarkSettings, WatermarkSurface, WATERMARK_TEXT_LIMIT, WATERMARK_TEXT_SIZES,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, OverlayConfig, OverlayToml, WatermarkToml,
};
