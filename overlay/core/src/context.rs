//! Overlay Context
//!
//! Entry point for everything outside the UI task. Starting a context spawns
//! the scheduler; the API handles it hands out are cheap to clone and can be
//! used from any thread.
//!
//! ```text
//! feature layer ──on_toggle──► OverlayContext ──► NotificationApi ─┐
//!                                             └─► ModuleBadgeApi  ─┤
//!                                WatermarkApi ─────────────────────┼─► UiScheduler
//!                                 RegistryApi ─────────────────────┘
//! ```
//!
//! Producer calls never block: commands are queued with `try_send` and a full
//! queue is reported back as [`DispatchError::QueueFull`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, OverlayConfig};
use crate::host::HostWindowService;
use crate::layout::Anchor;
use crate::lifecycle::{LifecycleError, SurfacePhase};
use crate::registry::{DismissOutcome, OverlaySurfaceRegistry, PhaseView, ShowOutcome};
use crate::scheduler::{
    BadgeCommand, DispatchError, OverlaySnapshot, SurfaceSet, UiCommand, UiHandle, UiScheduler,
    WatermarkCommand,
};
use crate::surface::{
    BadgeStyle, ModuleAction, ModuleBadgeSurface, Notification, NotificationSurface, Rgba,
    SurfaceId, WatermarkSurface,
};

/// Receiver of module on/off events from the feature layer
pub trait ToggleListener: Send + Sync {
    /// `module_name` was switched to `enabled`
    fn on_toggle(&self, module_name: &str, enabled: bool);
}

// ============================================================================
// Producer APIs
// ============================================================================

/// Queue notification cards
#[derive(Clone, Debug)]
pub struct NotificationApi {
    ui: UiHandle,
}

impl NotificationApi {
    /// Announce that `module_name` was enabled
    pub fn on_module_enabled(&self, module_name: &str) -> Result<(), DispatchError> {
        self.on_toggle(module_name, true)
    }

    /// Announce that `module_name` was disabled
    pub fn on_module_disabled(&self, module_name: &str) -> Result<(), DispatchError> {
        self.on_toggle(module_name, false)
    }

    /// Announce a toggle
    pub fn on_toggle(&self, module_name: &str, enabled: bool) -> Result<(), DispatchError> {
        self.ui.dispatch(UiCommand::Notify(Notification::new(
            module_name,
            ModuleAction::from_enabled(enabled),
        )))
    }
}

/// Drive the module badge list
#[derive(Clone, Debug)]
pub struct ModuleBadgeApi {
    ui: UiHandle,
}

impl ModuleBadgeApi {
    /// Add a badge for `module_name`
    pub fn show(&self, module_name: &str) -> Result<(), DispatchError> {
        self.send(BadgeCommand::Show(module_name.to_string()))
    }

    /// Remove the badge for `module_name` (animated)
    pub fn hide(&self, module_name: &str) -> Result<(), DispatchError> {
        self.send(BadgeCommand::Hide(module_name.to_string()))
    }

    /// Flip the badge for `module_name`
    pub fn toggle(&self, module_name: &str) -> Result<(), DispatchError> {
        self.send(BadgeCommand::Toggle(module_name.to_string()))
    }

    /// Turn the whole list on or off
    pub fn set_enabled(&self, enabled: bool) -> Result<(), DispatchError> {
        self.send(BadgeCommand::SetEnabled(enabled))
    }

    /// Change the coloring
    pub fn set_style(&self, style: BadgeStyle) -> Result<(), DispatchError> {
        self.send(BadgeCommand::SetStyle(style))
    }

    fn send(&self, command: BadgeCommand) -> Result<(), DispatchError> {
        self.ui.dispatch(UiCommand::Badge(command))
    }
}

/// Show, hide and restyle the watermark
#[derive(Clone, Debug)]
pub struct WatermarkApi {
    ui: UiHandle,
}

impl WatermarkApi {
    /// Put the watermark on screen
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Disabled`] while turned off,
    /// [`LifecycleError::HostRejected`] if the host refuses, or
    /// [`LifecycleError::SchedulerClosed`] after shutdown.
    pub async fn show(&self) -> Result<ShowOutcome, LifecycleError> {
        self.ui
            .request(|reply| UiCommand::Show {
                surface: SurfaceId::watermark(),
                reply,
            })
            .await?
    }

    /// Take the watermark off screen
    ///
    /// # Errors
    ///
    /// [`LifecycleError::SchedulerClosed`] after shutdown.
    pub async fn dismiss(&self) -> Result<DismissOutcome, LifecycleError> {
        self.ui
            .request(|reply| UiCommand::Dismiss {
                surface: SurfaceId::watermark(),
                reply,
            })
            .await?
    }

    /// Allow or forbid showing; turning off also dismisses
    pub fn set_enabled(&self, enabled: bool) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetEnabled(enabled))
    }

    /// Replace the second line
    pub fn set_text(&self, text: &str) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetText(text.to_string()))
    }

    /// Fixed text color
    pub fn set_color(&self, color: Rgba) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetColor(color))
    }

    /// Text size in logical pixels
    pub fn set_text_size(&self, size: u16) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetTextSize(size))
    }

    /// Opacity in percent
    pub fn set_opacity(&self, percent: u8) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetOpacity(percent))
    }

    /// Hue cycling
    pub fn set_rainbow(&self, rainbow: bool) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetRainbow(rainbow))
    }

    /// Drop shadow
    pub fn set_shadow(&self, shadow: bool) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetShadow(shadow))
    }

    /// Move to another corner
    pub fn set_position(&self, position: Anchor) -> Result<(), DispatchError> {
        self.send(WatermarkCommand::SetPosition(position))
    }

    fn send(&self, command: WatermarkCommand) -> Result<(), DispatchError> {
        self.ui.dispatch(UiCommand::Watermark(command))
    }
}

/// Show, dismiss and inspect surfaces
#[derive(Clone, Debug)]
pub struct RegistryApi {
    ui: UiHandle,
    phases: PhaseView,
}

impl RegistryApi {
    /// Attach `surface`; concurrent callers share one attachment
    ///
    /// # Errors
    ///
    /// [`LifecycleError::HostRejected`] if the host refuses, or
    /// [`LifecycleError::SchedulerClosed`] after shutdown.
    pub async fn show(&self, surface: &SurfaceId) -> Result<ShowOutcome, LifecycleError> {
        self.ui
            .request(|reply| UiCommand::Show {
                surface: surface.clone(),
                reply,
            })
            .await?
    }

    /// Detach `surface` if it is on screen
    ///
    /// # Errors
    ///
    /// [`LifecycleError::UnknownSurface`] for undeclared surfaces, or
    /// [`LifecycleError::SchedulerClosed`] after shutdown.
    pub async fn dismiss(&self, surface: &SurfaceId) -> Result<DismissOutcome, LifecycleError> {
        self.ui
            .request(|reply| UiCommand::Dismiss {
                surface: surface.clone(),
                reply,
            })
            .await?
    }

    /// Ask for a re-render of `surface`
    pub fn invalidate(&self, surface: &SurfaceId) -> Result<(), DispatchError> {
        self.ui.dispatch(UiCommand::Invalidate {
            surface: surface.clone(),
        })
    }

    /// Whether `surface` is on screen; never blocks
    #[must_use]
    pub fn is_shown(&self, surface: &SurfaceId) -> bool {
        self.phases.is_shown(surface)
    }

    /// Phase of `surface`; never blocks
    #[must_use]
    pub fn phase(&self, surface: &SurfaceId) -> SurfacePhase {
        self.phases.phase(surface)
    }

    /// Current state of every surface and queued item
    ///
    /// # Errors
    ///
    /// [`DispatchError::Closed`] after shutdown.
    pub async fn snapshot(&self) -> Result<OverlaySnapshot, DispatchError> {
        self.ui.request(|reply| UiCommand::Snapshot { reply }).await
    }
}

// ============================================================================
// Context
// ============================================================================

/// Running overlay engine
#[derive(Debug)]
pub struct OverlayContext {
    ui: UiHandle,
    phases: PhaseView,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl OverlayContext {
    /// Build the surfaces described by `config` and spawn the UI scheduler
    ///
    /// Must be called from within a tokio runtime. Nothing is spawned when
    /// `config` is rejected.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ValidationError`] if `config` fails
    /// [`OverlayConfig::validate`].
    pub fn start(
        config: &OverlayConfig,
        host: Arc<dyn HostWindowService>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let notifications = if config.notifications_enabled {
            let surface = NotificationSurface::new(config.notification.clone())
                .map_err(|error| ConfigError::ValidationError(error.to_string()))?;
            Some(surface)
        } else {
            None
        };
        let badges = ModuleBadgeSurface::new(config.badges.clone());
        let watermark = WatermarkSurface::new(config.watermark.clone());

        let registry = OverlaySurfaceRegistry::new(host);
        let phases = registry.phase_view();
        let (scheduler, ui) = UiScheduler::new(
            &config.scheduler,
            registry,
            SurfaceSet {
                notifications,
                badges,
                watermark,
            },
        );
        let task = tokio::spawn(scheduler.run());

        info!(
            notifications = config.notifications_enabled,
            badges = config.badges.enabled,
            style = ?config.badges.style,
            watermark = config.watermark.enabled,
            "Overlay context started"
        );

        Ok(Self {
            ui,
            phases,
            task: Mutex::new(Some(task)),
        })
    }

    /// Notification producer handle
    #[must_use]
    pub fn notifications(&self) -> NotificationApi {
        NotificationApi {
            ui: self.ui.clone(),
        }
    }

    /// Badge producer handle
    #[must_use]
    pub fn module_badges(&self) -> ModuleBadgeApi {
        ModuleBadgeApi {
            ui: self.ui.clone(),
        }
    }

    /// Watermark handle
    #[must_use]
    pub fn watermark(&self) -> WatermarkApi {
        WatermarkApi {
            ui: self.ui.clone(),
        }
    }

    /// Surface registry handle
    #[must_use]
    pub fn registry(&self) -> RegistryApi {
        RegistryApi {
            ui: self.ui.clone(),
            phases: self.phases.clone(),
        }
    }

    /// Whether the scheduler is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.ui.is_closed()
    }

    /// Dismiss every surface and stop the scheduler
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        if let Err(error) = self.ui.request(|reply| UiCommand::Shutdown { reply }).await {
            debug!(error = %error, "UI scheduler already stopped");
        }

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(error) = task.await {
                warn!(error = %error, "UI scheduler task failed");
            }
        }
    }
}

impl ToggleListener for OverlayContext {
    fn on_toggle(&self, module_name: &str, enabled: bool) {
        if let Err(error) = self.notifications().on_toggle(module_name, enabled) {
            warn!(module = %module_name, error = %error, "Dropped toggle notification");
        }

        let badges = self.module_badges();
        let result = if enabled {
            badges.show(module_name)
        } else {
            badges.hide(module_name)
        };
        if let Err(error) = result {
            warn!(module = %module_name, error = %error, "Dropped badge update");
        }
    }
}
