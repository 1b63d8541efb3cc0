//! UI Scheduler
//!
//! Single task that owns every overlay surface, the registry and the host
//! handle. Producers on any thread talk to it through a bounded command
//! queue; commands run in the order they were sent, interleaved with frame
//! ticks.
//!
//! # Architecture
//!
//! ```text
//!  NotificationApi ─┐
//!  ModuleBadgeApi  ─┤
//!  WatermarkApi    ─┼─► mpsc (bounded, FIFO) ─┐
//!  RegistryApi     ─┘                         │
//!                                             ▼
//!                               ┌──── UiScheduler task ────┐
//!  interval (frame_interval) ──►│ tick: advance, render,   │──► HostWindowService
//!                               │       dismiss when empty │
//!                               └──────────────────────────┘
//! ```
//!
//! Time comes from `tokio::time`, so tests can run the whole engine on a
//! paused clock.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::animation::AnimationState;
use crate::layout::Anchor;
use crate::lifecycle::{LifecycleError, RetentionPolicy, SurfacePhase};
use crate::queue::{BoundedQueueStore, ItemId};
use crate::registry::{DismissOutcome, OverlaySurfaceRegistry, ShowOutcome};
use crate::surface::{
    BadgeStyle, ModuleBadgeSurface, Notification, NotificationSurface, OverlaySurface, Rgba,
    SurfaceId, WatermarkSurface,
};

/// Default frame interval (~60 fps)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Default depth of the command queue
pub const DEFAULT_COMMAND_QUEUE_DEPTH: usize = 256;

/// Shortest frame interval the scheduler will tick at
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// Configuration and Errors
// ============================================================================

/// Scheduler tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between frame ticks
    pub frame_interval: Duration,
    /// Commands that may wait before producers see `QueueFull`
    pub command_queue_depth: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            command_queue_depth: DEFAULT_COMMAND_QUEUE_DEPTH,
        }
    }
}

/// Failure to hand a command to the scheduler
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The command queue is full; the command was dropped
    #[error("UI command queue is full")]
    QueueFull,

    /// The scheduler has stopped
    #[error("UI scheduler has shut down")]
    Closed,
}

impl From<DispatchError> for LifecycleError {
    fn from(_: DispatchError) -> Self {
        Self::SchedulerClosed
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Badge surface operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeCommand {
    /// Add a badge
    Show(String),
    /// Start a badge's exit
    Hide(String),
    /// Flip a badge
    Toggle(String),
    /// Turn the whole surface on or off
    SetEnabled(bool),
    /// Change coloring
    SetStyle(BadgeStyle),
}

/// Watermark operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkCommand {
    /// Allow or forbid showing; turning off dismisses the window
    SetEnabled(bool),
    /// Replace the user text
    SetText(String),
    /// Fixed text color
    SetColor(Rgba),
    /// Text size in logical pixels
    SetTextSize(u16),
    /// Opacity in percent
    SetOpacity(u8),
    /// Hue cycling
    SetRainbow(bool),
    /// Drop shadow
    SetShadow(bool),
    /// Screen position; a shown watermark is presented again
    SetPosition(Anchor),
}

/// Work item for the scheduler task
#[derive(Debug)]
pub enum UiCommand {
    /// Attach a surface
    Show {
        /// Target
        surface: SurfaceId,
        /// Outcome
        reply: oneshot::Sender<Result<ShowOutcome, LifecycleError>>,
    },
    /// Detach a surface
    Dismiss {
        /// Target
        surface: SurfaceId,
        /// Outcome
        reply: oneshot::Sender<Result<DismissOutcome, LifecycleError>>,
    },
    /// Re-render a surface on the next tick
    Invalidate {
        /// Target
        surface: SurfaceId,
    },
    /// Queue a notification card
    Notify(Notification),
    /// Badge operation
    Badge(BadgeCommand),
    /// Watermark operation
    Watermark(WatermarkCommand),
    /// Report current state
    Snapshot {
        /// Current state
        reply: oneshot::Sender<OverlaySnapshot>,
    },
    /// Dismiss everything and stop
    Shutdown {
        /// Signalled once everything is dismissed
        reply: oneshot::Sender<()>,
    },
}

// ============================================================================
// Snapshots
// ============================================================================

/// State of one queued item
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemStatus {
    /// Item id
    pub id: ItemId,
    /// Item key
    pub key: String,
    /// Animation state
    pub state: AnimationState,
}

/// State of one surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SurfaceStatus {
    /// Surface identity
    pub surface: SurfaceId,
    /// Attachment phase
    pub phase: SurfacePhase,
    /// Whether the surface accepts new items
    pub enabled: bool,
    /// Queued items in insertion order
    pub items: Vec<ItemStatus>,
}

/// Point-in-time view of every surface
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OverlaySnapshot {
    /// Surfaces, notifications first
    pub surfaces: Vec<SurfaceStatus>,
}

impl OverlaySnapshot {
    /// Status of `surface`
    #[must_use]
    pub fn surface(&self, surface: &SurfaceId) -> Option<&SurfaceStatus> {
        self.surfaces.iter().find(|status| &status.surface == surface)
    }

    /// Keys queued on `surface`, in insertion order
    #[must_use]
    pub fn keys(&self, surface: &SurfaceId) -> Vec<String> {
        self.surface(surface)
            .map(|status| status.items.iter().map(|item| item.key.clone()).collect())
            .unwrap_or_default()
    }
}

fn item_statuses<P>(store: &BoundedQueueStore<P>) -> Vec<ItemStatus> {
    store
        .iter()
        .map(|item| ItemStatus {
            id: item.id(),
            key: item.key().to_string(),
            state: item.state(),
        })
        .collect()
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable sender side of the scheduler
#[derive(Clone, Debug)]
pub struct UiHandle {
    commands: mpsc::Sender<UiCommand>,
}

impl UiHandle {
    /// Enqueue without waiting
    pub fn dispatch(&self, command: UiCommand) -> Result<(), DispatchError> {
        self.commands.try_send(command).map_err(|error| match error {
            TrySendError::Full(command) => {
                warn!(command = ?command, "UI command queue full, dropping command");
                DispatchError::QueueFull
            }
            TrySendError::Closed(_) => DispatchError::Closed,
        })
    }

    /// Enqueue a command carrying a reply channel and wait for the answer
    pub async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> UiCommand,
    ) -> Result<T, DispatchError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| DispatchError::Closed)?;
        response.await.map_err(|_| DispatchError::Closed)
    }

    /// Whether the scheduler has stopped
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Surfaces driven by the scheduler
#[derive(Debug)]
pub struct SurfaceSet {
    /// Notification cards; `None` when notifications are turned off
    pub notifications: Option<NotificationSurface>,
    /// Module badge list
    pub badges: ModuleBadgeSurface,
    /// Branding watermark
    pub watermark: WatermarkSurface,
}

/// The UI task; build with [`UiScheduler::new`] and spawn [`UiScheduler::run`]
#[derive(Debug)]
pub struct UiScheduler {
    frame_interval: Duration,
    commands: mpsc::Receiver<UiCommand>,
    state: UiState,
}

impl UiScheduler {
    /// Wire the scheduler to `registry`, declaring every surface in `surfaces`
    ///
    /// A frame interval below [`MIN_FRAME_INTERVAL`] is raised to it.
    #[must_use]
    pub fn new(
        config: &SchedulerConfig,
        registry: OverlaySurfaceRegistry,
        surfaces: SurfaceSet,
    ) -> (Self, UiHandle) {
        let (commands_tx, commands_rx) = mpsc::channel(config.command_queue_depth.max(1));
        if config.frame_interval < MIN_FRAME_INTERVAL {
            warn!(
                requested_ms = u64::try_from(config.frame_interval.as_millis()).unwrap_or(u64::MAX),
                "Frame interval too short, using the minimum"
            );
        }
        let scheduler = Self {
            frame_interval: config.frame_interval.max(MIN_FRAME_INTERVAL),
            commands: commands_rx,
            state: UiState::new(registry, surfaces),
        };
        (
            scheduler,
            UiHandle {
                commands: commands_tx,
            },
        )
    }

    /// Process commands and frame ticks until shut down
    ///
    /// Returns when a `Shutdown` command arrives or every [`UiHandle`] is
    /// dropped. Either way all surfaces are dismissed first.
    pub async fn run(self) {
        let Self {
            frame_interval,
            mut commands,
            mut state,
        } = self;

        let mut ticker = time::interval(frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            frame_interval_ms = u64::try_from(frame_interval.as_millis()).unwrap_or(u64::MAX),
            "UI scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => state.tick(clock_now()),

                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("All UI handles dropped");
                        state.shutdown();
                        break;
                    };
                    if state.handle(command, clock_now()).is_break() {
                        break;
                    }
                }
            }
        }
    }
}

fn clock_now() -> Instant {
    time::Instant::now().into_std()
}

#[derive(Debug)]
struct UiState {
    registry: OverlaySurfaceRegistry,
    surfaces: SurfaceSet,
    empty_since: HashMap<SurfaceId, Instant>,
}

impl UiState {
    fn new(mut registry: OverlaySurfaceRegistry, surfaces: SurfaceSet) -> Self {
        if let Some(notifications) = &surfaces.notifications {
            registry.declare(
                notifications.identity(),
                notifications.layout(),
                RetentionPolicy::DiscardOnDetach,
            );
        }
        registry.declare(
            surfaces.badges.identity(),
            surfaces.badges.layout(),
            RetentionPolicy::RetainAcrossAttach,
        );
        registry.declare(
            surfaces.watermark.identity(),
            surfaces.watermark.layout(),
            RetentionPolicy::DiscardOnDetach,
        );

        Self {
            registry,
            surfaces,
            empty_since: HashMap::new(),
        }
    }

    fn handle(&mut self, command: UiCommand, now: Instant) -> ControlFlow<()> {
        match command {
            UiCommand::Show { surface, reply } => {
                let result = if self.is_turned_off(&surface) {
                    debug!(surface = %surface, "Surface turned off, refusing show");
                    Err(LifecycleError::Disabled(surface.clone()))
                } else {
                    self.registry.show(&surface, now)
                };
                if result.is_ok() {
                    self.empty_since.remove(&surface);
                }
                let _ = reply.send(result);
            }
            UiCommand::Dismiss { surface, reply } => {
                let result = self.registry.dismiss(&surface);
                self.empty_since.remove(&surface);
                let _ = reply.send(result);
            }
            UiCommand::Invalidate { surface } => self.registry.invalidate(&surface),
            UiCommand::Notify(notification) => self.notify(notification, now),
            UiCommand::Badge(command) => self.badge(command, now),
            UiCommand::Watermark(command) => self.watermark(command, now),
            UiCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            UiCommand::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn notify(&mut self, notification: Notification, now: Instant) {
        let Some(surface) = self.surfaces.notifications.as_mut() else {
            debug!(key = %notification.key(), "Notifications disabled, dropping");
            return;
        };

        if surface.push(notification, now).is_some() {
            let id = surface.identity();
            self.ensure_shown(&id, now);
        }
    }

    fn badge(&mut self, command: BadgeCommand, now: Instant) {
        let badges = &mut self.surfaces.badges;
        let id = badges.identity();

        match command {
            BadgeCommand::Show(name) => {
                if badges.show(&name, now).is_some() {
                    self.ensure_shown(&id, now);
                }
            }
            BadgeCommand::Hide(name) => {
                if badges.hide(&name, now) {
                    self.registry.invalidate(&id);
                }
            }
            BadgeCommand::Toggle(name) => {
                if badges.toggle(&name, now) {
                    self.ensure_shown(&id, now);
                } else {
                    self.registry.invalidate(&id);
                }
            }
            BadgeCommand::SetEnabled(enabled) => {
                badges.set_enabled(enabled);
                info!(enabled, "Module badges switched");
                if !enabled {
                    if let Err(error) = self.registry.dismiss(&id) {
                        warn!(surface = %id, error = %error, "Failed to dismiss badges");
                    }
                } else if !badges.is_empty() {
                    self.ensure_shown(&id, now);
                }
            }
            BadgeCommand::SetStyle(style) => {
                badges.set_style(style);
                self.registry.invalidate(&id);
            }
        }
    }

    fn watermark(&mut self, command: WatermarkCommand, now: Instant) {
        let watermark = &mut self.surfaces.watermark;
        let id = watermark.identity();

        match command {
            WatermarkCommand::SetEnabled(enabled) => {
                watermark.set_enabled(enabled);
                info!(enabled, "Watermark switched");
                if !enabled {
                    if let Err(error) = self.registry.dismiss(&id) {
                        warn!(surface = %id, error = %error, "Failed to dismiss watermark");
                    }
                    self.empty_since.remove(&id);
                }
                return;
            }
            WatermarkCommand::SetPosition(position) => {
                watermark.set_position(position);
                if let Err(error) = self.registry.relayout(&id, watermark.layout(), now) {
                    warn!(surface = %id, error = %error, "Failed to move watermark");
                }
                return;
            }
            WatermarkCommand::SetText(text) => watermark.set_text(&text),
            WatermarkCommand::SetColor(color) => watermark.set_color(color),
            WatermarkCommand::SetTextSize(size) => watermark.set_text_size(size),
            WatermarkCommand::SetOpacity(percent) => watermark.set_opacity(percent),
            WatermarkCommand::SetRainbow(rainbow) => watermark.set_rainbow(rainbow),
            WatermarkCommand::SetShadow(shadow) => watermark.set_shadow(shadow),
        }
        self.registry.invalidate(&id);
    }

    /// Whether `surface` has been switched off and must stay hidden
    fn is_turned_off(&self, surface: &SurfaceId) -> bool {
        let watermark = &self.surfaces.watermark;
        *surface == watermark.identity() && !watermark.is_enabled()
    }

    /// Attach `surface` after a mutation; failure only costs visibility
    fn ensure_shown(&mut self, surface: &SurfaceId, now: Instant) {
        match self.registry.show(surface, now) {
            Ok(ShowOutcome::Attached) => {}
            Ok(ShowOutcome::AlreadyAttached) => self.registry.invalidate(surface),
            Err(error) => {
                warn!(surface = %surface, error = %error, "Overlay unavailable, continuing without it");
            }
        }
        self.empty_since.remove(surface);
    }

    fn tick(&mut self, now: Instant) {
        let Self {
            registry,
            surfaces,
            empty_since,
        } = self;

        if let Some(notifications) = surfaces.notifications.as_mut() {
            tick_surface(registry, empty_since, notifications, now);
        }
        tick_surface(registry, empty_since, &mut surfaces.badges, now);
        tick_surface(registry, empty_since, &mut surfaces.watermark, now);
    }

    fn snapshot(&self) -> OverlaySnapshot {
        let mut surfaces = Vec::with_capacity(3);
        let phases = self.registry.phase_view();

        if let Some(notifications) = &self.surfaces.notifications {
            let id = notifications.identity();
            surfaces.push(SurfaceStatus {
                phase: phases.phase(&id),
                surface: id,
                enabled: true,
                items: item_statuses(notifications.store()),
            });
        }

        let badges = &self.surfaces.badges;
        let id = badges.identity();
        surfaces.push(SurfaceStatus {
            phase: phases.phase(&id),
            surface: id,
            enabled: badges.is_enabled(),
            items: item_statuses(badges.store()),
        });

        let watermark = &self.surfaces.watermark;
        let id = watermark.identity();
        surfaces.push(SurfaceStatus {
            phase: phases.phase(&id),
            surface: id,
            enabled: watermark.is_enabled(),
            items: Vec::new(),
        });

        OverlaySnapshot { surfaces }
    }

    fn shutdown(&mut self) {
        let detached = self.registry.dismiss_all();
        self.empty_since.clear();
        info!(detached, "UI scheduler stopped");
    }
}

/// One frame for one surface: advance, render if needed, dismiss once idle
fn tick_surface(
    registry: &mut OverlaySurfaceRegistry,
    empty_since: &mut HashMap<SurfaceId, Instant>,
    surface: &mut dyn OverlaySurface,
    now: Instant,
) {
    let id = surface.identity();
    let changed = surface.advance(now);

    if !registry.is_shown(&id) {
        empty_since.remove(&id);
        return;
    }

    let invalidated = registry.take_invalidation(&id);
    if changed || invalidated || surface.is_animating() {
        registry.render(&id, |scope| surface.compose(now, scope));
    }

    if !surface.is_empty() {
        empty_since.remove(&id);
        return;
    }

    let since = *empty_since.entry(id.clone()).or_insert(now);
    if now.saturating_duration_since(since) >= surface.empty_grace() {
        empty_since.remove(&id);
        debug!(surface = %id, "Surface idle, dismissing");
        if let Err(error) = registry.dismiss(&id) {
            warn!(surface = %id, error = %error, "Failed to dismiss idle surface");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, HostRejected};
    use crate::surface::{BadgeSettings, NotificationSettings, WatermarkSettings};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn state(badges_enabled: bool) -> (Arc<HeadlessHost>, UiState) {
        let host = Arc::new(HeadlessHost::new());
        let registry = OverlaySurfaceRegistry::new(host.clone());
        let surfaces = SurfaceSet {
            notifications: Some(
                NotificationSurface::new(NotificationSettings::default()).expect("valid settings"),
            ),
            badges: ModuleBadgeSurface::new(BadgeSettings {
                enabled: badges_enabled,
                ..BadgeSettings::default()
            }),
            watermark: WatermarkSurface::new(WatermarkSettings::default()),
        };
        (host, UiState::new(registry, surfaces))
    }

    fn show(
        state: &mut UiState,
        surface: SurfaceId,
        now: Instant,
    ) -> Result<ShowOutcome, LifecycleError> {
        let (reply, mut response) = oneshot::channel();
        let _ = state.handle(UiCommand::Show { surface, reply }, now);
        response.try_recv().expect("show replies immediately")
    }

    fn ms(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    #[test]
    fn test_notification_shows_surface() {
        let (host, mut state) = state(false);
        let t0 = Instant::now();

        let _ = state.handle(
            UiCommand::Notify(Notification::new("Fly", crate::surface::ModuleAction::Enable)),
            t0,
        );

        assert!(host.is_presented(&SurfaceId::notifications()));
        assert_eq!(
            state.snapshot().keys(&SurfaceId::notifications()),
            vec!["Fly-ENABLE"]
        );
    }

    #[test]
    fn test_surface_dismissed_after_grace() {
        let (host, mut state) = state(false);
        let t0 = Instant::now();
        let _ = state.handle(
            UiCommand::Notify(Notification::new("Fly", crate::surface::ModuleAction::Enable)),
            t0,
        );

        state.tick(ms(t0, 16));
        assert!(host.update_count() >= 1);

        // Card gone at 2300ms; window lingers for the 100ms grace
        state.tick(ms(t0, 2310));
        assert!(host.is_presented(&SurfaceId::notifications()));
        state.tick(ms(t0, 2380));
        assert!(host.is_presented(&SurfaceId::notifications()));
        state.tick(ms(t0, 2420));
        assert!(!host.is_presented(&SurfaceId::notifications()));
    }

    #[test]
    fn test_new_item_during_grace_keeps_window() {
        let (host, mut state) = state(false);
        let t0 = Instant::now();
        let _ = state.handle(
            UiCommand::Notify(Notification::new("Fly", crate::surface::ModuleAction::Enable)),
            t0,
        );

        state.tick(ms(t0, 2310));
        let _ = state.handle(
            UiCommand::Notify(Notification::new("Fly", crate::surface::ModuleAction::Disable)),
            ms(t0, 2350),
        );
        state.tick(ms(t0, 2450));

        assert!(host.is_presented(&SurfaceId::notifications()));
        assert_eq!(host.present_count(), 1);
    }

    #[test]
    fn test_disabled_badges_never_present() {
        let (host, mut state) = state(false);

        let _ = state.handle(UiCommand::Badge(BadgeCommand::Show("Fly".into())), Instant::now());

        assert!(!host.is_presented(&SurfaceId::module_badges()));
        assert!(state.snapshot().keys(&SurfaceId::module_badges()).is_empty());
    }

    #[test]
    fn test_disabling_badges_dismisses_window() {
        let (host, mut state) = state(true);
        let t0 = Instant::now();

        let _ = state.handle(UiCommand::Badge(BadgeCommand::Show("Fly".into())), t0);
        assert!(host.is_presented(&SurfaceId::module_badges()));

        let _ = state.handle(UiCommand::Badge(BadgeCommand::SetEnabled(false)), t0);
        assert!(!host.is_presented(&SurfaceId::module_badges()));

        let _ = state.handle(UiCommand::Badge(BadgeCommand::SetEnabled(true)), t0);
        assert!(host.is_presented(&SurfaceId::module_badges()));
    }

    #[test]
    fn test_host_rejection_is_not_fatal() {
        let (host, mut state) = state(true);
        host.reject_with(Some(HostRejected::MissingPermission));
        let t0 = Instant::now();

        let _ = state.handle(UiCommand::Badge(BadgeCommand::Show("Fly".into())), t0);
        assert!(state.snapshot().keys(&SurfaceId::module_badges()) == vec!["Fly"]);

        host.reject_with(None);
        let _ = state.handle(UiCommand::Badge(BadgeCommand::Show("Speed".into())), t0);
        assert!(host.is_presented(&SurfaceId::module_badges()));
    }

    #[test]
    fn test_shutdown_dismisses_everything() {
        let (host, mut state) = state(true);
        let t0 = Instant::now();
        let _ = state.handle(UiCommand::Badge(BadgeCommand::Show("Fly".into())), t0);
        let _ = state.handle(
            UiCommand::Notify(Notification::new("Fly", crate::surface::ModuleAction::Enable)),
            t0,
        );

        let (reply, _response) = oneshot::channel();
        let flow = state.handle(UiCommand::Shutdown { reply }, t0);

        assert!(flow.is_break());
        assert_eq!(host.live_windows(), 0);
    }

    #[test]
    fn test_snapshot_reports_phases() {
        let (_host, mut state) = state(true);
        let _ = state.handle(
            UiCommand::Badge(BadgeCommand::Show("Fly".into())),
            Instant::now(),
        );

        let snapshot = state.snapshot();
        let badges = snapshot
            .surface(&SurfaceId::module_badges())
            .expect("badge surface listed");
        assert_eq!(badges.phase, SurfacePhase::Attached);
        assert!(badges.enabled);
        assert_eq!(
            snapshot
                .surface(&SurfaceId::notifications())
                .map(|status| status.phase),
            Some(SurfacePhase::Detached)
        );
    }

    #[test]
    fn test_watermark_stays_until_dismissed() {
        let (host, mut state) = state(false);
        let id = SurfaceId::watermark();
        let t0 = Instant::now();

        assert_eq!(show(&mut state, id.clone(), t0), Ok(ShowOutcome::Attached));
        state.tick(ms(t0, 16));
        state.tick(ms(t0, 60_000));

        assert!(host.is_presented(&id));
        let frame = host.last_frame(&id).expect("watermark rendered");
        assert_eq!(frame.rows.len(), 1);
        assert_eq!(frame.rows[0].text, "Lumina");
        assert_eq!(frame.rows[0].detail, None);

        let (reply, _response) = oneshot::channel();
        let _ = state.handle(UiCommand::Dismiss { surface: id.clone(), reply }, ms(t0, 60_016));
        assert!(!host.is_presented(&id));
    }

    #[test]
    fn test_watermark_text_change_rerenders() {
        let (host, mut state) = state(false);
        let id = SurfaceId::watermark();
        let t0 = Instant::now();

        show(&mut state, id.clone(), t0).expect("shown");
        state.tick(ms(t0, 16));
        let _ = state.handle(
            UiCommand::Watermark(WatermarkCommand::SetText("build 42".into())),
            ms(t0, 20),
        );
        state.tick(ms(t0, 32));

        let frame = host.last_frame(&id).expect("watermark rendered");
        assert_eq!(frame.rows[0].detail.as_deref(), Some("build 42"));
        assert_eq!(host.update_count(), 2);
    }

    #[test]
    fn test_turning_watermark_off_dismisses_and_blocks_show() {
        let (host, mut state) = state(false);
        let id = SurfaceId::watermark();
        let t0 = Instant::now();

        show(&mut state, id.clone(), t0).expect("shown");
        let _ = state.handle(UiCommand::Watermark(WatermarkCommand::SetEnabled(false)), t0);

        assert!(!host.is_presented(&id));
        assert_eq!(show(&mut state, id.clone(), t0), Err(LifecycleError::Disabled(id.clone())));
        assert_eq!(host.present_count(), 1);

        let _ = state.handle(UiCommand::Watermark(WatermarkCommand::SetEnabled(true)), t0);
        assert!(!host.is_presented(&id));
        assert_eq!(show(&mut state, id.clone(), t0), Ok(ShowOutcome::Attached));

        let snapshot = state.snapshot();
        let status = snapshot.surface(&id).expect("watermark listed");
        assert!(status.enabled);
        assert!(status.items.is_empty());
    }

    #[test]
    fn test_moving_watermark_presents_again() {
        let (host, mut state) = state(false);
        let id = SurfaceId::watermark();
        let t0 = Instant::now();

        show(&mut state, id.clone(), t0).expect("shown");
        let _ = state.handle(
            UiCommand::Watermark(WatermarkCommand::SetPosition(Anchor::BottomStart)),
            t0,
        );

        assert!(host.is_presented(&id));
        assert_eq!(host.present_count(), 2);
        assert_eq!(
            host.last_layout(&id).map(|layout| layout.anchor),
            Some(Anchor::BottomStart)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_frame_interval_is_raised() {
        let host = Arc::new(HeadlessHost::new());
        let (_, state) = state(false);
        let config = SchedulerConfig {
            frame_interval: Duration::ZERO,
            ..SchedulerConfig::default()
        };
        let (scheduler, ui) = UiScheduler::new(
            &config,
            OverlaySurfaceRegistry::new(host.clone()),
            state.surfaces,
        );
        let task = tokio::spawn(scheduler.run());

        assert_eq!(
            ui.dispatch(UiCommand::Notify(Notification::new(
                "Fly",
                crate::surface::ModuleAction::Enable
            ))),
            Ok(())
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!ui.is_closed());
        assert!(host.is_presented(&SurfaceId::notifications()));

        ui.request(|reply| UiCommand::Shutdown { reply })
            .await
            .expect("scheduler running");
        task.await.expect("scheduler task finished cleanly");
    }
}
