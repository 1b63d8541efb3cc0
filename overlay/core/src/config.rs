//! TOML Configuration File Support
//!
//! Centralized configuration for the overlay engine, read from
//! `~/.config/overlay/overlay.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/overlay/overlay.toml` (typically `~/.config/overlay/overlay.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [scheduler]
//! frame_interval_ms = 16
//! command_queue_depth = 256
//!
//! [notification]
//! enabled = true
//! capacity = 3
//! entry_stagger_ms = 50
//! hold_ms = 2000
//! exit_ms = 300
//! empty_grace_ms = 100
//! progress_ms = 2500
//!
//! [module_badges]
//! enabled = true
//! style = "rainbow"
//! case = "upper"
//! entry_stagger_ms = 50
//! exit_ms = 300
//! empty_grace_ms = 100
//!
//! [watermark]
//! enabled = true
//! title = "Lumina"
//! text = "my build"
//! color = "#FFFFFF"
//! text_size = 28
//! opacity = 80
//! rainbow = false
//! shadow = true
//! position = "top_start"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::Anchor;
use crate::scheduler::SchedulerConfig;
use crate::surface::{
    BadgeSettings, BadgeStyle, DisplayCase, NotificationSettings, Rgba, WatermarkSettings,
    WATERMARK_TEXT_SIZES,
};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Scheduler section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerToml {
    /// Frame tick interval in milliseconds
    pub frame_interval_ms: Option<u64>,

    /// Depth of the UI command queue
    pub command_queue_depth: Option<usize>,
}

/// Notification section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationToml {
    /// Whether notification cards are shown
    pub enabled: Option<bool>,

    /// Maximum cards on screen
    pub capacity: Option<usize>,

    /// Delay between consecutive card entries in milliseconds
    pub entry_stagger_ms: Option<u64>,

    /// Time a card stays fully visible in milliseconds
    pub hold_ms: Option<u64>,

    /// Exit animation length in milliseconds
    pub exit_ms: Option<u64>,

    /// Time the window stays up once empty, in milliseconds
    pub empty_grace_ms: Option<u64>,

    /// Countdown bar length in milliseconds
    pub progress_ms: Option<u64>,
}

/// Module badge section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleBadgesToml {
    /// Whether the badge list is shown
    pub enabled: Option<bool>,

    /// `gradient` or `rainbow`
    pub style: Option<BadgeStyle>,

    /// `as_is`, `upper`, `lower` or `capitalized`
    pub case: Option<DisplayCase>,

    /// Delay between consecutive badge entries in milliseconds
    pub entry_stagger_ms: Option<u64>,

    /// Exit animation length in milliseconds
    pub exit_ms: Option<u64>,

    /// Time the window stays up once empty, in milliseconds
    pub empty_grace_ms: Option<u64>,
}

/// Watermark section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkToml {
    /// Whether the watermark may be shown
    pub enabled: Option<bool>,

    /// First line
    pub title: Option<String>,

    /// Second line
    pub text: Option<String>,

    /// `#RRGGBB` or `#RRGGBBAA`
    pub color: Option<String>,

    /// Text size in logical pixels (5 to 300)
    pub text_size: Option<u16>,

    /// Opacity in percent (0 to 100)
    pub opacity: Option<u8>,

    /// Cycle the hue
    pub rainbow: Option<bool>,

    /// Draw a drop shadow
    pub shadow: Option<bool>,

    /// `top_start`, `top_end`, `bottom_start`, `bottom_end` or `center`
    pub position: Option<Anchor>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayToml {
    /// Scheduler configuration section
    pub scheduler: SchedulerToml,

    /// Notification configuration section
    pub notification: NotificationToml,

    /// Module badge configuration section
    pub module_badges: ModuleBadgesToml,

    /// Watermark configuration section
    pub watermark: WatermarkToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Centralized configuration for the overlay engine
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayConfig {
    /// UI scheduler tuning
    pub scheduler: SchedulerConfig,

    /// Whether notification cards are shown
    pub notifications_enabled: bool,

    /// Notification surface tuning
    pub notification: NotificationSettings,

    /// Module badge surface tuning
    pub badges: BadgeSettings,

    /// Watermark tuning
    pub watermark: WatermarkSettings,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            notifications_enabled: true,
            notification: NotificationSettings::default(),
            badges: BadgeSettings::default(),
            watermark: WatermarkSettings::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl OverlayConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reject values the engine cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notification.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "notification.capacity must be at least 1".to_string(),
            ));
        }
        if self.scheduler.frame_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "scheduler.frame_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.scheduler.command_queue_depth == 0 {
            return Err(ConfigError::ValidationError(
                "scheduler.command_queue_depth must be at least 1".to_string(),
            ));
        }
        if !WATERMARK_TEXT_SIZES.contains(&self.watermark.text_size) {
            return Err(ConfigError::ValidationError(format!(
                "watermark.text_size must be between {} and {}",
                WATERMARK_TEXT_SIZES.start(),
                WATERMARK_TEXT_SIZES.end()
            )));
        }
        if self.watermark.opacity > 100 {
            return Err(ConfigError::ValidationError(
                "watermark.opacity must be at most 100".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/overlay/overlay.toml` or
/// `~/.config/overlay/overlay.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("overlay").join("overlay.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// merged values fail validation. A missing config file is not an error.
pub fn load_config() -> Result<OverlayConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the merged values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<OverlayConfig, ConfigError> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// Load configuration from a specific path and an explicit environment
///
/// `env` maps a variable name to its value, if set.
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<OverlayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = OverlayConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: OverlayToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, &env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut OverlayConfig, toml: &OverlayToml) -> Result<(), ConfigError> {
    // Scheduler settings
    if let Some(ms) = toml.scheduler.frame_interval_ms {
        config.scheduler.frame_interval = Duration::from_millis(ms);
    }
    if let Some(depth) = toml.scheduler.command_queue_depth {
        config.scheduler.command_queue_depth = depth;
    }

    // Notification settings
    let notification = &mut config.notification;
    if let Some(enabled) = toml.notification.enabled {
        config.notifications_enabled = enabled;
    }
    if let Some(capacity) = toml.notification.capacity {
        notification.capacity = capacity;
    }
    if let Some(ms) = toml.notification.entry_stagger_ms {
        notification.timing.entry_stagger = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.notification.hold_ms {
        notification.timing.hold = Some(Duration::from_millis(ms));
    }
    if let Some(ms) = toml.notification.exit_ms {
        notification.timing.exit = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.notification.empty_grace_ms {
        notification.empty_grace = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.notification.progress_ms {
        notification.progress = Duration::from_millis(ms);
    }

    // Badge settings
    let badges = &mut config.badges;
    if let Some(enabled) = toml.module_badges.enabled {
        badges.enabled = enabled;
    }
    if let Some(style) = toml.module_badges.style {
        badges.style = style;
    }
    if let Some(case) = toml.module_badges.case {
        badges.case = case;
    }
    if let Some(ms) = toml.module_badges.entry_stagger_ms {
        badges.timing.entry_stagger = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.module_badges.exit_ms {
        badges.timing.exit = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.module_badges.empty_grace_ms {
        badges.empty_grace = Duration::from_millis(ms);
    }

    // Watermark settings
    let watermark = &mut config.watermark;
    if let Some(enabled) = toml.watermark.enabled {
        watermark.enabled = enabled;
    }
    if let Some(ref title) = toml.watermark.title {
        watermark.title.clone_from(title);
    }
    if let Some(ref text) = toml.watermark.text {
        watermark.text.clone_from(text);
    }
    if let Some(ref color) = toml.watermark.color {
        watermark.color = Rgba::from_hex(color).ok_or_else(|| {
            ConfigError::ValidationError(format!("watermark.color '{color}' is not #RRGGBB"))
        })?;
    }
    if let Some(size) = toml.watermark.text_size {
        watermark.text_size = size;
    }
    if let Some(opacity) = toml.watermark.opacity {
        watermark.opacity = opacity;
    }
    if let Some(rainbow) = toml.watermark.rainbow {
        watermark.rainbow = rainbow;
    }
    if let Some(shadow) = toml.watermark.shadow {
        watermark.shadow = shadow;
    }
    if let Some(position) = toml.watermark.position {
        watermark.position = position;
    }

    Ok(())
}

fn parse_flag(value: &str) -> bool {
    value != "0" && value.to_lowercase() != "false"
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut OverlayConfig, env: &dyn Fn(&str) -> Option<String>) {
    if let Some(interval) = env("OVERLAY_FRAME_INTERVAL_MS") {
        if let Ok(ms) = interval.parse::<u64>() {
            config.scheduler.frame_interval = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(capacity) = env("OVERLAY_NOTIFICATION_CAPACITY") {
        if let Ok(n) = capacity.parse::<usize>() {
            config.notification.capacity = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(enabled) = env("OVERLAY_NOTIFICATIONS_ENABLED") {
        config.notifications_enabled = parse_flag(&enabled);
        config.source = ConfigSource::Env;
    }
    if let Some(enabled) = env("OVERLAY_BADGES_ENABLED") {
        config.badges.enabled = parse_flag(&enabled);
        config.source = ConfigSource::Env;
    }
    if let Some(enabled) = env("OVERLAY_WATERMARK_ENABLED") {
        config.watermark.enabled = parse_flag(&enabled);
        config.source = ConfigSource::Env;
    }
    if let Some(text) = env("OVERLAY_WATERMARK_TEXT") {
        config.watermark.text = text;
        config.source = ConfigSource::Env;
    }
    if let Some(style) = env("OVERLAY_BADGE_STYLE") {
        match style.parse::<BadgeStyle>() {
            Ok(style) => {
                config.badges.style = style;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring OVERLAY_BADGE_STYLE"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Frame interval override (milliseconds)
    pub frame_interval_ms: Option<u64>,

    /// Badge list enabled override
    pub badges_enabled: Option<bool>,

    /// Badge style override
    pub badge_style: Option<BadgeStyle>,

    /// Notification capacity override
    pub notification_capacity: Option<usize>,

    /// Watermark text override
    pub watermark_text: Option<String>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set frame interval override
    #[must_use]
    pub fn with_frame_interval_ms(mut self, ms: u64) -> Self {
        self.frame_interval_ms = Some(ms);
        self
    }

    /// Set badge list enabled override
    #[must_use]
    pub fn with_badges_enabled(mut self, enabled: bool) -> Self {
        self.badges_enabled = Some(enabled);
        self
    }

    /// Set badge style override
    #[must_use]
    pub fn with_badge_style(mut self, style: BadgeStyle) -> Self {
        self.badge_style = Some(style);
        self
    }

    /// Set notification capacity override
    #[must_use]
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = Some(capacity);
        self
    }

    /// Set watermark text override
    #[must_use]
    pub fn with_watermark_text(mut self, text: impl Into<String>) -> Self {
        self.watermark_text = Some(text.into());
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override makes the
    /// configuration invalid.
    pub fn apply(&self, config: &mut OverlayConfig) -> Result<(), ConfigError> {
        if self.frame_interval_ms.is_some()
            || self.badges_enabled.is_some()
            || self.badge_style.is_some()
            || self.notification_capacity.is_some()
            || self.watermark_text.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ms) = self.frame_interval_ms {
            config.scheduler.frame_interval = Duration::from_millis(ms);
        }
        if let Some(enabled) = self.badges_enabled {
            config.badges.enabled = enabled;
        }
        if let Some(style) = self.badge_style {
            config.badges.style = style;
        }
        if let Some(capacity) = self.notification_capacity {
            config.notification.capacity = capacity;
        }
        if let Some(ref text) = self.watermark_text {
            config.watermark.text.clone_from(text);
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
