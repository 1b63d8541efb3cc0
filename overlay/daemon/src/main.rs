//! Overlay Daemon - Headless Driver for the Overlay Engine
//!
//! Runs the overlay engine against an in-process host that draws nothing,
//! driven by commands read from stdin. Useful for exercising animation
//! timing, queue behavior and lifecycle logging without a display.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! overlay-daemon
//!
//! # With config file and badges on
//! overlay-daemon --config ~/.config/overlay/overlay.toml --badges
//!
//! # Watermark up from the start
//! overlay-daemon --watermark --watermark-text "build 42"
//!
//! # Verbose logging
//! RUST_LOG=debug overlay-daemon
//! ```
//!
//! Type `enable Fly`, `status` or `quit` at the prompt; see [`console`] for
//! the full command list.

mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use overlay_core::{
    load_config_from_path, BadgeStyle, ConfigOverrides, HeadlessHost, OverlayContext,
};

use console::ConsoleCommand;

/// Overlay Daemon - drive overlay surfaces from the command line
#[derive(Parser, Debug)]
#[command(name = "overlay-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "OVERLAY_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Frame interval in milliseconds
    #[arg(long, value_name = "MS")]
    frame_interval_ms: Option<u64>,

    /// Turn the module badge list on
    #[arg(short = 'b', long)]
    badges: bool,

    /// Badge coloring (gradient, rainbow)
    #[arg(long, value_name = "STYLE")]
    badge_style: Option<BadgeStyle>,

    /// Maximum notification cards on screen
    #[arg(long, value_name = "N")]
    notification_capacity: Option<usize>,

    /// Show the watermark at startup
    #[arg(short = 'w', long)]
    watermark: bool,

    /// Second watermark line
    #[arg(long, value_name = "TEXT")]
    watermark_text: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "OVERLAY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ms) = self.frame_interval_ms {
            overrides = overrides.with_frame_interval_ms(ms);
        }
        if self.badges {
            overrides = overrides.with_badges_enabled(true);
        }
        if let Some(style) = self.badge_style {
            overrides = overrides.with_badge_style(style);
        }
        if let Some(capacity) = self.notification_capacity {
            overrides = overrides.with_notification_capacity(capacity);
        }
        if let Some(ref text) = self.watermark_text {
            overrides = overrides.with_watermark_text(text.as_str());
        }
        overrides
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("overlay_daemon={level},overlay_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Read console commands until `quit`, end of input or Ctrl-C
async fn run_console(context: &OverlayContext) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, initiating shutdown");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("Input closed");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                match ConsoleCommand::parse(&line) {
                    Ok(command) => {
                        if !console::execute(context, command).await? {
                            return Ok(());
                        }
                    }
                    Err(error) => warn!(input = %line.trim(), error = %error, "Ignoring command"),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging first
    init_logging(&args.log_level);

    info!("Overlay daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config =
        load_config_from_path(args.config.clone()).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line override")?;
    info!(source = ?config.source(), path = ?config.config_file_path, "Configuration loaded");

    let host = Arc::new(HeadlessHost::new());
    let context =
        OverlayContext::start(&config, host.clone()).context("Failed to start overlay engine")?;

    if args.watermark {
        match context.watermark().show().await {
            Ok(outcome) => info!(outcome = ?outcome, "Watermark shown"),
            Err(error) => warn!(error = %error, "Watermark unavailable"),
        }
    }

    let result = run_console(&context).await;

    info!("Shutting down...");
    context.shutdown().await;
    info!(
        presented = host.present_count(),
        removed = host.remove_count(),
        frames = host.update_count(),
        "Host summary"
    );

    match result {
        Ok(()) => {
            info!("Overlay daemon stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Daemon stopped with error");
            Err(e)
        }
    }
}
