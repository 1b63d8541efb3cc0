//! Line-oriented control console
//!
//! Each stdin line is one command:
//!
//! ```text
//! enable <module>        announce + badge
//! disable <module>       announce + hide badge
//! show <surface>         attach a surface
//! dismiss <surface>      detach a surface
//! badges on|off          turn the badge list on or off
//! style gradient|rainbow change badge coloring
//! watermark show|hide    put the watermark on or off screen
//! watermark on|off       allow or forbid the watermark
//! watermark text <text>  set the second watermark line
//! watermark position <p> top_start, top_end, bottom_start, bottom_end, center
//! watermark rainbow on|off
//! watermark opacity <0-100>
//! status                 print a JSON snapshot
//! quit                   shut down
//! ```
//!
//! Commands the engine cannot take right now are logged and skipped; only
//! `quit` and end of input stop the console.

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};

use overlay_core::{Anchor, BadgeStyle, OverlayContext, SurfaceId, ToggleListener};

/// Watermark console subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkAction {
    Show,
    Hide,
    Enable(bool),
    Text(String),
    Position(Anchor),
    Rainbow(bool),
    Opacity(u8),
}

/// Parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Enable(String),
    Disable(String),
    Show(SurfaceId),
    Dismiss(SurfaceId),
    Badges(bool),
    Style(BadgeStyle),
    Watermark(WatermarkAction),
    Status,
    Quit,
}

/// Rejected console input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn parse_switch(value: &str) -> Result<bool, ParseError> {
    match value {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(ParseError::InvalidArgument(other.to_string())),
    }
}

fn parse_watermark(rest: &str) -> Result<WatermarkAction, ParseError> {
    let (action, value) = rest.split_once(' ').unwrap_or((rest, ""));
    let value = value.trim();
    let needs = |expected: &'static str| {
        if value.is_empty() {
            Err(ParseError::MissingArgument {
                command: "watermark",
                expected,
            })
        } else {
            Ok(value)
        }
    };

    match action.to_ascii_lowercase().as_str() {
        "show" => Ok(WatermarkAction::Show),
        "hide" | "dismiss" => Ok(WatermarkAction::Hide),
        "on" => Ok(WatermarkAction::Enable(true)),
        "off" => Ok(WatermarkAction::Enable(false)),
        "text" => Ok(WatermarkAction::Text(needs("some text")?.to_string())),
        "position" => needs("a position")?
            .parse()
            .map(WatermarkAction::Position)
            .map_err(ParseError::InvalidArgument),
        "rainbow" => parse_switch(needs("on or off")?).map(WatermarkAction::Rainbow),
        "opacity" => {
            let value = needs("a percentage")?;
            value
                .parse::<u8>()
                .ok()
                .filter(|percent| *percent <= 100)
                .map(WatermarkAction::Opacity)
                .ok_or_else(|| ParseError::InvalidArgument(value.to_string()))
        }
        other => Err(ParseError::InvalidArgument(other.to_string())),
    }
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ParseError::Empty);
        };
        let rest = words.collect::<Vec<_>>().join(" ");

        let argument = |command: &'static str, expected: &'static str| {
            if rest.is_empty() {
                Err(ParseError::MissingArgument { command, expected })
            } else {
                Ok(rest.clone())
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "enable" | "on" => Ok(Self::Enable(argument("enable", "a module name")?)),
            "disable" | "off" => Ok(Self::Disable(argument("disable", "a module name")?)),
            "show" => Ok(Self::Show(SurfaceId::new(argument("show", "a surface")?))),
            "dismiss" | "hide" => Ok(Self::Dismiss(SurfaceId::new(argument(
                "dismiss",
                "a surface",
            )?))),
            "badges" => parse_switch(&argument("badges", "on or off")?).map(Self::Badges),
            "style" => argument("style", "gradient or rainbow")?
                .parse()
                .map(Self::Style)
                .map_err(ParseError::InvalidArgument),
            "watermark" => {
                parse_watermark(&argument("watermark", "an action")?).map(Self::Watermark)
            }
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Log a command the engine did not take
fn skipped<E: std::fmt::Display>(what: &str, result: Result<(), E>) {
    if let Err(error) = result {
        warn!(command = what, error = %error, "Command skipped");
    }
}

async fn execute_watermark(context: &OverlayContext, action: WatermarkAction) {
    let watermark = context.watermark();
    match action {
        WatermarkAction::Show => match watermark.show().await {
            Ok(outcome) => info!(outcome = ?outcome, "Watermark shown"),
            Err(error) => warn!(error = %error, "Watermark show failed"),
        },
        WatermarkAction::Hide => match watermark.dismiss().await {
            Ok(outcome) => info!(outcome = ?outcome, "Watermark dismissed"),
            Err(error) => warn!(error = %error, "Watermark dismiss failed"),
        },
        WatermarkAction::Enable(enabled) => skipped("watermark", watermark.set_enabled(enabled)),
        WatermarkAction::Text(text) => skipped("watermark text", watermark.set_text(&text)),
        WatermarkAction::Position(position) => {
            skipped("watermark position", watermark.set_position(position));
        }
        WatermarkAction::Rainbow(rainbow) => {
            skipped("watermark rainbow", watermark.set_rainbow(rainbow));
        }
        WatermarkAction::Opacity(percent) => {
            skipped("watermark opacity", watermark.set_opacity(percent));
        }
    }
}

/// Run one command; returns `false` when the console should stop
///
/// # Errors
///
/// Only when the status snapshot cannot be written to stdout.
pub async fn execute(context: &OverlayContext, command: ConsoleCommand) -> Result<bool> {
    match command {
        ConsoleCommand::Enable(module) => context.on_toggle(&module, true),
        ConsoleCommand::Disable(module) => context.on_toggle(&module, false),
        ConsoleCommand::Show(surface) => match context.registry().show(&surface).await {
            Ok(outcome) => info!(surface = %surface, outcome = ?outcome, "Show"),
            Err(error) => warn!(surface = %surface, error = %error, "Show failed"),
        },
        ConsoleCommand::Dismiss(surface) => match context.registry().dismiss(&surface).await {
            Ok(outcome) => info!(surface = %surface, outcome = ?outcome, "Dismiss"),
            Err(error) => warn!(surface = %surface, error = %error, "Dismiss failed"),
        },
        ConsoleCommand::Badges(enabled) => {
            skipped("badges", context.module_badges().set_enabled(enabled));
        }
        ConsoleCommand::Style(style) => skipped("style", context.module_badges().set_style(style)),
        ConsoleCommand::Watermark(action) => execute_watermark(context, action).await,
        ConsoleCommand::Status => match context.registry().snapshot().await {
            Ok(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            Err(error) => warn!(command = "status", error = %error, "Command skipped"),
        },
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::{HeadlessHost, OverlayConfig};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_parse_module_commands() {
        assert_eq!(
            ConsoleCommand::parse("enable Kill Aura"),
            Ok(ConsoleCommand::Enable("Kill Aura".to_string()))
        );
        assert_eq!(
            ConsoleCommand::parse("  disable   Fly "),
            Ok(ConsoleCommand::Disable("Fly".to_string()))
        );
    }

    #[test]
    fn test_parse_surface_commands() {
        assert_eq!(
            ConsoleCommand::parse("show notifications"),
            Ok(ConsoleCommand::Show(SurfaceId::notifications()))
        );
        assert_eq!(
            ConsoleCommand::parse("dismiss module-badges"),
            Ok(ConsoleCommand::Dismiss(SurfaceId::module_badges()))
        );
    }

    #[test]
    fn test_parse_badge_settings() {
        assert_eq!(
            ConsoleCommand::parse("badges on"),
            Ok(ConsoleCommand::Badges(true))
        );
        assert_eq!(
            ConsoleCommand::parse("style rainbow"),
            Ok(ConsoleCommand::Style(BadgeStyle::Rainbow))
        );
        assert!(matches!(
            ConsoleCommand::parse("badges maybe"),
            Err(ParseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_watermark_commands() {
        assert_eq!(
            ConsoleCommand::parse("watermark show"),
            Ok(ConsoleCommand::Watermark(WatermarkAction::Show))
        );
        assert_eq!(
            ConsoleCommand::parse("watermark text my build 42"),
            Ok(ConsoleCommand::Watermark(WatermarkAction::Text(
                "my build 42".to_string()
            )))
        );
        assert_eq!(
            ConsoleCommand::parse("watermark position top-end"),
            Ok(ConsoleCommand::Watermark(WatermarkAction::Position(
                Anchor::TopEnd
            )))
        );
        assert_eq!(
            ConsoleCommand::parse("watermark rainbow on"),
            Ok(ConsoleCommand::Watermark(WatermarkAction::Rainbow(true)))
        );
        assert_eq!(
            ConsoleCommand::parse("watermark opacity 101"),
            Err(ParseError::InvalidArgument("101".to_string()))
        );
        assert_eq!(
            ConsoleCommand::parse("watermark text"),
            Err(ParseError::MissingArgument {
                command: "watermark",
                expected: "some text",
            })
        );
    }

    #[tokio::test]
    async fn test_full_queue_does_not_stop_console() {
        let mut config = OverlayConfig::default();
        config.scheduler.command_queue_depth = 1;
        let context = OverlayContext::start(&config, Arc::new(HeadlessHost::new()))
            .expect("config is valid");

        // Nothing drains the queue until this task yields
        assert_eq!(context.notifications().on_module_enabled("Fly"), Ok(()));

        for command in [
            ConsoleCommand::Badges(true),
            ConsoleCommand::Style(BadgeStyle::Rainbow),
            ConsoleCommand::Watermark(WatermarkAction::Rainbow(true)),
            ConsoleCommand::Enable("Speed".to_string()),
        ] {
            assert!(execute(&context, command).await.expect("console keeps running"));
        }

        context.shutdown().await;
        assert!(execute(&context, ConsoleCommand::Status)
            .await
            .expect("console keeps running"));
        assert!(!execute(&context, ConsoleCommand::Quit).await.expect("quit"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ConsoleCommand::parse("   "), Err(ParseError::Empty));
        assert_eq!(
            ConsoleCommand::parse("enable"),
            Err(ParseError::MissingArgument {
                command: "enable",
                expected: "a module name",
            })
        );
        assert_eq!(
            ConsoleCommand::parse("launch"),
            Err(ParseError::Unknown("launch".to_string()))
        );
    }
}
