//! Built-in command handlers.
//!
//! Each extension is a group of commands that can be switched on from the
//! `bot.extensions` list of the configuration. [`build_registry`] registers the
//! listed extensions; `help` is not an extension, the orchestrator answers it
//! itself.
//!
//! # Available Extensions
//!
//! - `othello` - [`OthelloCommand`], two-player Othello matches per channel

use std::sync::Arc;

use log::{error, info};

use crate::{
    commands::registry::CommandRegistry,
    othello::StandardBoard,
};

mod othello;

pub use crate::commands::actions::othello::OthelloCommand;

/// Builds a registry holding the handlers of the given extensions.
///
/// Unknown extension names are logged and skipped.
pub fn build_registry(extensions: &[String]) -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    for extension in extensions {
        match extension.as_str() {
            "othello" => {
                registry.register("othello", Arc::new(OthelloCommand::new(StandardBoard::new)))
            }
            unknown => {
                error!("unknown extension {}, skipping it", unknown);
                continue;
            }
        }
        info!("loaded extension {}", extension);
    }

    registry
}
