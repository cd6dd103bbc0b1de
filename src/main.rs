//! Chainbot - a Matrix bot running chains of commands.
//!
//! A message starting with one of the room prefixes is a chain: one
//! sub-command per line, run one after the other. Chains of more than one step
//! get a progress report that is edited live as the steps complete.
//!
//! ```text
//! !help board
//! othello start
//! othello put D3
//! ```
//!
//! # Configuration
//!
//! On first start a template is written at the `--config` path and the bot
//! exits; fill in the account and start it again. See [`config`] for the
//! format and the `CHAINBOT_` environment overrides.
//!
//! # Usage
//!
//! ```bash
//! chainbot --config config.yaml --data ./data
//! ```
//!
//! # Architecture
//!
//! - [`bot`] - Wires the Matrix transport to the orchestrator
//! - [`commands`] - Prefixes, locks, chains, progress reports and commands
//! - [`config`] - YAML configuration with environment overrides
//! - [`matrix`] - Matrix login, sync and messaging
//! - [`othello`] - Board engine of the `othello` command
//! - [`storage`] - Per-room settings
//! - [`utils`] - Path helpers
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use std::path::Path;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{
    bot::Bot,
    config::{CONFIG_TEMPLATE, Config},
};

mod bot;
mod commands;
mod config;
mod matrix;
mod othello;
mod storage;
mod utils;

/// Command-line arguments of the bot.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file, created from a template when
    /// missing.
    #[arg(short, long)]
    config: String,

    /// Directory for persistent data.
    ///
    /// - `session/` - Matrix session and encrypted state store
    /// - `servers.json` - Per-room prefixes
    ///
    /// It holds the access token of the bot account, restrict its permissions.
    #[arg(short, long)]
    data: String,
}

#[tokio::main]
async fn main() {
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting chainbot {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    if !Path::new(&args.config).exists() {
        match std::fs::write(&args.config, CONFIG_TEMPLATE) {
            Ok(_) => info!(
                "Created {}: add the bot account under accounts.main, then start again",
                args.config
            ),
            Err(e) => error!("Failed to create config file {}: {}", args.config, e),
        }
        return;
    }

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {:#}", e);
            return;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&args.data) {
        error!("Failed to create data directory {}: {}", args.data, e);
        return;
    }

    let bot = match Bot::new(config, args).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to initialize bot: {:#}", e);
            return;
        }
    };
    bot.start().await;
}
