//! Configuration file structures for the chainbot.
//!
//! The configuration is a YAML file that can be overridden by environment
//! variables prefixed with `CHAINBOT_`, nested keys being separated by `__`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Account profile used to log in
//! using: main
//!
//! accounts:
//!   main:
//!     user_id: "@chainbot:example.org"
//!     password: "secret-password"
//!     # Passphrase of the local session store
//!     passphrase: "store-passphrase"
//!
//! bot:
//!   # Prefixes of servers without settings in servers.json
//!   default_prefixes: ["!"]
//!   # Pause between two steps of a chain, in milliseconds
//!   step_delay_ms: 1000
//!   # Help index, a mapping of entries with a description and a usage
//!   help_path: help.yml
//!   # Command groups to register
//!   extensions: [othello]
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export CHAINBOT_USING="staging"
//! export CHAINBOT_ACCOUNTS__STAGING__PASSWORD="secret-from-env"
//! export CHAINBOT_BOT__STEP_DELAY_MS=500
//! ```

use std::collections::HashMap;

use anyhow::{Context, anyhow};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

/// Prefix of the environment variables overriding the file.
pub const ENV_PREFIX: &str = "CHAINBOT_";

/// Written when no configuration file exists yet.
pub const CONFIG_TEMPLATE: &str = r#"using: main

accounts:
  main:
    user_id: "<YOUR BOT USER ID HERE>"
    password: "<YOUR BOT PASSWORD HERE>"
    passphrase: "<A PASSPHRASE FOR THE SESSION STORE>"

bot:
  default_prefixes: ["!"]
  step_delay_ms: 1000
  help_path: help.yml
  extensions: [othello]
"#;

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Name of the profile in `accounts` to log in with
    pub using: String,
    pub accounts: HashMap<String, Account>,
    pub bot: BotSettings,
}

/// Credentials of one bot account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Fully qualified Matrix user ID, such as `@chainbot:example.org`
    pub user_id: String,

    /// Used for the first login only, the session is restored afterwards.
    pub password: String,

    /// Encrypts the local sqlite store.
    pub passphrase: String,
}

/// Behavior of the command orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct BotSettings {
    #[serde(default = "default_prefixes")]
    pub default_prefixes: Vec<String>,

    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    #[serde(default = "default_help_path")]
    pub help_path: String,

    /// Required, an absent list is a configuration error.
    pub extensions: Vec<String>,
}

fn default_prefixes() -> Vec<String> {
    vec!["!".to_owned()]
}

fn default_step_delay_ms() -> u64 {
    1000
}

fn default_help_path() -> String {
    "help.yml".to_owned()
}

impl Config {
    /// Loads the YAML file at `path` and applies the environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the merged configuration misses a required field or holds a
    /// value of the wrong type.
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("invalid configuration {}", path))?;

        Ok(config)
    }

    /// Account selected by `using`.
    pub fn active_account(&self) -> anyhow::Result<&Account> {
        self.accounts
            .get(&self.using)
            .ok_or_else(|| anyhow!("account profile {} not found in accounts", self.using))
    }
}
