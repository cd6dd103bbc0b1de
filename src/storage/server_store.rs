//! JSON file backed server settings.
//!
//! The file maps server IDs to their settings:
//!
//! ```json
//! {
//!   "!abcdef:example.org": { "prefixes": ["!", "bot "] },
//!   "!ghijkl:example.org": { "prefixes": [] }
//! }
//! ```
//!
//! An empty prefix list is valid and turns the bot off for that server.

use std::collections::HashMap;

use log::{error, info, warn};
use tokio::fs;

use crate::storage::{PrefixStore, ServerSettings};

/// Server settings loaded once from disk.
///
/// # Examples
///
/// ```no_run
/// use chainbot::storage::{PrefixStore, ServerStore};
///
/// # async fn example() {
/// let store = ServerStore::load("servers.json", vec!["!".to_string()]).await;
/// let settings = store.read("!room:example.org");
/// println!("prefixes: {:?}", settings.prefixes);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerStore {
    servers: HashMap<String, ServerSettings>,
    /// Settings returned for unknown servers
    defaults: ServerSettings,
}

impl ServerStore {
    pub fn new(servers: HashMap<String, ServerSettings>, default_prefixes: Vec<String>) -> Self {
        ServerStore {
            servers,
            defaults: ServerSettings {
                prefixes: default_prefixes,
            },
        }
    }

    /// Loads the settings file at `path`.
    ///
    /// A missing or corrupted file is logged and yields a store where every
    /// server uses `default_prefixes`.
    pub async fn load(path: &str, default_prefixes: Vec<String>) -> Self {
        let Ok(serialized_servers) = fs::read_to_string(path).await else {
            warn!("no server settings found at {}, using default prefixes", path);
            return Self::new(HashMap::new(), default_prefixes);
        };

        let servers: HashMap<String, ServerSettings> =
            match serde_json::from_str(&serialized_servers) {
                Ok(servers) => servers,
                Err(e) => {
                    error!("failed to deserialize server settings {}: {}", path, e);
                    HashMap::new()
                }
            };

        info!("loaded settings for {} servers", servers.len());

        Self::new(servers, default_prefixes)
    }
}

impl PrefixStore for ServerStore {
    fn read(&self, server_id: &str) -> ServerSettings {
        self.servers
            .get(server_id)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }
}
