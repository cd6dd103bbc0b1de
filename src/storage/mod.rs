//! Per-server settings lookup.
//!
//! Settings are keyed by server ID and read through the [`PrefixStore`] trait.
//! Servers without stored settings get the defaults, a lookup never fails.
//!
//! - [`ServerSettings`]: settings of one server
//! - [`ServerStore`]: JSON file backed implementation

use mockall::automock;
use serde::{Deserialize, Serialize};

mod server_store;

pub use crate::storage::server_store::ServerStore;

/// Settings of one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Command prefixes in priority order
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// Read access to server settings.
#[automock]
pub trait PrefixStore: Send + Sync {
    /// Returns the settings of `server_id`, or the defaults when unknown.
    fn read(&self, server_id: &str) -> ServerSettings;
}
