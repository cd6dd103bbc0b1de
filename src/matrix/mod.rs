//! Matrix transport of the bot.
//!
//! - **Login**: fresh login or restore of the saved session
//! - **Session**: login and sync tokens persisted in the data directory
//! - **Sync**: auto-join on invite and delivery of text messages
//!
//! A Matrix room is both the server and the channel of a message: prefixes are
//! configured per room.
//!
//! # Examples
//!
//! ```no_run
//! use chainbot::matrix::{MatrixClient, UserCredentials};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let credentials = UserCredentials {
//!     user_id: "@chainbot:example.com".to_string(),
//!     password: "password".to_string(),
//!     passphrase: "store passphrase".to_string(),
//! };
//!
//! let client = MatrixClient::new(&credentials, "./data/session").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod login;
mod session;
mod sync;

pub use crate::matrix::client::MatrixClient;

/// Credentials of the bot account.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: String,
    pub password: String,
    /// Encrypts the local state store
    pub passphrase: String,
}
