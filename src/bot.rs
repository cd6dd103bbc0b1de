//! Wiring of the Matrix transport and the command orchestrator.
//!
//! The [`Bot`] loads everything the orchestrator needs at startup (help index,
//! server settings, command extensions), logs in, then hands every inbound
//! text message to the [`Orchestrator`] in its own task, so a long chain never
//! blocks the sync loop nor the chains of other users.
//!
//! # Message Flow
//!
//! ```text
//! Matrix sync → InboundMessage → tokio::spawn → Orchestrator::handle_message
//!                                                      │
//!                       MatrixClient (Conversation) ◄──┘ send / edit
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use log::{debug, info};

use crate::{
    Args,
    commands::{ChainOutcome, Conversation, HelpIndex, Orchestrator, actions::build_registry},
    config::Config,
    matrix::{MatrixClient, UserCredentials},
    storage::ServerStore,
    utils::get_path,
};

/// Name of the server settings file in the data directory.
const SERVERS_FILE: &str = "servers.json";

pub struct Bot {
    matrix_client: Arc<MatrixClient>,
    orchestrator: Arc<Orchestrator>,
}

impl Bot {
    /// Loads the bot resources and logs in with the active account.
    ///
    /// # Errors
    ///
    /// - the active account profile does not exist
    /// - the help index cannot be read or parsed
    /// - the Matrix login or session restore fails
    pub async fn new(config: Config, args: Args) -> anyhow::Result<Self> {
        let account = config.active_account()?;
        info!("using account profile {}", config.using);

        let help_index = HelpIndex::load(&config.bot.help_path)
            .await
            .with_context(|| format!("failed to load help index {}", config.bot.help_path))?;

        let server_store = ServerStore::load(
            &get_path(&args.data, SERVERS_FILE),
            config.bot.default_prefixes.clone(),
        )
        .await;

        let registry = build_registry(&config.bot.extensions);

        let orchestrator = Orchestrator::new(
            Arc::new(server_store),
            Arc::new(registry),
            Arc::new(help_index),
            Duration::from_millis(config.bot.step_delay_ms),
        );

        let matrix_client = MatrixClient::new(
            &UserCredentials {
                user_id: account.user_id.clone(),
                password: account.password.clone(),
                passphrase: account.passphrase.clone(),
            },
            &get_path(&args.data, "session"),
        )
        .await?;

        Ok(Bot {
            matrix_client: Arc::new(matrix_client),
            orchestrator: Arc::new(orchestrator),
        })
    }

    /// Syncs with the homeserver until the process is terminated.
    pub async fn start(self) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let conversation: Arc<dyn Conversation> = self.matrix_client.clone();

        self.matrix_client
            .sync(move |message| {
                let orchestrator = Arc::clone(&orchestrator);
                let conversation = Arc::clone(&conversation);

                tokio::spawn(async move {
                    let outcome = orchestrator.handle_message(&message, conversation).await;
                    if let ChainOutcome::Completed(state) = outcome {
                        debug!("{}", state.render());
                    }
                });
            })
            .await;
    }
}
