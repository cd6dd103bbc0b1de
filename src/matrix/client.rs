//! Matrix client wrapper.
//!
//! [`MatrixClient`] owns the SDK client and the sync loop, and is the
//! [`Conversation`] the orchestrator talks through: messages are sent as
//! Markdown and edited in place with `m.replace` relations.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use log::{error, info, warn};
use matrix_sdk::{
    Client, Room,
    ruma::{
        EventId, RoomId,
        events::room::message::{
            MessageType, ReplacementMetadata, RoomMessageEventContent,
            RoomMessageEventContentWithoutRelation,
        },
    },
};

use crate::{
    commands::{Conversation, InboundMessage, MessageId},
    matrix::{UserCredentials, login::setup_client, session::SessionStore, sync::MatrixSync},
};

/// Display name of the bot account.
const DISPLAY_NAME: &str = "chainbot";

pub struct MatrixClient {
    matrix_sync: MatrixSync,
    client: Client,
}

impl MatrixClient {
    /// Logs in, or restores the session saved in `session_path`.
    ///
    /// # Errors
    ///
    /// Fails when the login or the session restore fails.
    pub async fn new(user_credentials: &UserCredentials, session_path: &str) -> anyhow::Result<Self> {
        let session = SessionStore::open(session_path).await;
        let client = setup_client(user_credentials, &session)
            .await
            .context("failed to setup matrix client")?;

        if let Err(e) = client.account().set_display_name(Some(DISPLAY_NAME)).await {
            warn!("failed to set display name: {:?}", e);
        }

        let matrix_sync = MatrixSync::new(&client, &session);

        Ok(MatrixClient {
            matrix_sync,
            client,
        })
    }

    /// Runs the sync loop, calling `on_message` for every text message.
    pub async fn sync<F>(&self, on_message: F)
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        match self.matrix_sync.sync(on_message).await {
            Ok(_) => info!("matrix sync ended"),
            Err(e) => error!("matrix sync ended with error: {:?}", e),
        }
    }

    fn room(&self, room_id: &str) -> anyhow::Result<Room> {
        let room_id = RoomId::parse(room_id)?;
        self.client
            .get_room(&room_id)
            .ok_or_else(|| anyhow!("unknown room {}", room_id))
    }
}

#[async_trait]
impl Conversation for MatrixClient {
    async fn send_message(&self, channel_id: &str, body: &str) -> anyhow::Result<MessageId> {
        let room = self.room(channel_id)?;
        let content = RoomMessageEventContent::text_markdown(body);

        let result = room.send(content).await?;
        Ok(MessageId(result.event_id.to_string()))
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &MessageId,
        body: &str,
    ) -> anyhow::Result<()> {
        let room = self.room(channel_id)?;
        let event_id = EventId::parse(&message_id.0)?;

        let content =
            RoomMessageEventContentWithoutRelation::new(MessageType::text_markdown(body))
                .make_replacement(ReplacementMetadata::new(event_id, None));

        room.send(content).await?;
        Ok(())
    }
}
