//! Matrix sync loop.
//!
//! [`MatrixSync::sync`] catches up with the events missed while offline (mostly
//! invites), then listens to new text messages and hands them over as
//! [`InboundMessage`]s. Messages sent by the bot itself, progress report edits
//! included, never reach the handler.

use std::{sync::Arc, time::Duration};

use log::{error, info, warn};
use matrix_sdk::{
    Client, LoopCtrl, Room, RoomState,
    config::SyncSettings,
    ruma::{
        api::client::filter::FilterDefinition,
        events::room::{
            member::StrippedRoomMemberEvent,
            message::{MessageType, OriginalSyncRoomMessageEvent},
        },
    },
};
use tokio::time::sleep;

use crate::{commands::InboundMessage, matrix::session::SessionStore};

/// Delay before retrying a failed initial sync.
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct MatrixSync {
    client: Client,
    session: SessionStore,
}

impl MatrixSync {
    pub fn new(client: &Client, session: &SessionStore) -> Self {
        MatrixSync {
            client: client.to_owned(),
            session: session.to_owned(),
        }
    }

    /// Syncs forever, calling `on_message` for every new text message of a
    /// joined room. The sync token is saved after each response.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the sync loop.
    pub async fn sync<F>(&self, on_message: F) -> anyhow::Result<()>
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        info!("start syncing");

        self.client.add_event_handler(auto_join_rooms);

        let filter = FilterDefinition::with_lazy_loading();
        let mut sync_settings = SyncSettings::default().filter(filter.into());
        if let Some(sync_token) = self.session.sync_token() {
            sync_settings = sync_settings.token(sync_token);
        }

        // Catch up before the message handler is registered, old messages are
        // not commands anymore
        let next_batch = loop {
            match self.client.sync_once(sync_settings.clone()).await {
                Ok(response) => break response.next_batch,
                Err(e) => {
                    error!("initial sync failed: {}, retrying", e);
                    sleep(RETRY_DELAY).await;
                }
            }
        };
        if let Err(e) = self.session.save_sync_token(next_batch.clone()).await {
            error!("failed to save sync token: {:?}", e);
        }

        let on_message = Arc::new(on_message);
        self.client.add_event_handler({
            let on_message = Arc::clone(&on_message);
            move |event: OriginalSyncRoomMessageEvent, room: Room, client: Client| {
                let on_message = Arc::clone(&on_message);
                async move { on_room_message(event, room, client, on_message.as_ref()) }
            }
        });

        sync_settings = sync_settings.token(next_batch);
        self.client
            .sync_with_result_callback(sync_settings, |sync_result| async move {
                let response = sync_result?;
                if let Err(e) = self.session.save_sync_token(response.next_batch).await {
                    error!("failed to save sync token: {:?}", e);
                }
                Ok(LoopCtrl::Continue)
            })
            .await?;

        Ok(())
    }
}

/// Joins the rooms the bot is invited to.
///
/// Synapse can send the invite before the join is allowed, see
/// <https://github.com/matrix-org/synapse/issues/4345>, so joins are retried
/// with a growing delay.
async fn auto_join_rooms(room_member: StrippedRoomMemberEvent, client: Client, room: Room) {
    let Some(user_id) = client.user_id() else {
        warn!("could not get user id from client");
        return;
    };

    if room_member.state_key != user_id {
        return;
    }

    tokio::spawn(async move {
        info!("joining room {}", room.room_id());
        let mut delay = 2;

        while let Err(err) = room.join().await {
            error!(
                "failed to join room {} ({err:?}), retrying in {delay}s",
                room.room_id()
            );
            sleep(Duration::from_secs(delay)).await;
            delay *= 2;

            if delay > 3600 {
                error!("giving up joining room {}", room.room_id());
                return;
            }
        }
        info!("joined room {}", room.room_id());
    });
}

fn on_room_message<F>(event: OriginalSyncRoomMessageEvent, room: Room, client: Client, on_message: &F)
where
    F: Fn(InboundMessage),
{
    if room.state() != RoomState::Joined {
        return;
    }

    if client.user_id().is_some_and(|own| *own == *event.sender) {
        return;
    }

    let MessageType::Text(text_content) = event.content.msgtype else {
        return;
    };

    // a room is both the server and the channel of the message
    let room_id = room.room_id().to_string();
    on_message(InboundMessage {
        body: text_content.body,
        server_id: room_id.clone(),
        channel_id: room_id,
        sender_id: event.sender.to_string(),
        event_id: event.event_id.to_string(),
    });
}
