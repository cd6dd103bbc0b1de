//! Othello command handler.
//!
//! Runs one match per channel:
//!
//! - `othello start` opens a match with the author playing black, or joins the
//!   waiting match as white and shows the board
//! - `othello put <position>` places a stone for the player whose turn it is
//!
//! After each placement the turn goes to the opponent if they can move,
//! otherwise the same player plays again. The match is closed once the board
//! reports a winner or a draw.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::Mutex as AsyncMutex;

use crate::{
    commands::{
        CommandError, CommandHandler, Completion, InvocationContext,
        markdown_response::{
            format_board, format_draw, format_illegal_move, format_match_joined,
            format_match_opened, format_othello_usage, format_turn, format_winner,
        },
    },
    othello::{Board, GameResult, Player, Position},
};

/// A match in progress in one channel.
struct Match<B> {
    board: B,
    turn: Player,
    black: String,
    white: Option<String>,
}

impl<B> Match<B> {
    fn player_id(&self, player: Player) -> Option<&str> {
        match player {
            Player::Black => Some(self.black.as_str()),
            Player::White => self.white.as_deref(),
        }
    }
}

/// Slot of a channel, empty when no match runs there.
type ChannelSlot<B> = Arc<AsyncMutex<Option<Match<B>>>>;

/// Handler of the `othello` command group.
///
/// Each channel has its own table lock, moves in one channel never wait on
/// another channel.
pub struct OthelloCommand<B> {
    /// Creates a fresh board for each new match
    new_board: Box<dyn Fn() -> B + Send + Sync>,
    /// Tables indexed by channel ID
    tables: Mutex<HashMap<String, ChannelSlot<B>>>,
}

impl<B: Board> OthelloCommand<B> {
    pub fn new<F>(new_board: F) -> Self
    where
        F: Fn() -> B + Send + Sync + 'static,
    {
        OthelloCommand {
            new_board: Box::new(new_board),
            tables: Mutex::new(HashMap::new()),
        }
    }

    fn table(&self, channel_id: &str) -> ChannelSlot<B> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(tables.entry(channel_id.to_owned()).or_default())
    }

    async fn start(&self, context: &InvocationContext) -> Result<Completion, CommandError> {
        let table = self.table(&context.channel_id);
        let mut slot = table.lock().await;

        let Some(current) = slot.as_mut() else {
            info!("opening othello match in {}", context.channel_id);
            *slot = Some(Match {
                board: (self.new_board)(),
                turn: Player::Black,
                black: context.user_id.clone(),
                white: None,
            });
            context.send(&format_match_opened(&context.user_id)).await?;
            context.note("waiting for an opponent");
            return Ok(Completion::Done);
        };

        if current.white.is_some() {
            return Ok(Completion::Warning(
                "a match is already running in this channel".to_owned(),
            ));
        }

        debug!("{} joins the match in {}", context.user_id, context.channel_id);
        current.white = Some(context.user_id.clone());

        context.send(&format_match_joined(&context.user_id)).await?;
        context
            .send(&format_turn(Player::Black, &current.black))
            .await?;
        context
            .send(&format_board(&current.board.render(Some(Player::Black))))
            .await?;
        context.note("joined as white");

        Ok(Completion::Done)
    }

    async fn put(
        &self,
        context: &InvocationContext,
        position: Position,
    ) -> Result<Completion, CommandError> {
        let table = self.table(&context.channel_id);
        let mut slot = table.lock().await;

        let Some(current) = slot.as_mut() else {
            return Err(CommandError::InvalidArguments(
                "no othello match in this channel, type `othello start`".to_owned(),
            ));
        };

        if current.white.is_none() {
            return Ok(Completion::Warning("waiting for an opponent".to_owned()));
        }

        let player = current.turn;
        if current.player_id(player) != Some(context.user_id.as_str()) {
            return Ok(Completion::Warning("not your turn".to_owned()));
        }

        if !current.board.can_place(player, position.x, position.y) {
            context.send(&format_illegal_move(position)).await?;
            return Ok(Completion::Warning(format!("cannot place on {}", position)));
        }

        current.board.place(player, position.x, position.y);
        context
            .send(&format_board(&current.board.render(Some(player))))
            .await?;
        context.note(&format!("{:?} placed on {}", player, position).to_lowercase());

        if current.board.can_place_any(player.opponent()) {
            current.turn = player.opponent();
        }

        match current.board.winner() {
            GameResult::InProgress => {
                let next = current.turn;
                let next_id = current.player_id(next).unwrap_or_default().to_owned();
                context.send(&format_turn(next, &next_id)).await?;
            }
            GameResult::Won(winner) => {
                let winner_id = current.player_id(winner).unwrap_or_default().to_owned();
                context.send(&format_winner(winner, &winner_id)).await?;
                info!("othello match in {} won by {}", context.channel_id, winner_id);
                *slot = None;
            }
            GameResult::Draw => {
                context.send(&format_draw()).await?;
                info!("othello match in {} ended in a draw", context.channel_id);
                *slot = None;
            }
        }

        Ok(Completion::Done)
    }
}

#[async_trait]
impl<B: Board + 'static> CommandHandler for OthelloCommand<B> {
    async fn invoke(
        &self,
        context: &InvocationContext,
        args: &[String],
    ) -> Result<Completion, CommandError> {
        match args.first().map(String::as_str) {
            Some("start") => self.start(context).await,
            Some("put") => {
                let position = args
                    .get(1)
                    .and_then(|arg| Position::parse(arg))
                    .ok_or_else(|| CommandError::InvalidArguments(format_othello_usage()))?;
                self.put(context, position).await
            }
            _ => Err(CommandError::InvalidArguments(format_othello_usage())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use tokio::{sync::Notify, time};

    use super::*;
    use crate::{
        commands::{
            Conversation, MessageId,
            memory::CommandMemory,
            testing::{RecordingConversation, context},
        },
        othello::{MockBoard, StandardBoard},
    };

    const ALICE: &str = "@alice:example.com";
    const BOB: &str = "@bob:example.com";

    struct Table {
        command: OthelloCommand<StandardBoard>,
        conversation: Arc<RecordingConversation>,
        memory: CommandMemory,
    }

    impl Table {
        fn new() -> Self {
            Table {
                command: OthelloCommand::new(StandardBoard::new),
                conversation: Arc::new(RecordingConversation::default()),
                memory: CommandMemory::new(),
            }
        }

        async fn run(&self, user_id: &str, args: &[&str]) -> Result<Completion, CommandError> {
            let ctx = context(user_id, self.conversation.clone(), self.memory.clone());
            let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            self.command.invoke(&ctx, &args).await
        }
    }

    #[tokio::test]
    async fn test_start_opens_match() {
        let table = Table::new();

        let result = table.run(ALICE, &["start"]).await;

        assert!(matches!(result, Ok(Completion::Done)));
        let sent = table.conversation.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("you play black"));
        assert_eq!(table.memory.read(ALICE), "waiting for an opponent");
    }

    #[tokio::test]
    async fn test_second_start_joins_as_white() {
        let table = Table::new();
        table.run(ALICE, &["start"]).await.unwrap();

        let result = table.run(BOB, &["start"]).await;

        assert!(matches!(result, Ok(Completion::Done)));
        let sent = table.conversation.sent_bodies();
        assert_eq!(sent.len(), 4);
        assert!(sent[1].contains("joined the match as white"));
        assert!(sent[2].contains(ALICE));
        assert!(sent[3].starts_with("```"));
        assert_eq!(table.memory.read(BOB), "joined as white");
    }

    #[tokio::test]
    async fn test_third_start_is_a_warning() {
        let table = Table::new();
        table.run(ALICE, &["start"]).await.unwrap();
        table.run(BOB, &["start"]).await.unwrap();

        let result = table.run("@carol:example.com", &["start"]).await;
        assert!(matches!(result, Ok(Completion::Warning(_))));
    }

    #[tokio::test]
    async fn test_put_without_match_fails() {
        let table = Table::new();
        let result = table.run(ALICE, &["put", "D3"]).await;
        assert!(matches!(result, Err(CommandError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_put_with_invalid_position_fails() {
        let table = Table::new();
        table.run(ALICE, &["start"]).await.unwrap();

        assert!(matches!(
            table.run(ALICE, &["put", "Z9"]).await,
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            table.run(ALICE, &["put"]).await,
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_subcommand_fails() {
        let table = Table::new();
        assert!(matches!(
            table.run(ALICE, &["resign"]).await,
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            table.run(ALICE, &[]).await,
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[tokio::test]
    async fn test_put_before_opponent_joined() {
        let table = Table::new();
        table.run(ALICE, &["start"]).await.unwrap();

        let result = table.run(ALICE, &["put", "D3"]).await;
        assert!(matches!(result, Ok(Completion::Warning(reason)) if reason.contains("opponent")));
        // the board was not touched, nobody is announced
        assert_eq!(table.conversation.sent_bodies().len(), 1);
        assert_eq!(table.memory.read(ALICE), "waiting for an opponent");
    }

    #[tokio::test]
    async fn test_put_legal_move_passes_turn() {
        let table = Table::new();
        table.run(ALICE, &["start"]).await.unwrap();
        table.run(BOB, &["start"]).await.unwrap();

        let result = table.run(ALICE, &["put", "D3"]).await;

        assert!(matches!(result, Ok(Completion::Done)));
        assert_eq!(table.memory.read(ALICE), "black placed on d3");
        let sent = table.conversation.sent_bodies();
        assert!(sent[sent.len() - 1].contains(BOB));
        assert!(sent[sent.len() - 1].contains("white"));

        // alice cannot play twice in a row
        let result = table.run(ALICE, &["put", "C3"]).await;
        assert!(matches!(result, Ok(Completion::Warning(reason)) if reason == "not your turn"));
    }

    #[tokio::test]
    async fn test_put_illegal_move_is_a_warning() {
        let table = Table::new();
        table.run(ALICE, &["start"]).await.unwrap();
        table.run(BOB, &["start"]).await.unwrap();

        let result = table.run(ALICE, &["put", "A1"]).await;

        assert!(matches!(result, Ok(Completion::Warning(reason)) if reason == "cannot place on A1"));
        let sent = table.conversation.sent_bodies();
        assert_eq!(sent[sent.len() - 1], "You cannot place a stone on A1!");
    }

    #[tokio::test]
    async fn test_matches_are_per_channel() {
        let table = Table::new();
        table.run(ALICE, &["start"]).await.unwrap();

        let mut other = context(BOB, table.conversation.clone(), table.memory.clone());
        other.channel_id = "!other:example.com".to_string();
        let result = table
            .command
            .invoke(&other, &["start".to_string()])
            .await;

        assert!(matches!(result, Ok(Completion::Done)));
        assert!(table.conversation.sent_bodies()[1].contains("you play black"));
    }

    #[tokio::test]
    async fn test_winning_move_closes_match() {
        let command = OthelloCommand::new(|| {
            let mut board = MockBoard::new();
            board.expect_can_place().return_const(true);
            board.expect_place().return_const(());
            board.expect_render().returning(|_| "board".to_string());
            board.expect_can_place_any().return_const(false);
            board
                .expect_winner()
                .return_const(GameResult::Won(Player::Black));
            board
        });
        let conversation = Arc::new(RecordingConversation::default());
        let memory = CommandMemory::new();
        let alice = context(ALICE, conversation.clone(), memory.clone());
        let bob = context(BOB, conversation.clone(), memory.clone());

        command.invoke(&alice, &["start".to_string()]).await.unwrap();
        command.invoke(&bob, &["start".to_string()]).await.unwrap();
        let result = command
            .invoke(&alice, &["put".to_string(), "D3".to_string()])
            .await;

        assert!(matches!(result, Ok(Completion::Done)));
        let sent = conversation.sent_bodies();
        assert!(sent[sent.len() - 1].contains("wins the match"));

        // the match is closed, a new start opens a fresh one
        command.invoke(&bob, &["start".to_string()]).await.unwrap();
        assert!(conversation.sent_bodies().last().unwrap().contains("you play black"));
    }

    #[tokio::test]
    async fn test_same_player_plays_again_when_opponent_is_blocked() {
        let command = OthelloCommand::new(|| {
            let mut board = MockBoard::new();
            board.expect_can_place().return_const(true);
            board.expect_place().return_const(());
            board.expect_render().returning(|_| "board".to_string());
            board.expect_can_place_any().return_const(false);
            board.expect_winner().return_const(GameResult::InProgress);
            board
        });
        let conversation = Arc::new(RecordingConversation::default());
        let memory = CommandMemory::new();
        let alice = context(ALICE, conversation.clone(), memory.clone());
        let bob = context(BOB, conversation.clone(), memory.clone());

        command.invoke(&alice, &["start".to_string()]).await.unwrap();
        command.invoke(&bob, &["start".to_string()]).await.unwrap();
        command
            .invoke(&alice, &["put".to_string(), "D3".to_string()])
            .await
            .unwrap();

        let result = command
            .invoke(&alice, &["put".to_string(), "C4".to_string()])
            .await;
        assert!(matches!(result, Ok(Completion::Done)));
    }

    /// Holds every send to `gated_channel` until released.
    struct GatedConversation {
        gated_channel: String,
        entered: Notify,
        release: Notify,
        inner: RecordingConversation,
    }

    #[async_trait]
    impl Conversation for GatedConversation {
        async fn send_message(&self, channel_id: &str, body: &str) -> anyhow::Result<MessageId> {
            if channel_id == self.gated_channel {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.send_message(channel_id, body).await
        }

        async fn edit_message(
            &self,
            channel_id: &str,
            message_id: &MessageId,
            body: &str,
        ) -> anyhow::Result<()> {
            self.inner.edit_message(channel_id, message_id, body).await
        }
    }

    #[tokio::test]
    async fn test_channels_do_not_wait_on_each_other() {
        let command = Arc::new(OthelloCommand::new(StandardBoard::new));
        let conversation = Arc::new(GatedConversation {
            gated_channel: "!room:example.com".to_string(),
            entered: Notify::new(),
            release: Notify::new(),
            inner: RecordingConversation::default(),
        });
        let memory = CommandMemory::new();

        let blocked = context(ALICE, conversation.clone(), memory.clone());
        let pending = {
            let command = Arc::clone(&command);
            tokio::spawn(async move { command.invoke(&blocked, &["start".to_string()]).await })
        };
        conversation.entered.notified().await;

        let mut other = context(BOB, conversation.clone(), memory.clone());
        other.channel_id = "!other:example.com".to_string();
        let result = time::timeout(
            Duration::from_secs(5),
            command.invoke(&other, &["start".to_string()]),
        )
        .await;
        assert!(matches!(result, Ok(Ok(Completion::Done))));

        conversation.release.notify_one();
        assert!(matches!(pending.await.unwrap(), Ok(Completion::Done)));
        assert_eq!(conversation.inner.sent_bodies().len(), 2);
    }
}
