//! Command chain orchestration.
//!
//! This module turns inbound chat messages into chains of sub-commands and runs
//! them one after the other, publishing a live progress report for multi-step
//! chains.
//!
//! # Architecture
//!
//! ```text
//! InboundMessage
//!      │
//!      ▼
//! ┌──────────────┐   no prefix match   ┌────────────┐
//! │ prefix       │ ──────────────────► │  dropped   │
//! └──────────────┘                     └────────────┘
//!      │                                     ▲
//!      ▼                 user busy           │
//! ┌──────────────┐ ──────────────────────────┘
//! │ lock         │
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐     ┌──────────────────────────────────────┐
//! │ chain        │ ──► │ Orchestrator, for every step:        │
//! └──────────────┘     │  - help  → help::HelpIndex::search    │
//!                      │  - other → registry::CommandRegistry  │
//!                      │  - progress::ChainState::render       │
//!                      └──────────────────────────────────────┘
//! ```
//!
//! # Chain Syntax
//!
//! A chain is one message holding one sub-command per line:
//!
//! ```text
//! !help board
//! othello start
//! othello put D3
//! ```
//!
//! Only the first line carries the prefix. Empty lines are kept in the report
//! and marked as skipped.
//!
//! # Module Organization
//!
//! - [`orchestrator`] - Runs a chain and reports its progress
//! - [`prefix`] - Per-server prefix matching
//! - [`lock`] - Per-user execution lock
//! - [`memory`] - Per-user notes written by commands
//! - [`chain`] - Splits a message into sub-commands
//! - [`progress`] - Step state machine and report rendering
//! - [`help`] - Help index and keyword search
//! - [`registry`] - Command handlers lookup and invocation
//! - [`actions`] - Built-in command handlers
//! - [`markdown_response`] - Response formatting utilities

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

pub mod actions;
pub mod chain;
pub mod help;
pub mod lock;
pub mod markdown_response;
pub mod memory;
pub mod orchestrator;
pub mod prefix;
pub mod progress;
pub mod registry;

pub use crate::commands::{
    help::HelpIndex,
    memory::CommandMemory,
    orchestrator::{ChainOutcome, Orchestrator},
    registry::{CommandError, CommandHandler, Completion},
};

/// A text message received from the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Message text
    pub body: String,
    /// Server the message belongs to, used to look up the prefixes
    pub server_id: String,
    /// Channel (room) where the message was sent
    pub channel_id: String,
    /// Author of the message
    pub sender_id: String,
    /// Identifier of the message event
    pub event_id: String,
}

/// Identifier of a message sent by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

/// Outbound side of the chat.
///
/// Abstracts the transport so the orchestrator and the command handlers can be
/// tested without a homeserver.
#[automock]
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Sends a Markdown message to `channel_id`.
    async fn send_message(&self, channel_id: &str, body: &str) -> anyhow::Result<MessageId>;

    /// Replaces the content of a message previously sent by the bot.
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &MessageId,
        body: &str,
    ) -> anyhow::Result<()>;
}

/// Context a sub-command runs in.
///
/// Bound to the channel and author of the message that carried the chain.
#[derive(Clone)]
pub struct InvocationContext {
    pub channel_id: String,
    pub user_id: String,
    /// Where command output goes
    pub conversation: Arc<dyn Conversation>,
    /// Notes surfaced in the progress report
    pub memory: CommandMemory,
}

impl InvocationContext {
    pub fn new(
        message: &InboundMessage,
        conversation: Arc<dyn Conversation>,
        memory: CommandMemory,
    ) -> Self {
        InvocationContext {
            channel_id: message.channel_id.clone(),
            user_id: message.sender_id.clone(),
            conversation,
            memory,
        }
    }

    /// Sends `body` to the channel of the invocation.
    pub async fn send(&self, body: &str) -> anyhow::Result<MessageId> {
        self.conversation.send_message(&self.channel_id, body).await
    }

    /// Leaves a note for the progress report of the current step.
    pub fn note(&self, text: &str) {
        self.memory.write(&self.user_id, text);
    }
}
