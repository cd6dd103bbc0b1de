//! Sequential chain execution with live progress reporting.
//!
//! The [`Orchestrator`] is the entry point for every inbound message. It
//! resolves the server prefix, takes the author's execution lock, splits the
//! message into a chain and runs the steps one after the other.
//!
//! # Progress Report
//!
//! A chain of more than one step publishes a report when it starts, then
//! updates it before and after every step: a chain of `N` steps renders
//! exactly `2N + 1` times. Single-step chains behave like a direct invocation
//! and publish nothing.
//!
//! # Failure Isolation
//!
//! A step that fails, or panics, ends in [`StepStatus::Error`] and the chain
//! moves on to the next step. Nothing raised by a step reaches the caller.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::time;

use crate::{
    commands::{
        Conversation, InboundMessage, InvocationContext, MessageId,
        chain::parse_chain,
        help::HelpIndex,
        lock::UserLocks,
        markdown_response::{format_help_not_found, format_help_results},
        memory::CommandMemory,
        prefix::resolve_prefix,
        progress::{ChainState, StepStatus},
        registry::{CommandError, CommandRegistry, Completion, LogicalCommand},
    },
    storage::PrefixStore,
};

/// Sub-command answered by the orchestrator itself.
pub const HELP_COMMAND: &str = "help";

const SKIPPED_DETAIL: &str = "skipped";
const ERROR_DETAIL: &str = "internal error occurred.";

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// No prefix of the server matched
    NotACommand,
    /// The author already has a chain running
    UserBusy,
    /// The chain ran, every step is resolved
    Completed(ChainState),
}

/// Runs command chains.
///
/// Shared by every message handler task; distinct users run concurrently, a
/// single user runs one chain at a time.
pub struct Orchestrator {
    prefix_store: Arc<dyn PrefixStore>,
    registry: Arc<CommandRegistry>,
    help_index: Arc<HelpIndex>,
    locks: UserLocks,
    memory: CommandMemory,
    /// Pause between two dispatched steps
    step_delay: Duration,
}

impl Orchestrator {
    pub fn new(
        prefix_store: Arc<dyn PrefixStore>,
        registry: Arc<CommandRegistry>,
        help_index: Arc<HelpIndex>,
        step_delay: Duration,
    ) -> Self {
        Orchestrator {
            prefix_store,
            registry,
            help_index,
            locks: UserLocks::new(),
            memory: CommandMemory::new(),
            step_delay,
        }
    }

    #[cfg(test)]
    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }

    #[cfg(test)]
    pub fn memory(&self) -> &CommandMemory {
        &self.memory
    }

    /// Handles one inbound message.
    ///
    /// Messages without a matching prefix and messages from a user whose
    /// previous chain is still running are dropped without any reply. The
    /// author's lock is released when this returns, whatever the steps did.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
        conversation: Arc<dyn Conversation>,
    ) -> ChainOutcome {
        let settings = self.prefix_store.read(&message.server_id);
        let Some(text) = resolve_prefix(&settings.prefixes, &message.body) else {
            debug!("ignoring message {} without prefix", message.event_id);
            return ChainOutcome::NotACommand;
        };

        let Some(_guard) = self.locks.try_acquire(&message.sender_id) else {
            debug!(
                "dropping message {}: {} already has a chain running",
                message.event_id, message.sender_id
            );
            return ChainOutcome::UserBusy;
        };

        let commands = parse_chain(text);
        let context = InvocationContext::new(message, conversation, self.memory.clone());

        info!(
            "running chain of {} steps for {} in {}",
            commands.len(),
            context.user_id,
            context.channel_id
        );
        let state = self.run_chain(&context, &commands).await;
        self.memory.forget(&context.user_id);
        info!("chain of {} finished", context.user_id);

        ChainOutcome::Completed(state)
    }

    async fn run_chain(&self, context: &InvocationContext, commands: &[String]) -> ChainState {
        let mut state = ChainState::new(commands);
        let mut report = ProgressReport::new(context, state.is_multi_step());

        self.memory.reset(&context.user_id);
        report.publish(&state).await;

        for (index, raw_text) in commands.iter().enumerate() {
            if let Err(e) = state.start(index) {
                error!("{}", e);
                continue;
            }
            report.publish(&state).await;

            let (status, detail) = if raw_text.is_empty() {
                (StepStatus::Skipped, SKIPPED_DETAIL.to_owned())
            } else {
                self.run_step(context, raw_text).await
            };

            if let Err(e) = state.finish(index, status, detail) {
                error!("{}", e);
            }
            report.publish(&state).await;

            let has_next = index + 1 < commands.len();
            if !raw_text.is_empty() && has_next && !self.step_delay.is_zero() {
                time::sleep(self.step_delay).await;
            }
        }

        state
    }

    /// Runs one sub-command and maps its result to a terminal status and
    /// the detail shown in the report.
    async fn run_step(&self, context: &InvocationContext, raw_text: &str) -> (StepStatus, String) {
        let result = AssertUnwindSafe(self.execute(context, raw_text))
            .catch_unwind()
            .await;
        let note = self.memory.read(&context.user_id);

        match result {
            Ok(Ok(Completion::Done)) => (StepStatus::Success, format!("done {}", note)),
            Ok(Ok(Completion::Warning(reason))) => {
                (StepStatus::Warning, format!("{} {}", reason, note))
            }
            Ok(Err(e)) => {
                warn!("`{}` from {} failed: {}", raw_text, context.user_id, e);
                (StepStatus::Error, format!("{} {}", ERROR_DETAIL, note))
            }
            Err(_) => {
                error!("`{}` from {} panicked", raw_text, context.user_id);
                (StepStatus::Error, format!("{} {}", ERROR_DETAIL, note))
            }
        }
    }

    async fn execute(
        &self,
        context: &InvocationContext,
        raw_text: &str,
    ) -> Result<Completion, CommandError> {
        let Some(command) = LogicalCommand::parse(raw_text) else {
            return Err(CommandError::NotFound(raw_text.to_owned()));
        };

        if command.name == HELP_COMMAND {
            return self.help(context, &command.args).await;
        }

        self.registry.dispatch(context, &command).await
    }

    /// Sends the help entries matching `keywords`.
    async fn help(
        &self,
        context: &InvocationContext,
        keywords: &[String],
    ) -> Result<Completion, CommandError> {
        let keywords: Vec<&str> = keywords.iter().map(String::as_str).collect();
        let results = self.help_index.search(&keywords);
        debug!("help search {:?}: {} results", keywords, results.len());

        let body = if results.is_empty() {
            format_help_not_found()
        } else {
            format_help_results(&results)
        };

        context.send(&body).await?;
        Ok(Completion::Done)
    }
}

/// Published progress report of a multi-step chain.
struct ProgressReport<'a> {
    context: &'a InvocationContext,
    enabled: bool,
    message_id: Option<MessageId>,
}

impl<'a> ProgressReport<'a> {
    fn new(context: &'a InvocationContext, enabled: bool) -> Self {
        ProgressReport {
            context,
            enabled,
            message_id: None,
        }
    }

    /// Sends the report the first time, edits it afterwards. Failures are
    /// logged only.
    async fn publish(&mut self, state: &ChainState) {
        if !self.enabled {
            return;
        }

        let body = state.render();
        match &self.message_id {
            None => match self.context.send(&body).await {
                Ok(message_id) => self.message_id = Some(message_id),
                Err(e) => warn!("failed to send progress report: {}", e),
            },
            Some(message_id) => {
                if let Err(e) = self
                    .context
                    .conversation
                    .edit_message(&self.context.channel_id, message_id, &body)
                    .await
                {
                    warn!("failed to update progress report: {}", e);
                }
            }
        }
    }
}
