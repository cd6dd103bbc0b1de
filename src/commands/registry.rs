//! Command handler registry.
//!
//! Sub-commands are turned into a [`LogicalCommand`] and dispatched to the
//! [`CommandHandler`] registered under their name. The registry is built once
//! at startup and shared read-only afterwards.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use log::debug;
use mockall::automock;
use thiserror::Error;

use crate::commands::InvocationContext;

/// A sub-command split into its name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalCommand {
    pub name: String,
    pub args: Vec<String>,
}

impl LogicalCommand {
    /// Splits `text` on whitespace. Returns `None` for blank text.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace().map(str::to_owned);
        let name = tokens.next()?;

        Some(LogicalCommand {
            name,
            args: tokens.collect(),
        })
    }
}

/// How a command ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Done,
    /// Ran, but could not do what was asked (illegal move, wrong turn...)
    Warning(String),
}

/// Errors raised while resolving or running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("command failed: {0}")]
    Failed(#[from] anyhow::Error),
}

/// A command that can be invoked from a chain.
#[automock]
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Checks that the invocation is allowed to run.
    fn check(&self, _context: &InvocationContext) -> Result<(), CommandError> {
        Ok(())
    }

    /// Runs the command with the arguments following its name.
    async fn invoke(
        &self,
        context: &InvocationContext,
        args: &[String],
    ) -> Result<Completion, CommandError>;
}

/// Handlers indexed by command name.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn register(&mut self, name: &str, handler: Arc<dyn CommandHandler>) {
        debug!("registering command {}", name);
        self.handlers.insert(name.to_owned(), handler);
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered command names, sorted.
    #[cfg(test)]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves, checks and invokes `command`.
    ///
    /// # Errors
    ///
    /// - [`CommandError::NotFound`] when no handler is registered for the name
    /// - any error returned by the handler check or invocation
    pub async fn dispatch(
        &self,
        context: &InvocationContext,
        command: &LogicalCommand,
    ) -> Result<Completion, CommandError> {
        let handler = self
            .handlers
            .get(&command.name)
            .ok_or_else(|| CommandError::NotFound(command.name.clone()))?;

        handler.check(context)?;

        debug!("invoking {} with {:?}", command.name, command.args);
        handler.invoke(context, &command.args).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::commands::{
        memory::CommandMemory,
        testing::{RecordingConversation, context},
    };

    fn test_context() -> InvocationContext {
        context(
            "@alice:example.com",
            Arc::new(RecordingConversation::default()),
            CommandMemory::new(),
        )
    }

    #[test]
    fn test_logical_command_parse() {
        let command = LogicalCommand::parse("othello put  C4").unwrap();
        assert_eq!(command.name, "othello");
        assert_eq!(command.args, vec!["put", "C4"]);
    }

    #[test]
    fn test_logical_command_parse_without_args() {
        let command = LogicalCommand::parse("  ping ").unwrap();
        assert_eq!(command.name, "ping");
        assert!(command.args.is_empty());
    }

    #[test]
    fn test_logical_command_parse_blank() {
        assert_eq!(LogicalCommand::parse(""), None);
        assert_eq!(LogicalCommand::parse("   "), None);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_command() {
        let registry = CommandRegistry::new();
        let command = LogicalCommand::parse("unknown_cmd").unwrap();

        let result = registry.dispatch(&test_context(), &command).await;
        assert!(matches!(result, Err(CommandError::NotFound(name)) if name == "unknown_cmd"));
    }

    #[tokio::test]
    async fn test_dispatch_invokes_handler_with_args() {
        let mut handler = MockCommandHandler::new();
        handler.expect_check().times(1).returning(|_| Ok(()));
        handler
            .expect_invoke()
            .withf(|context, args| {
                context.user_id == "@alice:example.com" && args.len() == 1 && args[0] == "start"
            })
            .times(1)
            .returning(|_, _| Ok(Completion::Done));

        let mut registry = CommandRegistry::new();
        registry.register("othello", Arc::new(handler));

        let command = LogicalCommand::parse("othello start").unwrap();
        let result = registry.dispatch(&test_context(), &command).await;
        assert!(matches!(result, Ok(Completion::Done)));
    }

    #[tokio::test]
    async fn test_dispatch_stops_on_failed_check() {
        let mut handler = MockCommandHandler::new();
        handler
            .expect_check()
            .returning(|_| Err(CommandError::Failed(anyhow::anyhow!("admins only"))));
        handler.expect_invoke().never();

        let mut registry = CommandRegistry::new();
        registry.register("shutdown", Arc::new(handler));

        let command = LogicalCommand::parse("shutdown").unwrap();
        let result = registry.dispatch(&test_context(), &command).await;
        assert!(matches!(result, Err(CommandError::Failed(e)) if e.to_string() == "admins only"));
    }

    #[tokio::test]
    async fn test_dispatch_forwards_handler_error() {
        let mut handler = MockCommandHandler::new();
        handler.expect_check().returning(|_| Ok(()));
        handler
            .expect_invoke()
            .returning(|_, _| Err(CommandError::Failed(anyhow::anyhow!("network down"))));

        let mut registry = CommandRegistry::new();
        registry.register("ping", Arc::new(handler));

        let command = LogicalCommand::parse("ping").unwrap();
        let result = registry.dispatch(&test_context(), &command).await;
        assert!(matches!(result, Err(CommandError::Failed(_))));
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = CommandRegistry::new();
        registry.register("othello", Arc::new(MockCommandHandler::new()));
        registry.register("echo", Arc::new(MockCommandHandler::new()));

        assert_eq!(registry.names(), vec!["echo", "othello"]);
        assert!(registry.contains("echo"));
        assert!(!registry.contains("help"));
    }
}
