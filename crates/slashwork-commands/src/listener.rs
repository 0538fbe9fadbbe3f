//! Callbacks the dispatcher emits for each terminal outcome

use std::time::Duration;

use async_trait::async_trait;
use tracing::error;

use crate::context::CommandContext;
use crate::error::{CommandError, ExecutionError, Result};
use crate::model::{CommandDefinition, CommandNode};
use crate::responder::{Embed, Reply};

pub const UNKNOWN_COMMAND_MESSAGE: &str = "Unknown Command.";
pub const NO_PERMISSIONS_MESSAGE: &str = "You don't have permission to use this command.";
pub const COOLDOWN_MESSAGE: &str = "Please wait a bit before executing this command again.";
pub const EXCEPTION_MESSAGE: &str =
    "An error occurred while executing the command. Please try again later.";

/// Cancellable event handed to [`CommandListener::on_pre_process`]
pub struct PreProcessEvent<'a> {
    definition: &'a CommandDefinition,
    node: &'a CommandNode,
    context: &'a CommandContext,
    cancelled: bool,
}

impl<'a> PreProcessEvent<'a> {
    pub fn new(
        definition: &'a CommandDefinition,
        node: &'a CommandNode,
        context: &'a CommandContext,
    ) -> Self {
        Self {
            definition,
            node,
            context,
            cancelled: false,
        }
    }

    pub fn definition(&self) -> &CommandDefinition {
        self.definition
    }

    pub fn node(&self) -> &CommandNode {
        self.node
    }

    pub fn context(&self) -> &CommandContext {
        self.context
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Observer of the dispatch pipeline.
///
/// Every method has a default, so implementors override only what they need.
/// Errors returned from the reply callbacks are routed to
/// [`CommandListener::on_exception`].
#[async_trait]
pub trait CommandListener: Send + Sync {
    /// Runs inline before permission and cooldown checks; cancel to stop silently
    fn on_pre_process(&self, _event: &mut PreProcessEvent<'_>) {}

    async fn on_unknown_command(&self, ctx: &CommandContext) -> Result<()> {
        ctx.reply(Reply::embed(Embed::error(UNKNOWN_COMMAND_MESSAGE)).with_ephemeral(true))
            .await
    }

    async fn on_no_permissions(&self, ctx: &CommandContext, _node: &CommandNode) -> Result<()> {
        ctx.reply(Reply::embed(Embed::error(NO_PERMISSIONS_MESSAGE)).with_ephemeral(true))
            .await
    }

    async fn on_cooldown(
        &self,
        ctx: &CommandContext,
        _node: &CommandNode,
        _remaining: Option<Duration>,
    ) -> Result<()> {
        ctx.reply(Reply::embed(Embed::error(COOLDOWN_MESSAGE)).with_ephemeral(true))
            .await
    }

    /// Arguments that could not be parsed or broke their constraints
    async fn on_invalid_arguments(&self, ctx: &CommandContext, error: &CommandError) -> Result<()> {
        ctx.reply(Reply::embed(Embed::error(error.to_string())).with_ephemeral(true))
            .await
    }

    /// The dispatcher has already logged `error` when this runs
    async fn on_exception(&self, ctx: &CommandContext, _error: &ExecutionError) {
        let reply = Reply::embed(Embed::error(EXCEPTION_MESSAGE)).with_ephemeral(true);
        if let Err(reply_error) = ctx.reply(reply).await {
            error!(
                command = %ctx.full_command(),
                error = %reply_error,
                "Could not report command failure"
            );
        }
    }
}

/// Listener with every default in place
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultListener;

impl CommandListener for DefaultListener {}
