//! Dispatch pipeline
//!
//! Every dispatch ends in exactly one [`DispatchOutcome`]. The steps run in a
//! fixed order on the calling task:
//!
//! 1. resolve the command and node (miss: `on_unknown_command`)
//! 2. pre-process hook (cancelled: stop silently)
//! 3. permission check, guild contexts only (`on_no_permissions`)
//! 4. cooldown check (`on_cooldown`)
//! 5. optional typing indicator, fire-and-forget
//! 6. execution, inline or on the runtime; failures reach `on_exception`

pub mod prefix;

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use slashwork_common::{format_error, Settings};

use crate::arguments::ProvidedArguments;
use crate::context::{CommandContext, Invocation};
use crate::error::{CommandError, ExecutionError, Result};
use crate::listener::{CommandListener, DefaultListener, PreProcessEvent};
use crate::model::{CommandDefinition, CommandNode};
use crate::registrar::{self, DeclarativeCommand};
use crate::registry::CommandRegistry;
use crate::scheduler::{self, TaskStatus};

/// Terminal state of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Executor ran inline and returned `Ok`
    Completed,
    /// Executor was handed to the runtime; failures are reported later
    Scheduled,
    /// Executor returned an error or panicked
    Failed,
    Unknown,
    Cancelled,
    PermissionDenied,
    CooldownActive,
    InvalidArguments,
    /// The entry point is disabled or the message is not a command
    Ignored,
}

/// Slash-command invocation as the transport reports it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionEvent {
    pub command: String,
    pub group: Option<String>,
    pub subcommand: Option<String>,
    pub arguments: ProvidedArguments,
}

impl InteractionEvent {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }

    pub fn with_arguments(mut self, arguments: ProvidedArguments) -> Self {
        self.arguments = arguments;
        self
    }
}

/// Routes invocations through the registry and reports to a listener
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    listener: Arc<dyn CommandListener>,
    use_slash_commands: bool,
    message_prefix: Option<String>,
}

impl Dispatcher {
    /// Slash commands on, no message prefix
    pub fn new(registry: Arc<CommandRegistry>, listener: Arc<dyn CommandListener>) -> Self {
        Self {
            registry,
            listener,
            use_slash_commands: true,
            message_prefix: None,
        }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn listener(&self) -> &Arc<dyn CommandListener> {
        &self.listener
    }

    pub fn uses_slash_commands(&self) -> bool {
        self.use_slash_commands
    }

    pub fn message_prefix(&self) -> Option<&str> {
        self.message_prefix.as_deref()
    }

    /// Run the pipeline for an already-parsed invocation
    pub async fn dispatch(
        &self,
        command: &str,
        group: Option<&str>,
        subcommand: Option<&str>,
        mut ctx: CommandContext,
    ) -> DispatchOutcome {
        ctx.set_invocation(Invocation::new(command, group, subcommand));
        match self.lookup(command, group, subcommand, &ctx).await {
            Some((definition, node)) => self.execute(&definition, &node, ctx).await,
            None => DispatchOutcome::Unknown,
        }
    }

    /// Slash entry point; defers acknowledging nodes before the pipeline runs
    pub async fn handle_interaction(
        &self,
        event: InteractionEvent,
        mut ctx: CommandContext,
    ) -> DispatchOutcome {
        if !self.use_slash_commands {
            debug!(command = %event.command, "Slash commands are disabled; ignoring interaction");
            return DispatchOutcome::Ignored;
        }

        let group = event.group.as_deref();
        let subcommand = event.subcommand.as_deref();
        ctx.set_invocation(Invocation::new(&event.command, group, subcommand));
        ctx.set_arguments(event.arguments.clone());

        let Some((definition, node)) = self.lookup(&event.command, group, subcommand, &ctx).await
        else {
            return DispatchOutcome::Unknown;
        };

        if let Err(error) = prefix::check_arguments(node.arguments(), ctx.arguments()) {
            debug!(command = %ctx.full_command(), error = %error, "Rejected interaction arguments");
            let result = self.listener.on_invalid_arguments(&ctx, &error).await;
            self.report(&ctx, result).await;
            return DispatchOutcome::InvalidArguments;
        }

        if node.acknowledges() {
            if let Err(error) = ctx.defer(node.is_ephemeral()).await {
                warn!(command = %ctx.full_command(), error = %error, "Could not defer interaction");
            }
        }

        self.execute(&definition, &node, ctx).await
    }

    /// Prefix entry point; messages without the configured prefix are ignored
    pub async fn handle_message(&self, content: &str, mut ctx: CommandContext) -> DispatchOutcome {
        let Some(body) = self
            .message_prefix
            .as_deref()
            .and_then(|prefix| content.strip_prefix(prefix))
        else {
            return DispatchOutcome::Ignored;
        };

        let tokens: Vec<&str> = body.split_whitespace().collect();
        let Some((&command, rest)) = tokens.split_first() else {
            return DispatchOutcome::Ignored;
        };
        ctx.set_invocation(Invocation::new(command, None, None));

        let Some(definition) = self.registry.get(command) else {
            return self.unknown(&ctx).await;
        };
        let Some(route) = prefix::route(&definition, rest) else {
            return self.unknown(&ctx).await;
        };
        ctx.set_invocation(Invocation::new(command, route.group, route.subcommand));

        let node = match definition.resolve(route.group, route.subcommand) {
            Ok(node) => Arc::clone(node),
            Err(error) => {
                warn!(command = %ctx.full_command(), error = %error, "Could not resolve command");
                return self.unknown(&ctx).await;
            }
        };

        match prefix::parse_arguments(node.arguments(), route.rest) {
            Ok(arguments) => ctx.set_arguments(arguments),
            Err(error) => {
                debug!(command = %ctx.full_command(), error = %error, "Rejected message arguments");
                let result = self.listener.on_invalid_arguments(&ctx, &error).await;
                self.report(&ctx, result).await;
                return DispatchOutcome::InvalidArguments;
            }
        }

        self.execute(&definition, &node, ctx).await
    }

    async fn lookup(
        &self,
        command: &str,
        group: Option<&str>,
        subcommand: Option<&str>,
        ctx: &CommandContext,
    ) -> Option<(Arc<CommandDefinition>, Arc<CommandNode>)> {
        match self.registry.resolve(command, group, subcommand) {
            Ok(resolved) => Some(resolved),
            Err(error) => {
                warn!(command = %ctx.full_command(), error = %error, "Could not resolve command");
                self.unknown(ctx).await;
                None
            }
        }
    }

    async fn unknown(&self, ctx: &CommandContext) -> DispatchOutcome {
        let result = self.listener.on_unknown_command(ctx).await;
        self.report(ctx, result).await;
        DispatchOutcome::Unknown
    }

    /// Steps 2 to 6 for a resolved node
    async fn execute(
        &self,
        definition: &CommandDefinition,
        node: &Arc<CommandNode>,
        ctx: CommandContext,
    ) -> DispatchOutcome {
        let cancelled = {
            let mut event = PreProcessEvent::new(definition, node, &ctx);
            self.listener.on_pre_process(&mut event);
            event.is_cancelled()
        };
        if cancelled {
            debug!(command = %ctx.full_command(), "Dispatch cancelled by pre-process hook");
            return DispatchOutcome::Cancelled;
        }

        if let Err(refused) = node.admit(&ctx) {
            debug!(
                command = %ctx.full_command(),
                user_id = ctx.user_id(),
                reason = %refused,
                "Invocation refused"
            );
            return match refused {
                CommandError::CooldownActive { remaining } => {
                    let remaining = (!remaining.is_zero()).then_some(remaining);
                    let result = self.listener.on_cooldown(&ctx, node, remaining).await;
                    self.report(&ctx, result).await;
                    DispatchOutcome::CooldownActive
                }
                _ => {
                    let result = self.listener.on_no_permissions(&ctx, node).await;
                    self.report(&ctx, result).await;
                    DispatchOutcome::PermissionDenied
                }
            };
        }

        if node.sends_typing() {
            if let Ok(runtime) = Handle::try_current() {
                let responder = ctx.responder();
                runtime.spawn(async move {
                    if let Err(error) = responder.send_typing().await {
                        debug!(error = %error, "Typing indicator failed");
                    }
                });
            }
        }

        debug!(command = %ctx.full_command(), user_id = ctx.user_id(), "Executing command");
        let task = if node.is_async() {
            scheduler::run_async(node.executor(), ctx.clone())
        } else {
            scheduler::run_sync(node.executor(), ctx.clone()).await
        };

        let listener = Arc::clone(&self.listener);
        let status = task
            .on_exception(move |error| async move {
                error!(
                    command = %ctx.full_command(),
                    user_id = ctx.user_id(),
                    error = %format_error(&error),
                    "Command execution failed"
                );
                listener.on_exception(&ctx, &error).await;
            })
            .await;

        match status {
            TaskStatus::Completed => DispatchOutcome::Completed,
            TaskStatus::Failed => DispatchOutcome::Failed,
            TaskStatus::Scheduled(_) => DispatchOutcome::Scheduled,
        }
    }

    /// Route a failed listener callback to `on_exception`
    async fn report(&self, ctx: &CommandContext, result: Result<()>) {
        if let Err(error) = result {
            let error = ExecutionError::from_command(error);
            error!(
                command = %ctx.full_command(),
                error = %format_error(&error),
                "Listener callback failed"
            );
            self.listener.on_exception(ctx, &error).await;
        }
    }
}

type PendingDefinition = fn() -> Result<CommandDefinition>;

/// Assembles a [`Dispatcher`] and its registry
pub struct DispatcherBuilder {
    registry: Option<Arc<CommandRegistry>>,
    listener: Option<Arc<dyn CommandListener>>,
    use_slash_commands: bool,
    message_prefix: Option<String>,
    definitions: Vec<CommandDefinition>,
    declarative: Vec<PendingDefinition>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            listener: None,
            use_slash_commands: true,
            message_prefix: None,
            definitions: Vec::new(),
            declarative: Vec::new(),
        }
    }

    /// Share an existing registry instead of creating a new one
    pub fn registry(mut self, registry: Arc<CommandRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn CommandListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Take the entry-point switches from loaded settings
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.use_slash_commands = settings.use_slash_commands;
        self.message_prefix = settings.message_prefix.clone();
        self
    }

    pub fn use_slash_commands(mut self, enabled: bool) -> Self {
        self.use_slash_commands = enabled;
        self
    }

    pub fn message_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.message_prefix = Some(prefix.into());
        self
    }

    pub fn command(mut self, definition: CommandDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn commands(mut self, definitions: impl IntoIterator<Item = CommandDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Resolve `T` when the dispatcher is built
    pub fn declarative<T: DeclarativeCommand>(mut self) -> Self {
        self.declarative.push(registrar::resolve_type::<T>);
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        if let Some(prefix) = &self.message_prefix {
            if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
                return Err(CommandError::configuration(format!(
                    "Message prefix '{}' must be non-empty and contain no whitespace",
                    prefix
                )));
            }
        }
        if !self.use_slash_commands && self.message_prefix.is_none() {
            return Err(CommandError::configuration(
                "Slash commands are disabled and no message prefix is set",
            ));
        }

        let mut resolved = Vec::with_capacity(self.declarative.len());
        for resolve in &self.declarative {
            resolved.push(resolve()?);
        }

        let registry = self.registry.unwrap_or_default();
        registry.register_all(self.definitions).register_all(resolved);

        debug!(
            commands = registry.len(),
            slash = self.use_slash_commands,
            prefix = ?self.message_prefix,
            "Built dispatcher"
        );

        Ok(Dispatcher {
            registry,
            listener: self.listener.unwrap_or_else(|| Arc::new(DefaultListener)),
            use_slash_commands: self.use_slash_commands,
            message_prefix: self.message_prefix,
        })
    }
}
