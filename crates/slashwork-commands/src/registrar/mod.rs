//! Declarative registrar
//!
//! Turns a [`CommandDescriptor`] (root metadata, handlers, and tagged
//! parameters) into a built [`CommandDefinition`]. Types opt in by
//! implementing [`DeclarativeCommand`], or by submitting a
//! [`DeclarativeEntry`] to the static registration table.

pub mod descriptor;
pub mod discovery;

use std::sync::Arc;

use tracing::{debug, warn};

pub use descriptor::{
    handler, ChoiceTag, CommandDescriptor, CooldownTag, GroupTag, Handler, HandlerArgs,
    HandlerDescriptor, HandlerFuture, HandlerKind, ParameterDescriptor, ParameterTag,
    PermissionTag,
};
pub use discovery::{discovered, resolve_discovered, DeclarativeEntry};

use crate::arguments::{ArgumentDescriptor, Choice};
use crate::builder::{CommandBuilder, GroupBuilder, NodeBuilder};
use crate::context::CommandContext;
use crate::error::{CommandError, Result};
use crate::model::CommandDefinition;
use crate::scheduler::Executor;

/// Discovery contract for a type that describes a command about itself
pub trait DeclarativeCommand {
    fn descriptor() -> CommandDescriptor;
}

/// Resolve the descriptor of `T`
pub fn resolve_type<T: DeclarativeCommand>() -> Result<CommandDefinition> {
    resolve(&T::descriptor())
}

/// Build a definition from declarative metadata
pub fn resolve(descriptor: &CommandDescriptor) -> Result<CommandDefinition> {
    if descriptor.name.trim().is_empty() {
        return Err(CommandError::configuration(
            "Declarative command is missing its root name",
        ));
    }
    if descriptor.description.trim().is_empty() {
        return Err(CommandError::configuration(format!(
            "Declarative command '{}' is missing its root description",
            descriptor.name
        )));
    }
    if descriptor.handlers.is_empty() {
        return Err(CommandError::configuration(format!(
            "Declarative command '{}' declares no handlers",
            descriptor.name
        )));
    }

    let mut builder = CommandBuilder::new(&descriptor.name, &descriptor.description)
        .nsfw(descriptor.nsfw)
        .context(descriptor.contexts.iter().copied())
        .default_permissions(descriptor.default_permissions);
    let mut groups: Vec<GroupBuilder> = Vec::new();
    let mut has_root = false;

    for handler in &descriptor.handlers {
        let arguments = resolve_arguments(&descriptor.name, handler)?;
        let node = resolve_node(descriptor, handler, arguments);

        match (&handler.kind, &handler.group) {
            (HandlerKind::Root, Some(group)) => {
                return Err(CommandError::configuration(format!(
                    "Root handler of '{}' cannot belong to group '{}'",
                    descriptor.name, group.name
                )));
            }
            (HandlerKind::Root, None) => {
                if has_root {
                    return Err(CommandError::configuration(format!(
                        "Declarative command '{}' declares more than one root handler",
                        descriptor.name
                    )));
                }
                has_root = true;
                builder = builder.root(node);
            }
            (HandlerKind::Sub { .. }, Some(tag)) => {
                match groups.iter_mut().find(|group| group.name() == tag.name) {
                    Some(group) => group.push(node),
                    None => groups.push(GroupBuilder::new(&tag.name, &tag.description).subcommand(node)),
                }
            }
            (HandlerKind::Sub { .. }, None) => {
                builder = builder.subcommand(node);
            }
        }
    }

    for group in groups {
        builder = builder.group(group);
    }

    let definition = builder.build()?;
    debug!(
        command = %descriptor.name,
        handlers = descriptor.handlers.len(),
        "Resolved declarative command"
    );
    Ok(definition)
}

fn resolve_arguments(command: &str, handler: &HandlerDescriptor) -> Result<Vec<ArgumentDescriptor>> {
    let label = handler.label();
    let mut parameters = handler.parameters.iter();

    match parameters.next() {
        Some(first) if first.is_context() => {}
        Some(first) => {
            return Err(CommandError::configuration(format!(
                "First parameter '{}' of handler '{}' in '{}' must receive the dispatch context",
                first.ident, label, command
            )));
        }
        None => {
            return Err(CommandError::configuration(format!(
                "Handler '{}' in '{}' does not receive the dispatch context",
                label, command
            )));
        }
    }

    let mut arguments = Vec::new();
    for parameter in parameters {
        if parameter.is_context() {
            return Err(CommandError::configuration(format!(
                "Parameter '{}' of handler '{}' in '{}': only the first parameter receives the context",
                parameter.ident, label, command
            )));
        }

        let mut tags = parameter.tags.iter().filter_map(|tag| match tag {
            ParameterTag::Argument(argument) => Some(argument),
            _ => None,
        });
        let argument = match (tags.next(), tags.next()) {
            (Some(argument), None) => argument,
            (None, _) => {
                return Err(CommandError::configuration(format!(
                    "Parameter '{}' of handler '{}' in '{}' has no argument tag",
                    parameter.ident, label, command
                )));
            }
            (Some(_), Some(_)) => {
                return Err(CommandError::configuration(format!(
                    "Parameter '{}' of handler '{}' in '{}' has more than one argument tag",
                    parameter.ident, label, command
                )));
            }
        };

        let choices = handler
            .choices
            .iter()
            .filter(|choice| choice.argument == argument.name())
            .map(|choice| Choice::new(choice.label.clone(), choice.value.clone()));
        arguments.push(argument.clone().with_choices(choices));
    }

    for choice in &handler.choices {
        if !arguments.iter().any(|argument| argument.name() == choice.argument) {
            warn!(
                command = %command,
                handler = %label,
                argument = %choice.argument,
                "Choice targets an argument the handler does not declare"
            );
        }
    }

    Ok(arguments)
}

fn resolve_node(
    descriptor: &CommandDescriptor,
    handler: &HandlerDescriptor,
    arguments: Vec<ArgumentDescriptor>,
) -> NodeBuilder {
    let (name, description) = match &handler.kind {
        HandlerKind::Root => (descriptor.name.as_str(), descriptor.description.as_str()),
        HandlerKind::Sub { name, description } => (name.as_str(), description.as_str()),
    };

    let names: Arc<[String]> = arguments
        .iter()
        .map(|argument| argument.name().to_string())
        .collect();
    let function = Arc::clone(&handler.handler);
    let executor: Executor = Arc::new(move |ctx: CommandContext| {
        let args = HandlerArgs::collect(&ctx, &names);
        function(ctx, args)
    });

    let mut node = NodeBuilder::new(name, description)
        .async_execution(handler.async_execution)
        .send_typing(handler.send_typing)
        .acknowledge(handler.acknowledge)
        .ephemeral(handler.ephemeral)
        .arguments(arguments)
        .permissions(handler.permissions.iter().map(PermissionTag::evaluator))
        .executor(executor);

    if let Some(cooldown) = handler.cooldown {
        node = node.cooldown(cooldown.scope, cooldown.duration);
    }
    node
}
