//! Slashwork command routing and dispatch
//!
//! Commands are trees: a definition holds an optional root node, direct
//! sub-commands, and sub-command groups. Trees are built with the fluent
//! builders, resolved from declarative descriptors, or loaded from manifest
//! files. The dispatcher resolves an invocation to a node, runs the
//! pre-process hook, checks permissions and cooldowns, and executes the node
//! inline or on the runtime.
//!
//! # Examples
//!
//! ```ignore
//! use std::sync::Arc;
//! use slashwork_commands::{ArgumentDescriptor, CommandBuilder, CommandContext, Dispatcher, NodeBuilder};
//!
//! let echo = CommandBuilder::new("echo", "Echo text back")
//!     .root(
//!         NodeBuilder::new("echo", "Echo text back").argument(
//!             ArgumentDescriptor::text("input", "Text to echo")
//!                 .with_required(true)
//!                 .with_min_length(1)
//!                 .with_max_length(100),
//!         ),
//!     )
//!     .executes(|ctx: CommandContext| async move {
//!         let text = ctx.arguments().text("input").unwrap_or_default().to_string();
//!         ctx.reply(text).await?;
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let dispatcher = Dispatcher::builder().command(echo).build()?;
//! dispatcher.dispatch("echo", None, None, ctx).await;
//! ```

pub mod arguments;
pub mod builder;
pub mod context;
pub mod cooldown;
pub mod dispatcher;
pub mod error;
pub mod limits;
pub mod listener;
pub mod manifest;
pub mod model;
pub mod permission;
pub mod registrar;
pub mod registry;
pub mod responder;
pub mod scheduler;

pub use arguments::{
    ArgumentDescriptor, ArgumentKind, ArgumentValue, Attachment, ChannelType, Choice,
    ChoiceValue, ProvidedArguments,
};
pub use builder::{CommandBuilder, GroupBuilder, NodeBuilder};
pub use context::{AppState, CommandContext, ContextBuilder, InvocationSource, MemberPermissions};
pub use cooldown::{Clock, Cooldown, CooldownScope, ManualClock, SystemClock};
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherBuilder, InteractionEvent};
pub use error::{CommandError, ExecutionError, LookupKind, ResponderError, Result};
pub use listener::{CommandListener, DefaultListener, PreProcessEvent};
pub use manifest::{CommandManifest, HandlerTable, ManifestLoader};
pub use model::{
    CommandDefinition, CommandGroup, CommandNode, ContextScope, DefaultPermissions, NodeHolder,
};
pub use permission::{PermissionEvaluator, PermissionScope, Permissions};
pub use registrar::{
    CommandDescriptor, CooldownTag, DeclarativeCommand, DeclarativeEntry, HandlerArgs,
    HandlerDescriptor, ParameterDescriptor, ParameterTag, PermissionTag,
};
pub use registry::CommandRegistry;
pub use responder::{Embed, Prompt, Reply, Responder};
pub use scheduler::{executor, Executor};

// For `slashwork_commands::inventory::submit!` without a direct dependency
pub use inventory;
