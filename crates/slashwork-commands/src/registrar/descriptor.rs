//! Structural metadata a declarative command exposes about itself

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::arguments::{ArgumentDescriptor, ArgumentValue, Attachment, ChoiceValue};
use crate::context::CommandContext;
use crate::cooldown::CooldownScope;
use crate::model::{ContextScope, DefaultPermissions};
use crate::permission::{PermissionEvaluator, PermissionScope, Permissions};

pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Entry point of a declarative handler; arguments arrive positionally
pub type Handler = Arc<dyn Fn(CommandContext, HandlerArgs) -> HandlerFuture + Send + Sync>;

/// Wrap an async function taking `(context, args)` into a [`Handler`]
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(CommandContext, HandlerArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx, args| f(ctx, args).boxed())
}

/// Argument values in parameter declaration order; absent optionals are `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerArgs {
    values: Vec<Option<ArgumentValue>>,
}

impl HandlerArgs {
    pub fn new(values: Vec<Option<ArgumentValue>>) -> Self {
        Self { values }
    }

    pub(crate) fn collect(ctx: &CommandContext, names: &[String]) -> Self {
        Self {
            values: names
                .iter()
                .map(|name| ctx.argument(name).cloned())
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&ArgumentValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(ArgumentValue::as_str)
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(ArgumentValue::as_i64)
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(ArgumentValue::as_f64)
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(ArgumentValue::as_bool)
    }

    /// Snowflake of a user, channel, role, or mentionable argument
    pub fn id(&self, index: usize) -> Option<u64> {
        self.get(index).and_then(ArgumentValue::as_id)
    }

    pub fn attachment(&self, index: usize) -> Option<&Attachment> {
        self.get(index).and_then(ArgumentValue::as_attachment)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Tag attached to a handler parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterTag {
    /// Marks the parameter that receives the dispatch context
    Context,
    /// Declares the parameter as a command argument
    Argument(ArgumentDescriptor),
    /// Any other tag; ignored during resolution
    Marker(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub ident: String,
    pub tags: Vec<ParameterTag>,
}

impl ParameterDescriptor {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            tags: Vec::new(),
        }
    }

    /// The leading parameter that receives the context
    pub fn context(ident: impl Into<String>) -> Self {
        Self::new(ident).tag(ParameterTag::Context)
    }

    pub fn argument(ident: impl Into<String>, argument: ArgumentDescriptor) -> Self {
        Self::new(ident).tag(ParameterTag::Argument(argument))
    }

    pub fn tag(mut self, tag: ParameterTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn is_context(&self) -> bool {
        self.tags.contains(&ParameterTag::Context)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTag {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownTag {
    pub duration: Duration,
    pub scope: CooldownScope,
}

impl CooldownTag {
    /// Per-user cooldown of `duration`
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            scope: CooldownScope::User,
        }
    }

    pub fn with_scope(mut self, scope: CooldownScope) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionTag {
    Require {
        permissions: Permissions,
        scope: PermissionScope,
    },
    Owner,
}

impl PermissionTag {
    pub fn channel(permissions: Permissions) -> Self {
        PermissionTag::Require {
            permissions,
            scope: PermissionScope::Channel,
        }
    }

    pub fn guild(permissions: Permissions) -> Self {
        PermissionTag::Require {
            permissions,
            scope: PermissionScope::Guild,
        }
    }

    pub fn evaluator(&self) -> PermissionEvaluator {
        match *self {
            PermissionTag::Require { permissions, scope } => {
                PermissionEvaluator::scoped(scope, permissions)
            }
            PermissionTag::Owner => PermissionEvaluator::OwnerOnly,
        }
    }
}

/// Predefined choice targeted at one argument of the handler
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceTag {
    pub argument: String,
    pub label: String,
    pub value: ChoiceValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    Root,
    Sub { name: String, description: String },
}

/// One entry point of a declarative command
#[derive(Clone)]
pub struct HandlerDescriptor {
    pub kind: HandlerKind,
    pub async_execution: bool,
    pub send_typing: bool,
    pub acknowledge: bool,
    pub ephemeral: bool,
    pub group: Option<GroupTag>,
    pub cooldown: Option<CooldownTag>,
    pub permissions: Vec<PermissionTag>,
    pub choices: Vec<ChoiceTag>,
    pub parameters: Vec<ParameterDescriptor>,
    pub handler: Handler,
}

impl HandlerDescriptor {
    fn with_kind(kind: HandlerKind, handler: Handler) -> Self {
        Self {
            kind,
            async_execution: false,
            send_typing: false,
            acknowledge: true,
            ephemeral: false,
            group: None,
            cooldown: None,
            permissions: Vec::new(),
            choices: Vec::new(),
            parameters: Vec::new(),
            handler,
        }
    }

    /// Root handler; runs when no sub-command is named
    pub fn root(handler: Handler) -> Self {
        Self::with_kind(HandlerKind::Root, handler)
    }

    pub fn sub(name: impl Into<String>, description: impl Into<String>, handler: Handler) -> Self {
        Self::with_kind(
            HandlerKind::Sub {
                name: name.into(),
                description: description.into(),
            },
            handler,
        )
    }

    pub fn async_execution(mut self, async_execution: bool) -> Self {
        self.async_execution = async_execution;
        self
    }

    pub fn send_typing(mut self, send_typing: bool) -> Self {
        self.send_typing = send_typing;
        self
    }

    pub fn acknowledge(mut self, acknowledge: bool) -> Self {
        self.acknowledge = acknowledge;
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn in_group(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.group = Some(GroupTag {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    pub fn cooldown(mut self, cooldown: CooldownTag) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn permission(mut self, tag: PermissionTag) -> Self {
        self.permissions.push(tag);
        self
    }

    pub fn choice(
        mut self,
        argument: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<ChoiceValue>,
    ) -> Self {
        self.choices.push(ChoiceTag {
            argument: argument.into(),
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Name used in error messages
    pub fn label(&self) -> &str {
        match &self.kind {
            HandlerKind::Root => "<root>",
            HandlerKind::Sub { name, .. } => name,
        }
    }
}

/// Root metadata plus every handler of one declarative command
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub nsfw: bool,
    pub contexts: Vec<ContextScope>,
    pub default_permissions: DefaultPermissions,
    pub handlers: Vec<HandlerDescriptor>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            nsfw: false,
            contexts: ContextScope::ALL.to_vec(),
            default_permissions: DefaultPermissions::Enabled,
            handlers: Vec::new(),
        }
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    pub fn contexts(mut self, contexts: impl IntoIterator<Item = ContextScope>) -> Self {
        self.contexts = contexts.into_iter().collect();
        self
    }

    pub fn default_permissions(mut self, permissions: DefaultPermissions) -> Self {
        self.default_permissions = permissions;
        self
    }

    pub fn handler(mut self, handler: HandlerDescriptor) -> Self {
        self.handlers.push(handler);
        self
    }
}
