//! Immutable command tree: definition → groups → nodes

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::arguments::ArgumentDescriptor;
use crate::context::CommandContext;
use crate::cooldown::Cooldown;
use crate::error::{CommandError, LookupKind, Result};
use crate::permission::{self, PermissionEvaluator, Permissions};
use crate::scheduler::Executor;

/// Where a command may be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextScope {
    Guild,
    BotDm,
    PrivateChannel,
}

impl ContextScope {
    pub const ALL: [ContextScope; 3] = [
        ContextScope::Guild,
        ContextScope::BotDm,
        ContextScope::PrivateChannel,
    ];
}

/// Who can see and use the command before server admins change anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPermissions {
    #[default]
    Enabled,
    Disabled,
    Require(Permissions),
}

/// Position of a node inside its command tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    pub command: String,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Subcommand,
}

/// Executable unit: the root of a command or one of its sub-commands
pub struct CommandNode {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) kind: NodeKind,
    pub(crate) path: NodePath,
    pub(crate) arguments: Vec<ArgumentDescriptor>,
    pub(crate) permissions: Vec<PermissionEvaluator>,
    pub(crate) async_execution: bool,
    pub(crate) send_typing: bool,
    pub(crate) acknowledge: bool,
    pub(crate) ephemeral: bool,
    pub(crate) cooldown: Cooldown,
    pub(crate) executor: Executor,
}

impl CommandNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Space-joined invocation path, e.g. `parent group1 sub2`
    pub fn qualified_name(&self) -> String {
        match (self.kind, &self.path.group) {
            (NodeKind::Root, _) => self.path.command.clone(),
            (NodeKind::Subcommand, Some(group)) => {
                format!("{} {} {}", self.path.command, group, self.name)
            }
            (NodeKind::Subcommand, None) => format!("{} {}", self.path.command, self.name),
        }
    }

    pub fn arguments(&self) -> &[ArgumentDescriptor] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|arg| arg.name() == name)
    }

    pub fn permissions(&self) -> &[PermissionEvaluator] {
        &self.permissions
    }

    pub fn is_async(&self) -> bool {
        self.async_execution
    }

    pub fn sends_typing(&self) -> bool {
        self.send_typing
    }

    pub fn acknowledges(&self) -> bool {
        self.acknowledge
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Permission and cooldown gate for one invocation.
    ///
    /// Permissions are only evaluated in guild contexts. Passing the gate
    /// opens a new cooldown window for the context's key.
    pub fn admit(&self, ctx: &CommandContext) -> Result<()> {
        if ctx.is_guild() && permission::first_uncovered(&self.permissions, ctx).is_some() {
            return Err(CommandError::PermissionDenied);
        }
        if !self.cooldown.is_none() && !self.cooldown.should_execute(ctx) {
            return Err(CommandError::CooldownActive {
                remaining: self.cooldown.remaining(ctx).unwrap_or_default(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("arguments", &self.arguments)
            .field("permissions", &self.permissions)
            .field("async_execution", &self.async_execution)
            .field("send_typing", &self.send_typing)
            .field("acknowledge", &self.acknowledge)
            .field("ephemeral", &self.ephemeral)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Anything that holds name-keyed nodes: a definition or one of its groups
pub trait NodeHolder {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn nodes(&self) -> &BTreeMap<String, Arc<CommandNode>>;

    /// Look up a direct child node
    fn node(&self, name: &str) -> Result<&Arc<CommandNode>> {
        self.nodes()
            .get(name)
            .ok_or_else(|| CommandError::not_found(LookupKind::Subcommand, name))
    }

    fn has_node(&self, name: &str) -> bool {
        self.nodes().contains_key(name)
    }

    fn node_names(&self) -> Vec<&str> {
        self.nodes().keys().map(String::as_str).collect()
    }
}

/// Sub-command group; holds nodes only
#[derive(Debug)]
pub struct CommandGroup {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) nodes: BTreeMap<String, Arc<CommandNode>>,
}

impl NodeHolder for CommandGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn nodes(&self) -> &BTreeMap<String, Arc<CommandNode>> {
        &self.nodes
    }
}

/// Top-level command
#[derive(Debug)]
pub struct CommandDefinition {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) contexts: Vec<ContextScope>,
    pub(crate) default_permissions: DefaultPermissions,
    pub(crate) nsfw: bool,
    pub(crate) root: Option<Arc<CommandNode>>,
    pub(crate) nodes: BTreeMap<String, Arc<CommandNode>>,
    pub(crate) groups: BTreeMap<String, CommandGroup>,
}

impl CommandDefinition {
    pub fn contexts(&self) -> &[ContextScope] {
        &self.contexts
    }

    pub fn allows_context(&self, scope: ContextScope) -> bool {
        self.contexts.contains(&scope)
    }

    pub fn default_permissions(&self) -> DefaultPermissions {
        self.default_permissions
    }

    pub fn is_nsfw(&self) -> bool {
        self.nsfw
    }

    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    /// The directly executable node
    pub fn root(&self) -> Result<&Arc<CommandNode>> {
        self.root
            .as_ref()
            .ok_or_else(|| CommandError::not_found(LookupKind::Root, &self.name))
    }

    pub fn group(&self, name: &str) -> Result<&CommandGroup> {
        self.groups
            .get(name)
            .ok_or_else(|| CommandError::not_found(LookupKind::Group, name))
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn groups(&self) -> impl Iterator<Item = &CommandGroup> {
        self.groups.values()
    }

    /// Find the node an invocation addresses.
    ///
    /// Without a sub-command the root is used and `group` is ignored.
    pub fn resolve(&self, group: Option<&str>, subcommand: Option<&str>) -> Result<&Arc<CommandNode>> {
        let Some(subcommand) = subcommand else {
            return self.root();
        };
        match group {
            Some(group) => self.group(group)?.node(subcommand),
            None => self.node(subcommand),
        }
    }

    /// Root, direct sub-commands, and grouped sub-commands
    pub fn all_nodes(&self) -> impl Iterator<Item = &Arc<CommandNode>> {
        self.root
            .iter()
            .chain(self.nodes.values())
            .chain(self.groups.values().flat_map(|group| group.nodes.values()))
    }

    pub fn clear_cooldowns(&self) {
        for node in self.all_nodes() {
            node.cooldown().clear_all();
        }
    }
}

impl NodeHolder for CommandDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn nodes(&self) -> &BTreeMap<String, Arc<CommandNode>> {
        &self.nodes
    }
}
