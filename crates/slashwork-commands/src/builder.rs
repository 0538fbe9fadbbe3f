//! Fluent builders for the command tree
//!
//! Builders are plain values. `build` borrows the builder, so building twice
//! yields two independent trees with separate cooldown state.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::arguments::ArgumentDescriptor;
use crate::cooldown::{Clock, Cooldown, CooldownScope, SystemClock};
use crate::context::CommandContext;
use crate::error::{CommandError, Result};
use crate::limits::{self, MAX_OPTIONS, MAX_SUBCOMMANDS};
use crate::model::{
    CommandDefinition, CommandGroup, CommandNode, ContextScope, DefaultPermissions, NodeKind,
    NodePath,
};
use crate::permission::PermissionEvaluator;
use crate::scheduler::{self, Executor};

/// Builder for a root or sub-command node
#[derive(Clone)]
pub struct NodeBuilder {
    name: String,
    description: String,
    permissions: Vec<PermissionEvaluator>,
    async_execution: bool,
    send_typing: bool,
    acknowledge: bool,
    ephemeral: bool,
    arguments: Vec<ArgumentDescriptor>,
    cooldown: Option<(CooldownScope, Duration)>,
    clock: Option<Arc<dyn Clock>>,
    executor: Option<Executor>,
}

impl NodeBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            permissions: Vec::new(),
            async_execution: false,
            send_typing: false,
            acknowledge: true,
            ephemeral: false,
            arguments: Vec::new(),
            cooldown: None,
            clock: None,
            executor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn permission(mut self, evaluator: PermissionEvaluator) -> Self {
        self.permissions.push(evaluator);
        self
    }

    pub fn permissions(mut self, evaluators: impl IntoIterator<Item = PermissionEvaluator>) -> Self {
        self.permissions.extend(evaluators);
        self
    }

    pub fn async_execution(mut self, async_execution: bool) -> Self {
        self.async_execution = async_execution;
        self
    }

    pub fn send_typing(mut self, send_typing: bool) -> Self {
        self.send_typing = send_typing;
        self
    }

    /// Whether the transport should defer the interaction before dispatch (default: true)
    pub fn acknowledge(mut self, acknowledge: bool) -> Self {
        self.acknowledge = acknowledge;
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn argument(mut self, argument: ArgumentDescriptor) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn arguments(mut self, arguments: impl IntoIterator<Item = ArgumentDescriptor>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn cooldown(mut self, scope: CooldownScope, duration: Duration) -> Self {
        self.cooldown = Some((scope, duration));
        self
    }

    /// Time source for the cooldown; the system clock by default
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn executor(mut self, executor: Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn executes<F, Fut>(self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.executor(scheduler::executor(f))
    }

    /// Build a standalone root node
    pub fn build(&self) -> Result<CommandNode> {
        let path = NodePath {
            command: self.name.clone(),
            group: None,
        };
        self.build_at(path, NodeKind::Root)
    }

    pub(crate) fn build_at(&self, path: NodePath, kind: NodeKind) -> Result<CommandNode> {
        let what = match kind {
            NodeKind::Root => "Command",
            NodeKind::Subcommand => "Subcommand",
        };
        limits::check_name(what, &self.name)?;
        limits::check_description(what, &self.name, &self.description)?;

        let executor = self.executor.clone().ok_or_else(|| {
            CommandError::configuration(format!("{} '{}' has no executor", what, self.name))
        })?;

        if self.arguments.len() > MAX_OPTIONS {
            return Err(CommandError::configuration(format!(
                "{} '{}' declares {} arguments, the maximum is {}",
                what,
                self.name,
                self.arguments.len(),
                MAX_OPTIONS
            )));
        }
        let mut seen = HashSet::new();
        for argument in &self.arguments {
            argument.validate()?;
            if !seen.insert(argument.name()) {
                return Err(CommandError::configuration(format!(
                    "{} '{}' declares argument '{}' twice",
                    what,
                    self.name,
                    argument.name()
                )));
            }
        }

        let cooldown = match self.cooldown {
            Some((scope, duration)) => {
                limits::check_cooldown(what, &self.name, duration)?;
                let clock = self.clock.clone().unwrap_or_else(|| Arc::new(SystemClock));
                Cooldown::with_clock(scope, duration, clock)
            }
            None => Cooldown::none(),
        };

        Ok(CommandNode {
            name: self.name.clone(),
            description: self.description.clone(),
            kind,
            path,
            arguments: self.arguments.clone(),
            permissions: self.permissions.clone(),
            async_execution: self.async_execution,
            send_typing: self.send_typing,
            acknowledge: self.acknowledge,
            ephemeral: self.ephemeral,
            cooldown,
            executor,
        })
    }
}

/// Builder for a sub-command group
#[derive(Clone)]
pub struct GroupBuilder {
    name: String,
    description: String,
    subcommands: Vec<NodeBuilder>,
}

impl GroupBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subcommands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subcommand(mut self, node: NodeBuilder) -> Self {
        self.subcommands.push(node);
        self
    }

    pub(crate) fn push(&mut self, node: NodeBuilder) {
        self.subcommands.push(node);
    }

    fn build_into(&self, command: &str, group: &mut CommandGroup) -> Result<()> {
        for sub in &self.subcommands {
            let path = NodePath {
                command: command.to_string(),
                group: Some(self.name.clone()),
            };
            let node = sub.build_at(path, NodeKind::Subcommand)?;
            if group.nodes.contains_key(node.name()) {
                return Err(CommandError::configuration(format!(
                    "Group '{}' of '{}' declares sub-command '{}' twice",
                    self.name,
                    command,
                    node.name()
                )));
            }
            group.nodes.insert(node.name().to_string(), Arc::new(node));
        }
        Ok(())
    }
}

/// Builder for a top-level command
#[derive(Clone)]
pub struct CommandBuilder {
    name: String,
    description: String,
    contexts: Vec<ContextScope>,
    default_permissions: DefaultPermissions,
    nsfw: bool,
    root: Option<NodeBuilder>,
    subcommands: Vec<NodeBuilder>,
    groups: Vec<GroupBuilder>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            contexts: ContextScope::ALL.to_vec(),
            default_permissions: DefaultPermissions::Enabled,
            nsfw: false,
            root: None,
            subcommands: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the set of contexts the command is valid in
    pub fn context(mut self, scopes: impl IntoIterator<Item = ContextScope>) -> Self {
        self.contexts = scopes.into_iter().collect();
        self
    }

    pub fn default_permissions(mut self, permissions: DefaultPermissions) -> Self {
        self.default_permissions = permissions;
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    /// Use `node` as the root; its name and description are replaced by the command's
    pub fn root(mut self, node: NodeBuilder) -> Self {
        self.root = Some(node);
        self
    }

    /// Make the command directly executable, keeping any root settings already made
    pub fn executes<F, Fut>(self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.root_executor(scheduler::executor(f))
    }

    pub fn root_executor(mut self, executor: Executor) -> Self {
        let root = self
            .root
            .take()
            .unwrap_or_else(|| NodeBuilder::new(self.name.clone(), self.description.clone()));
        self.root = Some(root.executor(executor));
        self
    }

    pub fn subcommand(mut self, node: NodeBuilder) -> Self {
        self.subcommands.push(node);
        self
    }

    /// Add a group; groups sharing a name are merged
    pub fn group(mut self, group: GroupBuilder) -> Self {
        self.groups.push(group);
        self
    }

    pub fn build(&self) -> Result<CommandDefinition> {
        limits::check_name("Command", &self.name)?;
        limits::check_description("Command", &self.name, &self.description)?;

        if self.contexts.is_empty() {
            return Err(CommandError::configuration(format!(
                "Command '{}' is not valid in any context",
                self.name
            )));
        }
        if self.root.is_none() && self.subcommands.is_empty() && self.groups.is_empty() {
            return Err(CommandError::configuration(format!(
                "Command '{}' has nothing to execute",
                self.name
            )));
        }

        let root = match &self.root {
            Some(root) => {
                let mut root = root.clone();
                root.name = self.name.clone();
                root.description = self.description.clone();
                let path = NodePath {
                    command: self.name.clone(),
                    group: None,
                };
                Some(Arc::new(root.build_at(path, NodeKind::Root)?))
            }
            None => None,
        };

        let mut nodes = BTreeMap::new();
        for sub in &self.subcommands {
            let path = NodePath {
                command: self.name.clone(),
                group: None,
            };
            let node = sub.build_at(path, NodeKind::Subcommand)?;
            if nodes.contains_key(node.name()) {
                return Err(CommandError::configuration(format!(
                    "Command '{}' declares sub-command '{}' twice",
                    self.name,
                    node.name()
                )));
            }
            nodes.insert(node.name().to_string(), Arc::new(node));
        }

        let mut groups: BTreeMap<String, CommandGroup> = BTreeMap::new();
        for group in &self.groups {
            limits::check_name("Group", &group.name)?;
            limits::check_description("Group", &group.name, &group.description)?;
            if nodes.contains_key(&group.name) {
                return Err(CommandError::configuration(format!(
                    "Command '{}' uses '{}' as both a sub-command and a group",
                    self.name, group.name
                )));
            }
            let target = groups
                .entry(group.name.clone())
                .or_insert_with(|| CommandGroup {
                    name: group.name.clone(),
                    description: group.description.clone(),
                    nodes: BTreeMap::new(),
                });
            group.build_into(&self.name, target)?;
        }

        if nodes.len() + groups.len() > MAX_SUBCOMMANDS {
            return Err(CommandError::configuration(format!(
                "Command '{}' has {} sub-commands and groups, the maximum is {}",
                self.name,
                nodes.len() + groups.len(),
                MAX_SUBCOMMANDS
            )));
        }
        if let Some(group) = groups
            .values()
            .find(|group| group.nodes.len() > MAX_SUBCOMMANDS)
        {
            return Err(CommandError::configuration(format!(
                "Group '{}' of '{}' has {} sub-commands, the maximum is {}",
                group.name,
                self.name,
                group.nodes.len(),
                MAX_SUBCOMMANDS
            )));
        }
        if let Some(group) = groups.values().find(|group| group.nodes.is_empty()) {
            return Err(CommandError::configuration(format!(
                "Group '{}' of '{}' has no sub-commands",
                group.name, self.name
            )));
        }

        debug!(
            command = %self.name,
            root = root.is_some(),
            subcommands = nodes.len(),
            groups = groups.len(),
            "Built command definition"
        );

        Ok(CommandDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            contexts: self.contexts.clone(),
            default_permissions: self.default_permissions,
            nsfw: self.nsfw,
            root,
            nodes,
            groups,
        })
    }
}
