//! Per-invocation dispatch context

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use slashwork_common::Settings;

use crate::arguments::{ArgumentValue, ProvidedArguments};
use crate::error::{CommandError, Result};
use crate::permission::Permissions;
use crate::responder::{NoopResponder, Prompt, Reply, Responder};

pub type UserId = u64;
pub type GuildId = u64;
pub type ChannelId = u64;

/// Application-wide state a context can consult (owner list and so on)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    owners: HashSet<UserId>,
}

impl AppState {
    pub fn new(owners: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
        }
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owners.contains(&user_id)
    }

    pub fn owners(&self) -> impl Iterator<Item = UserId> + '_ {
        self.owners.iter().copied()
    }
}

impl From<&Settings> for AppState {
    fn from(settings: &Settings) -> Self {
        AppState::new(settings.owners.iter().copied())
    }
}

/// Effective permissions of the acting member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberPermissions {
    /// Guild-wide role permissions
    pub guild: Permissions,
    /// Permissions in the originating channel
    pub channel: Permissions,
}

impl MemberPermissions {
    /// Same grant at guild and channel level
    pub fn uniform(permissions: Permissions) -> Self {
        Self {
            guild: permissions,
            channel: permissions,
        }
    }
}

/// Where the invocation came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationSource {
    Interaction { id: u64 },
    Message { content: String },
}

/// Resolved command path of an invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub group: Option<String>,
    pub subcommand: Option<String>,
}

impl Invocation {
    pub fn new(command: &str, group: Option<&str>, subcommand: Option<&str>) -> Self {
        Self {
            command: command.to_string(),
            group: group.map(str::to_string),
            subcommand: subcommand.map(str::to_string),
        }
    }

    /// Space-joined path, e.g. `parent group1 sub2`
    pub fn full_name(&self) -> String {
        let mut parts = vec![self.command.as_str()];
        parts.extend(self.group.as_deref());
        parts.extend(self.subcommand.as_deref());
        parts.join(" ")
    }
}

/// Everything an executor or listener needs to know about one dispatch.
///
/// Clones share the acknowledgement flag and the responder, so a reply
/// sent from a background task still counts against the same interaction.
#[derive(Clone)]
pub struct CommandContext {
    invocation: Invocation,
    user_id: UserId,
    guild_id: Option<GuildId>,
    channel_id: Option<ChannelId>,
    member: Option<MemberPermissions>,
    arguments: Arc<ProvidedArguments>,
    source: InvocationSource,
    app: Arc<AppState>,
    responder: Arc<dyn Responder>,
    acknowledged: Arc<AtomicBool>,
}

impl CommandContext {
    pub fn builder(user_id: UserId) -> ContextBuilder {
        ContextBuilder::new(user_id)
    }

    pub fn command(&self) -> &str {
        &self.invocation.command
    }

    pub fn group(&self) -> Option<&str> {
        self.invocation.group.as_deref()
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.invocation.subcommand.as_deref()
    }

    pub fn full_command(&self) -> String {
        self.invocation.full_name()
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel_id
    }

    /// Whether the invocation happened inside a guild with a known member
    pub fn is_guild(&self) -> bool {
        self.guild_id.is_some() && self.member.is_some()
    }

    pub fn member(&self) -> Option<&MemberPermissions> {
        self.member.as_ref()
    }

    pub fn has_permission(&self, permissions: Permissions) -> bool {
        self.member
            .is_some_and(|member| member.guild.covers(permissions))
    }

    pub fn has_channel_permission(&self, permissions: Permissions) -> bool {
        self.member
            .is_some_and(|member| member.channel.covers(permissions))
    }

    pub fn arguments(&self) -> &ProvidedArguments {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }

    pub fn source(&self) -> &InvocationSource {
        &self.source
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self.source, InvocationSource::Interaction { .. })
    }

    pub fn app_state(&self) -> &AppState {
        &self.app
    }

    pub fn responder(&self) -> Arc<dyn Responder> {
        Arc::clone(&self.responder)
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::Acquire)
    }

    /// Send a reply; the first reply to an interaction acknowledges it
    pub async fn reply(&self, reply: impl Into<Reply>) -> Result<()> {
        self.acknowledged.store(true, Ordering::Release);
        self.responder.reply(reply.into()).await?;
        Ok(())
    }

    /// Acknowledge with a form-like prompt; fails if anything acknowledged first
    pub async fn acknowledge_with_prompt(&self, prompt: Prompt) -> Result<()> {
        self.claim_acknowledgement()?;
        self.responder.acknowledge_with_prompt(prompt).await?;
        Ok(())
    }

    /// Provisional acknowledgement; later replies become follow-ups
    pub async fn defer(&self, ephemeral: bool) -> Result<()> {
        self.claim_acknowledgement()?;
        self.responder.defer(ephemeral).await?;
        Ok(())
    }

    fn claim_acknowledgement(&self) -> Result<()> {
        if self.acknowledged.swap(true, Ordering::AcqRel) {
            return Err(CommandError::AlreadyAcknowledged);
        }
        Ok(())
    }

    pub(crate) fn set_invocation(&mut self, invocation: Invocation) {
        self.invocation = invocation;
    }

    pub(crate) fn set_arguments(&mut self, arguments: ProvidedArguments) {
        self.arguments = Arc::new(arguments);
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("invocation", &self.invocation)
            .field("user_id", &self.user_id)
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("member", &self.member)
            .field("arguments", &self.arguments)
            .field("source", &self.source)
            .field("acknowledged", &self.acknowledged())
            .finish()
    }
}

/// Builder used by transports (and tests) to assemble a context
pub struct ContextBuilder {
    invocation: Invocation,
    user_id: UserId,
    guild_id: Option<GuildId>,
    channel_id: Option<ChannelId>,
    member: Option<MemberPermissions>,
    arguments: ProvidedArguments,
    source: InvocationSource,
    app: Arc<AppState>,
    responder: Arc<dyn Responder>,
}

impl ContextBuilder {
    pub fn new(user_id: UserId) -> Self {
        Self {
            invocation: Invocation::default(),
            user_id,
            guild_id: None,
            channel_id: None,
            member: None,
            arguments: ProvidedArguments::default(),
            source: InvocationSource::Interaction { id: 0 },
            app: Arc::new(AppState::default()),
            responder: Arc::new(NoopResponder),
        }
    }

    pub fn invocation(mut self, command: &str, group: Option<&str>, subcommand: Option<&str>) -> Self {
        self.invocation = Invocation::new(command, group, subcommand);
        self
    }

    pub fn guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn channel(mut self, channel_id: ChannelId) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    pub fn member(mut self, member: MemberPermissions) -> Self {
        self.member = Some(member);
        self
    }

    pub fn arguments(mut self, arguments: ProvidedArguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn argument(mut self, name: impl Into<String>, value: ArgumentValue) -> Self {
        self.arguments.insert(name, value);
        self
    }

    pub fn source(mut self, source: InvocationSource) -> Self {
        self.source = source;
        self
    }

    pub fn app_state(mut self, app: Arc<AppState>) -> Self {
        self.app = app;
        self
    }

    pub fn responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = responder;
        self
    }

    pub fn build(self) -> CommandContext {
        CommandContext {
            invocation: self.invocation,
            user_id: self.user_id,
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            member: self.member,
            arguments: Arc::new(self.arguments),
            source: self.source,
            app: self.app,
            responder: self.responder,
            acknowledged: Arc::new(AtomicBool::new(false)),
        }
    }
}
