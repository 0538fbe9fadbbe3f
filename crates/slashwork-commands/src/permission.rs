//! Permission bits and the evaluators attached to command nodes
//!
//! Evaluators are plain values. A node's list is checked with AND semantics
//! and the first uncovered evaluator ends the check.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::context::CommandContext;

bitflags! {
    /// Platform permission bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE = 1 << 0;
        const KICK_MEMBERS = 1 << 1;
        const BAN_MEMBERS = 1 << 2;
        const ADMINISTRATOR = 1 << 3;
        const MANAGE_CHANNELS = 1 << 4;
        const MANAGE_GUILD = 1 << 5;
        const ADD_REACTIONS = 1 << 6;
        const VIEW_AUDIT_LOG = 1 << 7;
        const PRIORITY_SPEAKER = 1 << 8;
        const STREAM = 1 << 9;
        const VIEW_CHANNEL = 1 << 10;
        const SEND_MESSAGES = 1 << 11;
        const SEND_TTS_MESSAGES = 1 << 12;
        const MANAGE_MESSAGES = 1 << 13;
        const EMBED_LINKS = 1 << 14;
        const ATTACH_FILES = 1 << 15;
        const READ_MESSAGE_HISTORY = 1 << 16;
        const MENTION_EVERYONE = 1 << 17;
        const USE_EXTERNAL_EMOJIS = 1 << 18;
        const CONNECT = 1 << 20;
        const SPEAK = 1 << 21;
        const MUTE_MEMBERS = 1 << 22;
        const DEAFEN_MEMBERS = 1 << 23;
        const MOVE_MEMBERS = 1 << 24;
        const CHANGE_NICKNAME = 1 << 26;
        const MANAGE_NICKNAMES = 1 << 27;
        const MANAGE_ROLES = 1 << 28;
        const MANAGE_WEBHOOKS = 1 << 29;
        const USE_APPLICATION_COMMANDS = 1 << 31;
        const MANAGE_THREADS = 1 << 34;
        const MODERATE_MEMBERS = 1 << 40;
    }
}

impl Permissions {
    /// Whether `self` (a member's grant) covers `required`.
    ///
    /// Administrators are covered for everything.
    pub fn covers(&self, required: Permissions) -> bool {
        self.contains(Permissions::ADMINISTRATOR) || self.contains(required)
    }
}

/// Where a permission bit is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Permissions in the originating channel, overwrites applied
    #[default]
    Channel,
    /// Guild-wide role permissions
    Guild,
}

/// A single authorization requirement on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "permissions", rename_all = "snake_case")]
pub enum PermissionEvaluator {
    Channel(Permissions),
    Guild(Permissions),
    OwnerOnly,
}

impl PermissionEvaluator {
    pub fn scoped(scope: PermissionScope, permissions: Permissions) -> Self {
        match scope {
            PermissionScope::Channel => PermissionEvaluator::Channel(permissions),
            PermissionScope::Guild => PermissionEvaluator::Guild(permissions),
        }
    }

    pub fn administrator() -> Self {
        PermissionEvaluator::Guild(Permissions::ADMINISTRATOR)
    }

    /// Check the evaluator against the acting member of `ctx`.
    ///
    /// Scoped evaluators fail when the context carries no member.
    pub fn is_covered(&self, ctx: &CommandContext) -> bool {
        match self {
            PermissionEvaluator::Channel(required) => ctx
                .member()
                .is_some_and(|member| member.channel.covers(*required)),
            PermissionEvaluator::Guild(required) => ctx
                .member()
                .is_some_and(|member| member.guild.covers(*required)),
            PermissionEvaluator::OwnerOnly => ctx.app_state().is_owner(ctx.user_id()),
        }
    }
}

/// AND over `evaluators`, stopping at the first failure
pub fn evaluate_all(evaluators: &[PermissionEvaluator], ctx: &CommandContext) -> bool {
    first_uncovered(evaluators, ctx).is_none()
}

/// The first evaluator `ctx` does not satisfy, if any
pub fn first_uncovered<'a>(
    evaluators: &'a [PermissionEvaluator],
    ctx: &CommandContext,
) -> Option<&'a PermissionEvaluator> {
    evaluators.iter().find(|evaluator| !evaluator.is_covered(ctx))
}
