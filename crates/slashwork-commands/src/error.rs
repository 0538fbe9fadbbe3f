use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// What a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Command,
    Group,
    Subcommand,
    Root,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupKind::Command => "Command",
            LookupKind::Group => "Subcommand group",
            LookupKind::Subcommand => "Subcommand",
            LookupKind::Root => "Root handler",
        };
        f.write_str(label)
    }
}

/// Errors that can occur in the commands system
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid definition detected while building or registering
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: LookupKind, name: String },

    #[error("Invalid value for argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Missing permissions")]
    PermissionDenied,

    #[error("Command is on cooldown for another {remaining:?}")]
    CooldownActive { remaining: Duration },

    #[error("Interaction was already acknowledged")]
    AlreadyAcknowledged,

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CommandError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CommandError::Configuration(message.into())
    }

    pub fn not_found(kind: LookupKind, name: impl Into<String>) -> Self {
        CommandError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CommandError::Configuration(_))
    }

    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, CommandError::NotFound { .. })
    }
}

/// Failure raised by an executor, sync or async
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    #[error("Executor panicked: {0}")]
    Panicked(String),

    #[error("Background task was cancelled")]
    Cancelled,

    #[error("No async runtime available to schedule the executor")]
    NoRuntime,
}

impl ExecutionError {
    /// Wrap a callback error so it can travel the same route as executor failures
    pub fn from_command(error: CommandError) -> Self {
        ExecutionError::Failed(anyhow::Error::new(error))
    }
}

/// Failure reported by the reply collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Reply rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;
