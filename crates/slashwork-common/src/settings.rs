//! Dispatcher settings loaded from a file and environment overrides

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CommonError, Result};
use crate::logging::LogLevel;

/// Default environment variable prefix (`SLASHWORK_MESSAGE_PREFIX=!` and so on)
pub const DEFAULT_ENV_PREFIX: &str = "SLASHWORK";

/// Host-level settings consumed by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifiers allowed through owner-only commands
    pub owners: Vec<u64>,
    /// Minimum log level, parsed with [`LogLevel`]
    pub log_level: String,
    /// Whether slash interactions are routed into the dispatcher
    pub use_slash_commands: bool,
    /// Prefix that marks a plain message as a command; `None` disables prefix commands
    pub message_prefix: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owners: Vec::new(),
            log_level: LogLevel::Info.as_str().to_string(),
            use_slash_commands: true,
            message_prefix: None,
        }
    }
}

impl Settings {
    pub fn log_level(&self) -> Result<LogLevel> {
        self.log_level.parse()
    }

    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owners.contains(&user_id)
    }

    pub fn uses_prefix_commands(&self) -> bool {
        self.message_prefix.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        self.log_level()?;

        if let Some(prefix) = &self.message_prefix {
            if prefix.is_empty() {
                return Err(CommonError::Validation(
                    "Message prefix cannot be empty".to_string(),
                ));
            }
            if prefix.chars().any(char::is_whitespace) {
                return Err(CommonError::Validation(format!(
                    "Message prefix cannot contain whitespace: {:?}",
                    prefix
                )));
            }
        }

        if !self.use_slash_commands && self.message_prefix.is_none() {
            return Err(CommonError::Validation(
                "Both slash and prefix commands are disabled".to_string(),
            ));
        }

        Ok(())
    }
}

/// Loads [`Settings`] from an optional file plus environment overrides
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    path: PathBuf,
    env_prefix: String,
}

impl SettingsLoader {
    /// Loader reading `<config dir>/slashwork/settings.toml`
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slashwork")
            .join("settings.toml")
    }

    /// Build settings; a missing file falls back to defaults
    pub fn load(&self) -> Result<Settings> {
        let config = Config::builder()
            .add_source(File::from(self.path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("owners"),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        debug!(
            path = %self.path.display(),
            owners = settings.owners.len(),
            prefix = ?settings.message_prefix,
            "Loaded settings"
        );
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let content = toml::to_string(settings)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
