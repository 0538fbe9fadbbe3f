//! Logging setup for slashwork hosts
//!
//! - Level parsing compatible with the `log_level` setting
//! - `RUST_LOG` takes precedence over the configured level
//! - Error cause-chain formatting for structured log fields

use std::fmt;
use std::str::FromStr;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::CommonError;

/// Minimum level emitted by the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(CommonError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Minimum log level when `RUST_LOG` is unset
    pub level: LogLevel,
    /// Emit ANSI colour codes
    pub ansi: bool,
    /// Include the event target (module path) in each line
    pub with_target: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            ansi: true,
            with_target: true,
        }
    }
}

impl LogOptions {
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }
}

/// Install the global tracing subscriber.
///
/// Returns `false` when a subscriber was already installed, which happens
/// routinely in test binaries that initialise logging from several tests.
pub fn init(options: &LogOptions) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.level.as_str()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(options.ansi)
        .with_target(options.with_target)
        .try_init()
        .is_ok();

    if installed {
        debug!(level = %options.level, "Logging initialised");
    }
    installed
}

/// Render an error with its full cause chain on a single line
pub fn format_error(error: &dyn std::error::Error) -> String {
    format_error_recursive(error, 0)
}

fn format_error_recursive(error: &dyn std::error::Error, depth: usize) -> String {
    const MAX_DEPTH: usize = 10;

    let base = error.to_string();
    if depth >= MAX_DEPTH {
        return base;
    }

    match error.source() {
        Some(source) => format!(
            "{} Caused by: {}",
            base,
            format_error_recursive(source, depth + 1)
        ),
        None => base,
    }
}
