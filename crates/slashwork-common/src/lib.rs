//! Shared utilities for slashwork crates
//!
//! Holds the ambient pieces every other crate leans on: tracing setup,
//! error chain formatting, and the settings loader that feeds dispatcher
//! configuration (owners, message prefix, slash-command toggle).

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{CommonError, Result};
pub use logging::{format_error, init as init_logging, LogLevel, LogOptions};
pub use settings::{Settings, SettingsLoader};
