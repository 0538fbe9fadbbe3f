use thiserror::Error;

/// Errors raised while loading settings or configuring logging
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid settings: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CommonError>;
