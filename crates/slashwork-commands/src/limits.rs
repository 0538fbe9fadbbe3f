//! Platform-defined limits checked when definitions are built

use std::time::Duration;

use crate::error::{CommandError, Result};

/// Maximum length of a command, group, sub-command, or argument name
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum length of any description
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Maximum number of choices on a single argument
pub const MAX_CHOICES: usize = 25;

/// Maximum number of arguments on one node
pub const MAX_OPTIONS: usize = 25;

/// Maximum number of sub-commands plus groups under one holder
pub const MAX_SUBCOMMANDS: usize = 25;

/// Upper bound for text length constraints
pub const MAX_TEXT_LENGTH: u16 = 6000;

/// Longest cooldown window a node may declare
pub const MAX_COOLDOWN: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Maximum length of a choice label
pub const MAX_CHOICE_LABEL_LENGTH: usize = 100;

pub(crate) fn check_name(what: &str, name: &str) -> Result<()> {
    let length = name.chars().count();
    if length == 0 {
        return Err(CommandError::configuration(format!(
            "{} name may not be empty",
            what
        )));
    }
    if length > MAX_NAME_LENGTH {
        return Err(CommandError::configuration(format!(
            "{} name '{}' is {} characters long, the maximum is {}",
            what, name, length, MAX_NAME_LENGTH
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(CommandError::configuration(format!(
            "{} name '{}' may not contain whitespace",
            what, name
        )));
    }
    Ok(())
}

pub(crate) fn check_description(what: &str, name: &str, description: &str) -> Result<()> {
    let length = description.chars().count();
    if length == 0 {
        return Err(CommandError::configuration(format!(
            "{} '{}' needs a description",
            what, name
        )));
    }
    if length > MAX_DESCRIPTION_LENGTH {
        return Err(CommandError::configuration(format!(
            "Description of {} '{}' is {} characters long, the maximum is {}",
            what.to_lowercase(),
            name,
            length,
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

pub(crate) fn check_cooldown(what: &str, name: &str, duration: Duration) -> Result<()> {
    if duration > MAX_COOLDOWN {
        return Err(CommandError::configuration(format!(
            "Cooldown of {} '{}' is {:?}, the maximum is {:?}",
            what.to_lowercase(),
            name,
            duration,
            MAX_COOLDOWN
        )));
    }
    Ok(())
}
