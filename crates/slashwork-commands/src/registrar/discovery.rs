//! Link-time registration of declarative commands
//!
//! Any crate linked into the binary can add a command to the table:
//!
//! ```rust,ignore
//! use slashwork_commands::registrar::{DeclarativeCommand, DeclarativeEntry};
//!
//! inventory::submit! {
//!     DeclarativeEntry::new("ping", Ping::descriptor)
//! }
//! ```

use tracing::{debug, info};

use super::descriptor::CommandDescriptor;
use crate::error::Result;
use crate::model::CommandDefinition;

/// One statically submitted declarative command
pub struct DeclarativeEntry {
    /// Label used in logs; usually the command name
    pub name: &'static str,
    pub describe: fn() -> CommandDescriptor,
}

impl DeclarativeEntry {
    pub const fn new(name: &'static str, describe: fn() -> CommandDescriptor) -> Self {
        Self { name, describe }
    }
}

inventory::collect!(DeclarativeEntry);

/// Every submitted entry, ordered by name
pub fn discovered() -> Vec<&'static DeclarativeEntry> {
    let mut entries: Vec<&'static DeclarativeEntry> =
        inventory::iter::<DeclarativeEntry>().collect();
    entries.sort_by_key(|entry| entry.name);
    entries
}

pub fn discovered_count() -> usize {
    inventory::iter::<DeclarativeEntry>().count()
}

/// Resolve every submitted entry; the first invalid one aborts the scan
pub fn resolve_discovered() -> Result<Vec<CommandDefinition>> {
    let entries = discovered();
    info!("Discovered {} declarative commands", entries.len());

    let mut definitions = Vec::with_capacity(entries.len());
    for entry in entries {
        debug!("Resolving declarative command '{}'", entry.name);
        definitions.push(super::resolve(&(entry.describe)())?);
    }
    Ok(definitions)
}
