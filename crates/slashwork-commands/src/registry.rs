//! Name-keyed store of command definitions

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::error::{CommandError, LookupKind, Result};
use crate::manifest::{CommandManifest, HandlerTable, ManifestLoader};
use crate::model::{CommandDefinition, CommandNode, NodeHolder};
use crate::registrar::{self, CommandDescriptor, DeclarativeCommand};

/// Registry of top-level commands.
///
/// Safe to share between dispatching tasks; a re-registration replaces the
/// previous definition (last write wins).
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: DashMap<String, Arc<CommandDefinition>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, definition: CommandDefinition) -> &Self {
        self.register_arc(Arc::new(definition))
    }

    pub fn register_arc(&self, definition: Arc<CommandDefinition>) -> &Self {
        let name = definition.name().to_string();
        if self.commands.insert(name.clone(), definition).is_some() {
            warn!("Command '{}' was registered again; replacing it", name);
        }
        debug!("Registered command '{}' ({} commands)", name, self.commands.len());
        self
    }

    pub fn register_all(&self, definitions: impl IntoIterator<Item = CommandDefinition>) -> &Self {
        for definition in definitions {
            self.register(definition);
        }
        self
    }

    /// Resolve and register the declarative command `T`
    pub fn register_declarative<T: DeclarativeCommand>(&self) -> Result<&Self> {
        Ok(self.register(registrar::resolve_type::<T>()?))
    }

    /// Resolve every descriptor first, then register them all
    pub fn register_descriptors<'a>(
        &self,
        descriptors: impl IntoIterator<Item = &'a CommandDescriptor>,
    ) -> Result<&Self> {
        let definitions = descriptors
            .into_iter()
            .map(registrar::resolve)
            .collect::<Result<Vec<_>>>()?;
        Ok(self.register_all(definitions))
    }

    /// Register everything submitted to the static declarative table
    pub fn register_discovered(&self) -> Result<usize> {
        let definitions = registrar::resolve_discovered()?;
        let count = definitions.len();
        self.register_all(definitions);
        Ok(count)
    }

    pub fn register_manifests(
        &self,
        manifests: &[CommandManifest],
        handlers: &HandlerTable,
    ) -> Result<&Self> {
        let definitions = manifests
            .iter()
            .map(|manifest| manifest.bind(handlers))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.register_all(definitions))
    }

    /// Load a YAML or JSON manifest file and register its commands
    pub fn load_manifest_file<P: AsRef<Path>>(
        &self,
        path: P,
        handlers: &HandlerTable,
    ) -> Result<usize> {
        let manifests = ManifestLoader::load_from_file(path.as_ref())?;
        self.register_manifests(&manifests, handlers)?;
        info!(
            "Loaded {} commands from {}",
            manifests.len(),
            path.as_ref().display()
        );
        Ok(manifests.len())
    }

    pub fn unregister(&self, name: &str) -> &Self {
        if self.commands.remove(name).is_some() {
            debug!("Unregistered command '{}'", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.commands.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up `name` and resolve the node an invocation targets
    pub fn resolve(
        &self,
        name: &str,
        group: Option<&str>,
        subcommand: Option<&str>,
    ) -> Result<(Arc<CommandDefinition>, Arc<CommandNode>)> {
        let definition = self
            .get(name)
            .ok_or_else(|| CommandError::not_found(LookupKind::Command, name))?;
        let node = Arc::clone(definition.resolve(group, subcommand)?);
        Ok((definition, node))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Snapshot of every definition, ordered by name
    pub fn list(&self) -> Vec<Arc<CommandDefinition>> {
        let mut commands: Vec<Arc<CommandDefinition>> = self
            .commands
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&self) {
        self.commands.clear();
    }

    /// Serializable view of every command, for publishing
    pub fn manifest(&self) -> Vec<CommandManifest> {
        self.list()
            .iter()
            .map(|definition| CommandManifest::from(definition.as_ref()))
            .collect()
    }

    /// Reset the cooldown state of every node
    pub fn clear_cooldowns(&self) {
        for entry in self.commands.iter() {
            entry.value().clear_cooldowns();
        }
    }
}
