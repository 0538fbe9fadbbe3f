//! Serializable view of command trees
//!
//! A manifest carries everything a definition holds except the executors.
//! Manifests are what a transport publishes, and they can be written to and
//! read back from YAML or JSON files. Loading a manifest needs a
//! [`HandlerTable`] that maps handler keys to executors.

use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arguments::ArgumentDescriptor;
use crate::builder::{CommandBuilder, GroupBuilder, NodeBuilder};
use crate::context::CommandContext;
use crate::cooldown::CooldownScope;
use crate::error::{CommandError, Result};
use crate::model::{CommandDefinition, CommandNode, ContextScope, DefaultPermissions, NodeHolder};
use crate::permission::PermissionEvaluator;
use crate::scheduler::{self, Executor};

fn default_true() -> bool {
    true
}

fn default_contexts() -> Vec<ContextScope> {
    ContextScope::ALL.to_vec()
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownManifest {
    pub scope: CooldownScope,
    pub duration_ms: u64,
}

/// One node without its executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeManifest {
    pub name: String,
    pub description: String,
    /// Key into the [`HandlerTable`]; the qualified node name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionEvaluator>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub async_execution: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub send_typing: bool,
    #[serde(default = "default_true")]
    pub acknowledge: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ephemeral: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<CooldownManifest>,
}

impl NodeManifest {
    fn builder(&self, key: &str, handlers: &HandlerTable) -> Result<NodeBuilder> {
        let key = self.handler.as_deref().unwrap_or(key);
        let executor = handlers.get(key).cloned().ok_or_else(|| {
            CommandError::configuration(format!("No handler bound for '{}'", key))
        })?;

        let mut node = NodeBuilder::new(&self.name, &self.description)
            .arguments(self.arguments.iter().cloned())
            .permissions(self.permissions.iter().copied())
            .async_execution(self.async_execution)
            .send_typing(self.send_typing)
            .acknowledge(self.acknowledge)
            .ephemeral(self.ephemeral)
            .executor(executor);
        if let Some(cooldown) = self.cooldown {
            if cooldown.scope != CooldownScope::None {
                node = node.cooldown(cooldown.scope, Duration::from_millis(cooldown.duration_ms));
            }
        }
        Ok(node)
    }
}

impl From<&CommandNode> for NodeManifest {
    fn from(node: &CommandNode) -> Self {
        let cooldown = node.cooldown();
        NodeManifest {
            name: node.name().to_string(),
            description: node.description().to_string(),
            handler: None,
            arguments: node.arguments().to_vec(),
            permissions: node.permissions().to_vec(),
            async_execution: node.is_async(),
            send_typing: node.sends_typing(),
            acknowledge: node.acknowledges(),
            ephemeral: node.is_ephemeral(),
            cooldown: (!cooldown.is_none()).then(|| CooldownManifest {
                scope: cooldown.scope(),
                duration_ms: u64::try_from(cooldown.duration().as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupManifest {
    pub name: String,
    pub description: String,
    pub subcommands: Vec<NodeManifest>,
}

/// Function-free description of a whole command tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandManifest {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nsfw: bool,
    #[serde(default = "default_contexts")]
    pub contexts: Vec<ContextScope>,
    #[serde(default)]
    pub default_permissions: DefaultPermissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<NodeManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupManifest>,
}

impl CommandManifest {
    /// Rebuild the definition, looking up every node's executor in `handlers`
    pub fn bind(&self, handlers: &HandlerTable) -> Result<CommandDefinition> {
        let mut builder = CommandBuilder::new(&self.name, &self.description)
            .nsfw(self.nsfw)
            .context(self.contexts.iter().copied())
            .default_permissions(self.default_permissions);

        if let Some(root) = &self.root {
            builder = builder.root(root.builder(&self.name, handlers)?);
        }
        for sub in &self.subcommands {
            let key = format!("{} {}", self.name, sub.name);
            builder = builder.subcommand(sub.builder(&key, handlers)?);
        }
        for group in &self.groups {
            let mut target = GroupBuilder::new(&group.name, &group.description);
            for sub in &group.subcommands {
                let key = format!("{} {} {}", self.name, group.name, sub.name);
                target = target.subcommand(sub.builder(&key, handlers)?);
            }
            builder = builder.group(target);
        }

        builder.build()
    }
}

impl From<&CommandDefinition> for CommandManifest {
    fn from(definition: &CommandDefinition) -> Self {
        CommandManifest {
            name: definition.name().to_string(),
            description: definition.description().to_string(),
            nsfw: definition.is_nsfw(),
            contexts: definition.contexts().to_vec(),
            default_permissions: definition.default_permissions(),
            root: definition.root().ok().map(|root| NodeManifest::from(root.as_ref())),
            subcommands: definition
                .nodes()
                .values()
                .map(|node| NodeManifest::from(node.as_ref()))
                .collect(),
            groups: definition
                .groups()
                .map(|group| GroupManifest {
                    name: group.name().to_string(),
                    description: group.description().to_string(),
                    subcommands: group
                        .nodes()
                        .values()
                        .map(|node| NodeManifest::from(node.as_ref()))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Executors addressable by handler key
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Executor>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, executor: Executor) {
        self.handlers.insert(key.into(), executor);
    }

    pub fn with<F, Fut>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.insert(key, scheduler::executor(f));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Executor> {
        self.handlers.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// On-disk layout of a manifest file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub commands: Vec<CommandManifest>,
}

/// Reads and writes manifest files
pub struct ManifestLoader;

impl ManifestLoader {
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Vec<CommandManifest>> {
        let content = fs::read_to_string(path.as_ref())?;
        let file: ManifestFile = serde_yaml::from_str(&content)?;
        debug!(
            path = %path.as_ref().display(),
            commands = file.commands.len(),
            "Loaded YAML manifest"
        );
        Ok(file.commands)
    }

    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<CommandManifest>> {
        let content = fs::read_to_string(path.as_ref())?;
        let file: ManifestFile = serde_json::from_str(&content)?;
        debug!(
            path = %path.as_ref().display(),
            commands = file.commands.len(),
            "Loaded JSON manifest"
        );
        Ok(file.commands)
    }

    /// Pick the format from the file extension
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<CommandManifest>> {
        let path = path.as_ref();
        match extension(path) {
            "yaml" | "yml" => Self::load_from_yaml(path),
            "json" => Self::load_from_json(path),
            _ => Err(unsupported(path)),
        }
    }

    pub fn save_to_yaml<P: AsRef<Path>>(commands: &[CommandManifest], path: P) -> Result<()> {
        let file = ManifestFile {
            commands: commands.to_vec(),
        };
        fs::write(path, serde_yaml::to_string(&file)?)?;
        Ok(())
    }

    pub fn save_to_json<P: AsRef<Path>>(commands: &[CommandManifest], path: P) -> Result<()> {
        let file = ManifestFile {
            commands: commands.to_vec(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(commands: &[CommandManifest], path: P) -> Result<()> {
        let path = path.as_ref();
        match extension(path) {
            "yaml" | "yml" => Self::save_to_yaml(commands, path),
            "json" => Self::save_to_json(commands, path),
            _ => Err(unsupported(path)),
        }
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

fn unsupported(path: &Path) -> CommandError {
    CommandError::configuration(format!(
        "Unsupported manifest format for '{}'. Use .yaml, .yml, or .json",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permissions;
    use tempfile::TempDir;

    fn noop() -> Executor {
        scheduler::executor(|_ctx| async { Ok(()) })
    }

    fn sample() -> CommandDefinition {
        CommandBuilder::new("parent", "Parent command")
            .context([ContextScope::Guild])
            .root(
                NodeBuilder::new("parent", "Parent command")
                    .argument(ArgumentDescriptor::text("input", "Text").with_required(true).with_max_length(100))
                    .cooldown(CooldownScope::User, Duration::from_secs(5))
                    .executor(noop()),
            )
            .subcommand(
                NodeBuilder::new("direct", "Direct")
                    .permission(PermissionEvaluator::Guild(Permissions::MANAGE_GUILD))
                    .executor(noop()),
            )
            .group(
                GroupBuilder::new("group1", "Group")
                    .subcommand(NodeBuilder::new("sub2", "Second").async_execution(true).executor(noop())),
            )
            .build()
            .unwrap()
    }

    fn table() -> HandlerTable {
        HandlerTable::new()
            .with("parent", |_ctx| async { Ok(()) })
            .with("parent direct", |_ctx| async { Ok(()) })
            .with("parent group1 sub2", |_ctx| async { Ok(()) })
    }

    #[test]
    fn test_manifest_mirrors_definition() {
        let manifest = CommandManifest::from(&sample());

        assert_eq!(manifest.name, "parent");
        assert_eq!(manifest.contexts, vec![ContextScope::Guild]);
        let root = manifest.root.as_ref().unwrap();
        assert_eq!(root.arguments.len(), 1);
        assert_eq!(
            root.cooldown,
            Some(CooldownManifest {
                scope: CooldownScope::User,
                duration_ms: 5000
            })
        );
        assert_eq!(manifest.subcommands[0].permissions.len(), 1);
        assert!(manifest.groups[0].subcommands[0].async_execution);
    }

    #[test]
    fn test_bind_uses_qualified_names_as_default_keys() {
        let manifest = CommandManifest::from(&sample());
        let def = manifest.bind(&table()).unwrap();

        let sub2 = def.resolve(Some("group1"), Some("sub2")).unwrap();
        assert!(sub2.is_async());
        assert_eq!(def.root().unwrap().cooldown().duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_bind_reports_missing_handler() {
        let manifest = CommandManifest::from(&sample());
        let partial = HandlerTable::new().with("parent", |_ctx| async { Ok(()) });

        let err = manifest.bind(&partial).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("parent direct"));
    }

    #[test]
    fn test_bind_rejects_unbounded_cooldown() {
        let mut manifest = CommandManifest::from(&sample());
        if let Some(root) = manifest.root.as_mut() {
            root.cooldown = Some(CooldownManifest {
                scope: CooldownScope::User,
                duration_ms: u64::MAX,
            });
        }

        let err = manifest.bind(&table()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Cooldown"));
    }

    #[test]
    fn test_explicit_handler_key_wins() {
        let yaml = r#"
commands:
  - name: ping
    description: Replies with pong
    root:
      name: ping
      description: Replies with pong
      handler: pong
"#;
        let file: ManifestFile = serde_yaml::from_str(yaml).unwrap();
        let manifest = &file.commands[0];
        assert_eq!(manifest.contexts, ContextScope::ALL.to_vec());
        assert!(manifest.root.as_ref().unwrap().acknowledge);

        let handlers = HandlerTable::new().with("pong", |_ctx| async { Ok(()) });
        assert!(manifest.bind(&handlers).is_ok());
    }

    #[test]
    fn test_save_and_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commands.yaml");
        let manifests = vec![CommandManifest::from(&sample())];

        ManifestLoader::save_to_file(&manifests, &path).unwrap();
        let loaded = ManifestLoader::load_from_file(&path).unwrap();
        assert_eq!(loaded, manifests);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commands.json");
        let manifests = vec![CommandManifest::from(&sample())];

        ManifestLoader::save_to_file(&manifests, &path).unwrap();
        let loaded = ManifestLoader::load_from_json(&path).unwrap();
        assert_eq!(loaded[0].name, "parent");
        assert!(loaded[0].bind(&table()).is_ok());
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commands.txt");

        assert!(ManifestLoader::save_to_file(&[], &path).unwrap_err().is_configuration());
        assert!(ManifestLoader::load_from_file(&path).is_err());
    }
}
