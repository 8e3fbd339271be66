//! Configuration loading.
//!
//! Two layered sources: a global file at `~/.config/canopy/config.toml` and
//! a workspace file at `<workspace>/canopy.toml`, workspace winning for
//! overridable settings. Explicit context assignments are the exception:
//! two sources disagreeing about one type's contexts is a malformed
//! directive and fails the load, rather than one source silently winning.

use crate::dispatch::AssignmentDispatcher;
use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::types::ContextId;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the per-workspace configuration file.
pub const WORKSPACE_CONFIG_FILE: &str = "canopy.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanopyConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Explicit context assignments: type name to context list.
    #[serde(default)]
    pub assignments: BTreeMap<String, Vec<String>>,
}

impl CanopyConfig {
    /// Load configuration for a workspace, global file first, workspace
    /// file second.
    pub fn load(workspace_root: &Path) -> Result<Self, ConfigError> {
        // Step 1: Layered load for overridable sections
        let mut builder = builder_with_defaults()?;
        builder = add_global_source(builder);
        builder = add_workspace_source(builder, workspace_root);
        let mut config: CanopyConfig = builder.build()?.try_deserialize()?;

        // Step 2: Assignments are re-read per source and merged with
        // conflict detection instead of override layering
        config.assignments = merge_assignments(workspace_root)?;
        debug!(
            assignments = config.assignments.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load a single configuration file, no layering.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Dispatcher over the configured assignments, context names
    /// normalized.
    pub fn dispatcher(&self) -> AssignmentDispatcher {
        let assignments = self
            .assignments
            .iter()
            .map(|(type_name, contexts)| {
                let contexts: Vec<ContextId> =
                    contexts.iter().map(ContextId::named).collect();
                (type_name.clone(), contexts)
            })
            .collect();
        AssignmentDispatcher::new(assignments)
    }
}

/// Path to the global config file, `~/.config/canopy/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("canopy")
            .join("config.toml")
    })
}

/// A starter workspace file with the defaults spelled out.
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&CanopyConfig::default()).unwrap_or_default()
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = Config::builder()
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.color", true)?;
    Ok(builder)
}

fn add_global_source(mut builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let canonical = global_path
                .canonicalize()
                .unwrap_or_else(|_| global_path.clone());
            builder = builder.add_source(File::from(canonical).required(false));
        } else {
            warn!(
                config_path = %global_path.display(),
                "Global configuration file not found. \
                 Consider creating it for user-level defaults."
            );
        }
    }
    builder
}

fn add_workspace_source(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    let workspace_path = workspace_root.join(WORKSPACE_CONFIG_FILE);
    if workspace_path.exists() {
        builder = builder.add_source(File::from(workspace_path).required(false));
    }
    builder
}

#[derive(Debug, Default, Deserialize)]
struct RawAssignments {
    #[serde(default)]
    assignments: BTreeMap<String, Vec<String>>,
}

/// Merge assignment tables across sources. Repeating an identical list is
/// allowed; assigning different lists to one type is fatal.
fn merge_assignments(
    workspace_root: &Path,
) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
    let mut sources: Vec<PathBuf> = Vec::new();
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            sources.push(global_path);
        }
    }
    let workspace_path = workspace_root.join(WORKSPACE_CONFIG_FILE);
    if workspace_path.exists() {
        sources.push(workspace_path);
    }

    let mut merged: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
    for source in sources {
        let raw = read_assignments(&source)?;
        let source_name = source.display().to_string();
        for (type_name, contexts) in raw.assignments {
            match merged.get(&type_name) {
                None => {
                    merged.insert(type_name, (source_name.clone(), contexts));
                }
                Some((first_source, first)) => {
                    let same: BTreeSet<&String> = first.iter().collect();
                    let incoming: BTreeSet<&String> = contexts.iter().collect();
                    if same != incoming {
                        return Err(ConfigError::ConflictingAssignment {
                            type_name,
                            first_source: first_source.clone(),
                            first: first.clone(),
                            second_source: source_name.clone(),
                            second: contexts,
                        });
                    }
                }
            }
        }
    }

    Ok(merged
        .into_iter()
        .map(|(type_name, (_, contexts))| (type_name, contexts))
        .collect())
}

fn read_assignments(path: &Path) -> Result<RawAssignments, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
    })?;
    toml::from_str(&text).map_err(|e| {
        ConfigError::Invalid(format!("Failed to parse {}: {}", path.display(), e))
    })
}
