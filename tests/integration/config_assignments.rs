//! Configuration-driven context assignments feeding the resolver

use anyhow::Result;
use canopy::catalog::{CandidateType, TypeCatalog};
use canopy::config::{CanopyConfig, WORKSPACE_CONFIG_FILE};
use canopy::error::ConfigError;
use canopy::registry::Registry;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

// Serialize HOME mutation across tests in this binary
static HOME_MUTEX: Mutex<()> = Mutex::new(());

fn with_isolated_home<T>(run: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let _guard = HOME_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original_home = std::env::var("HOME").ok();

    let temp_dir = TempDir::new()?;
    let home = temp_dir.path().join("home");
    std::fs::create_dir_all(&home)?;
    std::env::set_var("HOME", &home);

    let result = run(temp_dir.path());

    if let Some(home) = original_home {
        std::env::set_var("HOME", home);
    } else {
        std::env::remove_var("HOME");
    }
    result
}

fn workspace_with_config(root: &Path, contents: &str) -> Result<PathBuf> {
    let workspace = root.join("workspace");
    std::fs::create_dir_all(&workspace)?;
    std::fs::write(workspace.join(WORKSPACE_CONFIG_FILE), contents)?;
    Ok(workspace)
}

fn global_config(root: &Path, contents: &str) -> Result<()> {
    let global_dir = root.join("home").join(".config").join("canopy");
    std::fs::create_dir_all(&global_dir)?;
    std::fs::write(global_dir.join("config.toml"), contents)?;
    Ok(())
}

/// Test that a workspace assignment classifies an unmarked type and adds
/// its contexts
#[test]
fn test_assignments_drive_classification_and_contexts() -> Result<()> {
    with_isolated_home(|root| {
        let workspace = workspace_with_config(
            root,
            r#"
[assignments]
Widget = ["Default", "Embedded"]
"#,
        )?;
        let config = CanopyConfig::load(&workspace)?;

        let catalog: TypeCatalog = vec![
            CandidateType::class("Widget"),
            CandidateType::class("Bystander"),
        ]
        .into_iter()
        .collect();
        let mut registry = Registry::new(catalog).with_dispatcher(config.dispatcher());
        registry.register()?;
        let resolution = registry.resolve();

        assert!(!resolution.report.has_fatal_error());
        let embedded = resolution.map.find_context("Embedded").unwrap();
        assert_eq!(embedded.to_leaf("Widget"), Some("Widget"));
        // Unassigned, unmarked types stay out entirely
        assert!(!resolution.map.default_context().is_mapped("Bystander"));
        Ok(())
    })
}

/// Test that an assignment survives the type's own removal directive
#[test]
fn test_assignment_wins_over_declared_removal() -> Result<()> {
    use canopy::catalog::ContextDirective;

    with_isolated_home(|root| {
        let workspace = workspace_with_config(
            root,
            r#"
[assignments]
Widget = ["Default"]
"#,
        )?;
        let config = CanopyConfig::load(&workspace)?;

        let catalog: TypeCatalog = vec![CandidateType::class("Widget")
            .with_directive(ContextDirective::Remove("Default".to_string()))]
        .into_iter()
        .collect();
        let mut registry = Registry::new(catalog).with_dispatcher(config.dispatcher());
        registry.register()?;
        let resolution = registry.resolve();

        assert_eq!(
            resolution.map.default_context().to_leaf("Widget"),
            Some("Widget")
        );
        Ok(())
    })
}

/// Test that two sources assigning different contexts to one type fail the
/// load before any registration happens
#[test]
fn test_conflicting_sources_are_a_malformed_directive() -> Result<()> {
    with_isolated_home(|root| {
        global_config(root, "[assignments]\nWidget = [\"Embedded\"]\n")?;
        let workspace = workspace_with_config(root, "[assignments]\nWidget = [\"Print\"]\n")?;

        let err = CanopyConfig::load(&workspace).unwrap_err();
        let rendered = err.to_string();
        assert!(matches!(err, ConfigError::ConflictingAssignment { .. }));
        assert!(rendered.contains("Widget"));
        assert!(rendered.contains("Embedded"));
        assert!(rendered.contains("Print"));
        Ok(())
    })
}

/// Test that agreeing sources merge without complaint
#[test]
fn test_agreeing_sources_merge() -> Result<()> {
    with_isolated_home(|root| {
        global_config(root, "[assignments]\nWidget = [\"Embedded\"]\n")?;
        let workspace = workspace_with_config(
            root,
            "[assignments]\nWidget = [\"Embedded\"]\nGadget = [\"Default\"]\n",
        )?;

        let config = CanopyConfig::load(&workspace)?;
        assert_eq!(config.assignments.len(), 2);
        Ok(())
    })
}

/// Test that logging settings layer with the workspace file winning
#[test]
fn test_logging_settings_layer() -> Result<()> {
    with_isolated_home(|root| {
        global_config(root, "[logging]\nlevel = \"warn\"\nformat = \"json\"\n")?;
        let workspace = workspace_with_config(root, "[logging]\nlevel = \"debug\"\n")?;

        let config = CanopyConfig::load(&workspace)?;
        assert_eq!(config.logging.level, "debug");
        // Untouched keys keep the global value
        assert_eq!(config.logging.format, "json");
        Ok(())
    })
}
