//! Config command implementation.
//!
//! `get` and `list` show the merged configuration; `set` and `delete` only
//! touch the database layer, so startup keys must go in YAML or the
//! environment instead.

use crate::cli::ConfigCommands;
use crate::cli::commands::{CommandContext, print_json};
use crate::config::{self, CliOverrides, ConfigLayer, is_startup_key, semver_release_window_from_layer};
use crate::error::{Result, TriageError};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Serialize)]
struct ConfigListOutput<'a> {
    runtime: BTreeMap<&'a str, &'a str>,
    startup: BTreeMap<&'a str, &'a str>,
    computed: Computed<'a>,
}

#[derive(Serialize)]
struct Computed<'a> {
    organization_id: i64,
    project_id: i64,
    semver_release_window: usize,
    actor: &'a str,
}

/// Execute the config command.
///
/// # Errors
///
/// Returns an error if the key is unknown or not storable, or the database
/// update fails.
pub fn execute(command: &ConfigCommands, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(cli)?;

    match command {
        ConfigCommands::Get { key } => get_value(&ctx.config, key, json),
        ConfigCommands::Set { key, value } => set_value(&mut ctx, key, value, json),
        ConfigCommands::Delete { key } => delete_value(&mut ctx, key, json),
        ConfigCommands::List => list_values(&ctx, json),
    }
}

fn get_value(layer: &ConfigLayer, key: &str, json: bool) -> Result<()> {
    debug!(key, "Reading config key");
    let value = config::lookup(layer, key)
        .ok_or_else(|| TriageError::Config(format!("config key not found: {key}")))?;

    if json {
        return print_json(&json!({ "key": key, "value": value }));
    }
    println!("{value}");
    Ok(())
}

fn set_value(ctx: &mut CommandContext, key: &str, value: &str, json: bool) -> Result<()> {
    ensure_runtime_key(key)?;
    validate_value(key, value)?;
    ctx.storage.set_config(key, value)?;

    if json {
        return print_json(&json!({ "key": key, "value": value }));
    }
    println!("Set {key}={value}");
    Ok(())
}

fn delete_value(ctx: &mut CommandContext, key: &str, json: bool) -> Result<()> {
    ensure_runtime_key(key)?;
    let deleted = ctx.storage.delete_config(key)?;

    if json {
        return print_json(&json!({ "key": key, "deleted": deleted }));
    }
    if deleted {
        println!("Deleted config key: {key}");
    } else {
        println!("Config key not found: {key}");
    }
    Ok(())
}

fn list_values(ctx: &CommandContext, json: bool) -> Result<()> {
    let layer = &ctx.config;
    let runtime: BTreeMap<&str, &str> = layer
        .runtime
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let startup: BTreeMap<&str, &str> = layer
        .startup
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let computed = Computed {
        organization_id: ctx.organization_id,
        project_id: ctx.project_id,
        semver_release_window: semver_release_window_from_layer(layer),
        actor: &ctx.actor,
    };

    if json {
        return print_json(&ConfigListOutput {
            runtime,
            startup,
            computed,
        });
    }

    println!("Current configuration (merged):");
    println!();
    if !runtime.is_empty() {
        println!("Runtime settings:");
        for (key, value) in &runtime {
            println!("  {key}: {value}");
        }
        println!();
    }
    if !startup.is_empty() {
        println!("Startup settings:");
        for (key, value) in &startup {
            println!("  {key}: {value}");
        }
        println!();
    }
    println!("Computed values:");
    println!("  organization: {}", computed.organization_id);
    println!("  project: {}", computed.project_id);
    println!("  semver.release-window: {}", computed.semver_release_window);
    println!("  actor: {}", computed.actor);
    Ok(())
}

fn ensure_runtime_key(key: &str) -> Result<()> {
    if is_startup_key(key) {
        return Err(TriageError::validation(
            "key",
            format!("{key} is a startup key; set it in .triage/config.yaml or TRIAGE_* instead"),
        ));
    }
    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<()> {
    let numeric = matches!(
        key,
        "semver.release-window" | "default-organization" | "default-project"
    );
    if numeric && value.trim().parse::<u64>().is_err() {
        return Err(TriageError::validation(
            key,
            format!("'{value}' is not a non-negative integer"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_keys_cannot_be_stored() {
        assert!(ensure_runtime_key("db").is_err());
        assert!(ensure_runtime_key("features.enabled").is_err());
        assert!(ensure_runtime_key("semver.release-window").is_ok());
    }

    #[test]
    fn test_numeric_keys_are_validated() {
        assert!(validate_value("semver.release-window", "5").is_ok());
        assert!(validate_value("semver.release-window", "five").is_err());
        assert!(validate_value("default-project", "-1").is_err());
        assert!(validate_value("custom.key", "anything").is_ok());
    }
}
