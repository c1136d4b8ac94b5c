//! Feature flag command implementation.

use crate::cli::commands::{CommandContext, print_json};
use crate::cli::{FeatureCommands, FeatureScopeArgs};
use crate::config::{CliOverrides, enabled_features_from_layer};
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct FeatureEntry {
    feature: String,
    /// `None` means every organization.
    organization_id: Option<i64>,
    source: &'static str,
}

#[derive(Serialize)]
struct FeatureChange<'a> {
    feature: &'a str,
    organization_id: Option<i64>,
    enabled: bool,
    changed: bool,
}

/// Execute the feature command.
///
/// # Errors
///
/// Returns an error if database operations fail.
pub fn execute(command: &FeatureCommands, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(cli)?;

    match command {
        FeatureCommands::Enable(args) => set_feature(args, &mut ctx, true, json),
        FeatureCommands::Disable(args) => set_feature(args, &mut ctx, false, json),
        FeatureCommands::List => list_features(&ctx, json),
    }
}

fn set_feature(
    args: &FeatureScopeArgs,
    ctx: &mut CommandContext,
    enable: bool,
    json: bool,
) -> Result<()> {
    let organization_id = (!args.all).then_some(ctx.organization_id);
    let changed = if enable {
        ctx.storage.enable_feature(&args.feature, organization_id)?
    } else {
        ctx.storage.disable_feature(&args.feature, organization_id)?
    };

    if json {
        return print_json(&FeatureChange {
            feature: &args.feature,
            organization_id,
            enabled: enable,
            changed,
        });
    }

    let scope = organization_id.map_or_else(
        || "all organizations".to_string(),
        |id| format!("organization {id}"),
    );
    let verb = if enable { "Enabled" } else { "Disabled" };
    if changed {
        println!("{verb} {} for {scope}", args.feature);
    } else {
        println!("{} was already {} for {scope}", args.feature, verb.to_lowercase());
    }
    Ok(())
}

fn list_features(ctx: &CommandContext, json: bool) -> Result<()> {
    let mut entries: Vec<FeatureEntry> = enabled_features_from_layer(&ctx.config)
        .into_iter()
        .map(|feature| FeatureEntry {
            feature,
            organization_id: None,
            source: "config",
        })
        .collect();
    entries.extend(
        ctx.storage
            .list_features()?
            .into_iter()
            .map(|(feature, organization_id)| FeatureEntry {
                feature,
                organization_id,
                source: "database",
            }),
    );

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No features enabled.");
        return Ok(());
    }
    for entry in &entries {
        let scope = entry
            .organization_id
            .map_or_else(|| "*".to_string(), |id| id.to_string());
        println!("{:<40} org={scope:<6} ({})", entry.feature, entry.source);
    }
    Ok(())
}
