//! Grouping levels command implementation.

use crate::cli::LevelsArgs;
use crate::cli::commands::{CommandContext, print_json};
use crate::config::CliOverrides;
use crate::error::Result;
use crate::features::FeatureSet;
use crate::grouping::{check_feature, levels_overview, list_group_levels};
use crate::model::{LevelsOverview, LevelsResponse};

/// Execute the levels command.
///
/// # Errors
///
/// Returns `MissingFeature`, `MergedIssues`, `NotHierarchical` (and, with
/// `--overview`, `NoEvents`) or a storage error.
pub fn execute(args: &LevelsArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let ctx = CommandContext::open(cli)?;
    let group = ctx.storage.require_group(args.group_id)?;
    let features = FeatureSet::from_config(&ctx.config, &ctx.storage);
    let actor = Some(ctx.actor.as_str());

    if args.overview {
        check_feature(&features, group.organization_id, actor)?;
        let overview = levels_overview(&group, &ctx.storage, &ctx.storage)?;
        if json {
            return print_json(&overview);
        }
        print_overview(&overview);
        return Ok(());
    }

    let response = list_group_levels(&group, &features, actor, &ctx.storage, &ctx.storage)?;
    if json {
        return print_json(&response);
    }
    print_levels(group.id, &response);
    Ok(())
}

fn print_overview(overview: &LevelsOverview) {
    println!(
        "Current level: {} of {}",
        overview.current_level, overview.num_levels
    );
    println!("Current hash:  {}", overview.current_hash);
    println!("Primary hash:  {}", overview.only_primary_hash);
    if !overview.parent_hashes.is_empty() {
        println!("Parent hashes:");
        for hash in &overview.parent_hashes {
            println!("  {hash}");
        }
    }
}

fn print_levels(group_id: i64, response: &LevelsResponse) {
    if response.levels.is_empty() {
        println!("Group {group_id} has no events.");
        return;
    }
    for level in &response.levels {
        if level.is_current == Some(true) {
            println!("level {} (current)", level.id);
        } else {
            println!("level {}", level.id);
        }
    }
}
