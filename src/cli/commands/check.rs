//! Check command: is a group still resolved for a release?

use crate::cli::CheckArgs;
use crate::cli::commands::{CommandContext, print_json};
use crate::config::CliOverrides;
use crate::error::Result;
use crate::model::ResolutionType;
use crate::resolution::{ResolutionStore, has_resolution};
use serde::Serialize;

#[derive(Serialize)]
struct CheckOutput {
    group_id: i64,
    release: Option<String>,
    resolved: bool,
    resolution_type: Option<ResolutionType>,
    has_resolution: bool,
}

/// Execute the check command.
///
/// # Errors
///
/// Returns an error if the group or release does not exist, the stored
/// resolution is invalid or a lookup fails.
pub fn execute(args: &CheckArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let ctx = CommandContext::open(cli)?;
    let group = ctx.storage.require_group(args.group_id)?;
    let resolution = ctx.storage.get_resolution(group.id)?;
    let release = args
        .release
        .as_deref()
        .map(|reference| ctx.storage.resolve_release(group.organization_id, reference))
        .transpose()?;

    let covered = has_resolution(resolution.as_ref(), &group, release.as_ref(), &ctx.storage)?;

    if json {
        return print_json(&CheckOutput {
            group_id: group.id,
            release: release.map(|r| r.version),
            resolved: resolution.is_some(),
            resolution_type: resolution.and_then(|r| r.resolution_type),
            has_resolution: covered,
        });
    }

    let target = release
        .as_ref()
        .map_or_else(|| "an unknown release".to_string(), |r| r.version.clone());
    match (&resolution, covered) {
        (None, _) => println!("Group {} is not resolved", group.id),
        (Some(_), true) => println!("Group {} is still resolved in {target}", group.id),
        (Some(_), false) => println!(
            "Group {} is not resolved in {target}: regression",
            group.id
        ),
    }
    Ok(())
}
