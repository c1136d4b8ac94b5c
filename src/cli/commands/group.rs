//! Group command implementation.

use crate::cli::commands::{CommandContext, print_json};
use crate::cli::{GroupCommands, GroupCreateArgs, GroupHashArgs, GroupShowArgs};
use crate::config::CliOverrides;
use crate::error::Result;
use crate::grouping::GroupHashStore;
use crate::model::{Group, GroupResolution};
use crate::resolution::ResolutionStore;
use crate::util::time::parse_timestamp;
use crate::util::validate_hash;
use serde::Serialize;

#[derive(Serialize)]
struct GroupShowOutput<'a> {
    group: &'a Group,
    resolution: Option<&'a GroupResolution>,
    hashes: &'a [String],
    event_count: usize,
}

#[derive(Serialize)]
struct GroupHashOutput {
    group_id: i64,
    action: &'static str,
    changed: Vec<String>,
    unchanged: Vec<String>,
}

/// Execute the group command.
///
/// # Errors
///
/// Returns an error if the group does not exist, inputs are invalid or
/// database operations fail.
pub fn execute(command: &GroupCommands, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(cli)?;

    match command {
        GroupCommands::Create(args) => group_create(args, &mut ctx, json),
        GroupCommands::Show(args) => group_show(args, &ctx, json),
        GroupCommands::Hash(args) => group_hash(args, &mut ctx, json),
    }
}

fn group_create(args: &GroupCreateArgs, ctx: &mut CommandContext, json: bool) -> Result<()> {
    let first_seen = parse_timestamp(&args.first_seen, "first-seen")?;
    let group = ctx.storage.create_group(
        ctx.organization_id,
        ctx.project_id,
        &args.title,
        first_seen,
    )?;

    if json {
        return print_json(&group);
    }
    println!("Created group {}: {}", group.id, group.title);
    Ok(())
}

fn group_show(args: &GroupShowArgs, ctx: &CommandContext, json: bool) -> Result<()> {
    let group = ctx.storage.require_group(args.id)?;
    let resolution = ctx.storage.get_resolution(group.id)?;
    let mut hashes: Vec<String> = ctx.storage.materialized_hashes(&group)?.into_iter().collect();
    hashes.sort();
    let event_count = ctx.storage.count_events(&group)?;

    if json {
        return print_json(&GroupShowOutput {
            group: &group,
            resolution: resolution.as_ref(),
            hashes: &hashes,
            event_count,
        });
    }

    println!("Group {}: {}", group.id, group.title);
    println!(
        "  organization {} / project {}",
        group.organization_id, group.project_id
    );
    println!("  first seen: {}", group.first_seen.to_rfc3339());
    println!("  events: {event_count}");
    match &resolution {
        Some(res) => {
            let kind = res.resolution_type.map_or("unset", |kind| kind.as_str());
            println!(
                "  resolution: {kind} (release {}, {})",
                res.release_id, res.status
            );
            if let Some(version) = &res.current_release_version {
                println!("  version snapshot: {version}");
            }
        }
        None => println!("  resolution: none"),
    }
    if hashes.is_empty() {
        println!("  hashes: none");
    } else {
        println!("  hashes:");
        for hash in &hashes {
            println!("    {hash}");
        }
    }
    Ok(())
}

fn group_hash(args: &GroupHashArgs, ctx: &mut CommandContext, json: bool) -> Result<()> {
    let group = ctx.storage.require_group(args.id)?;
    let hashes = args
        .hashes
        .iter()
        .map(|hash| validate_hash("hash", hash))
        .collect::<Result<Vec<_>>>()?;

    let mut changed = Vec::new();
    let mut unchanged = Vec::new();
    for hash in hashes {
        let did_change = if args.remove {
            ctx.storage.remove_group_hash(&group, &hash)?
        } else {
            ctx.storage.add_group_hash(&group, &hash)?
        };
        if did_change {
            changed.push(hash);
        } else {
            unchanged.push(hash);
        }
    }

    let action = if args.remove { "removed" } else { "added" };
    if json {
        return print_json(&GroupHashOutput {
            group_id: group.id,
            action,
            changed,
            unchanged,
        });
    }

    for hash in &changed {
        println!("{action} {hash}");
    }
    for hash in &unchanged {
        println!("unchanged {hash}");
    }
    Ok(())
}
