//! Release command implementation.

use crate::cli::commands::{CommandContext, print_json};
use crate::cli::{ReleaseAddArgs, ReleaseCommands};
use crate::config::CliOverrides;
use crate::error::Result;
use crate::model::Release;
use crate::resolution::ReleaseLookup;
use crate::storage::SqliteStorage;
use crate::util::time::parse_timestamp;
use serde::Serialize;

#[derive(Serialize)]
struct ReleaseAddOutput<'a> {
    release: &'a Release,
    resolutions_updated: usize,
}

#[derive(Serialize)]
struct ReleaseListOutput<'a> {
    follows_semver: bool,
    releases: &'a [Release],
}

/// Execute the release command.
///
/// # Errors
///
/// Returns an error if inputs are invalid or database operations fail.
pub fn execute(command: &ReleaseCommands, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(cli)?;

    match command {
        ReleaseCommands::Add(args) => release_add(args, &mut ctx, json),
        ReleaseCommands::List => release_list(&ctx.storage, ctx.organization_id, ctx.project_id, json),
    }
}

fn release_add(args: &ReleaseAddArgs, ctx: &mut CommandContext, json: bool) -> Result<()> {
    let date_added = parse_timestamp(&args.date, "date")?;
    let release = ctx.storage.create_release(
        ctx.organization_id,
        ctx.project_id,
        &args.version,
        date_added,
    )?;

    let resolutions_updated = if args.keep_pending {
        0
    } else {
        ctx.storage.clear_expired_resolutions(&release)?
    };

    if json {
        return print_json(&ReleaseAddOutput {
            release: &release,
            resolutions_updated,
        });
    }

    println!("Added release {} (id {})", release.version, release.id);
    if resolutions_updated > 0 {
        println!("Resolved {resolutions_updated} pending next-release resolution(s)");
    }
    Ok(())
}

fn release_list(
    storage: &SqliteStorage,
    organization_id: i64,
    project_id: i64,
    json: bool,
) -> Result<()> {
    let releases = storage.list_releases(organization_id, project_id)?;
    let follows_semver = storage.follows_semver_scheme(organization_id, project_id, None)?;

    if json {
        return print_json(&ReleaseListOutput {
            follows_semver,
            releases: &releases,
        });
    }

    if releases.is_empty() {
        println!("No releases.");
        return Ok(());
    }

    let scheme = if follows_semver { "semver" } else { "date" };
    println!("Releases of project {project_id} (ordered by {scheme}):");
    for release in &releases {
        println!(
            "  {:>5}  {:<32}  {}",
            release.id,
            release.version,
            release.date_added.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
