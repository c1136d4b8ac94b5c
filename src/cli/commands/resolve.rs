//! Resolve command implementation.

use crate::cli::commands::{CommandContext, print_json};
use crate::cli::{ResolutionKind, ResolveArgs};
use crate::config::CliOverrides;
use crate::error::{Result, TriageError};
use crate::model::{Group, GroupResolution, Release, ResolutionStatus, ResolutionType};
use crate::storage::SqliteStorage;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct ClearOutput {
    group_id: i64,
    cleared: bool,
}

/// Execute the resolve command.
///
/// # Errors
///
/// Returns an error if the group or release does not exist or the write fails.
pub fn execute(args: &ResolveArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(cli)?;
    let group = ctx.storage.require_group(args.group_id)?;

    if args.clear {
        let cleared = ctx.storage.delete_resolution(group.id)?;
        if json {
            return print_json(&ClearOutput {
                group_id: group.id,
                cleared,
            });
        }
        if cleared {
            println!("Cleared resolution of group {}", group.id);
        } else {
            println!("Group {} has no resolution", group.id);
        }
        return Ok(());
    }

    let release = target_release(&ctx.storage, &group, args.release.as_deref())?;
    let resolution = build_resolution(args, &group, &release);
    ctx.storage.set_resolution(&resolution)?;
    info!(
        group_id = group.id,
        release = %release.version,
        actor = %ctx.actor,
        "Resolved group"
    );

    if json {
        return print_json(&resolution);
    }

    let kind = resolution
        .resolution_type
        .map_or("unset", ResolutionType::as_str);
    println!(
        "Resolved group {} ({kind}) against release {}",
        group.id, release.version
    );
    if let Some(version) = &resolution.current_release_version {
        println!("Version snapshot: {version}");
    }
    Ok(())
}

/// The release named on the command line, or the latest release of the
/// group's project.
fn target_release(storage: &SqliteStorage, group: &Group, reference: Option<&str>) -> Result<Release> {
    let release = match reference {
        Some(reference) => storage.resolve_release(group.organization_id, reference)?,
        None => storage
            .list_releases(group.organization_id, group.project_id)?
            .into_iter()
            .next()
            .ok_or_else(|| TriageError::ReleaseNotFound {
                reference: "latest".to_string(),
            })?,
    };

    if release.project_id != group.project_id {
        return Err(TriageError::validation(
            "release",
            format!(
                "release {} belongs to project {}, group {} to project {}",
                release.version, release.project_id, group.id, group.project_id
            ),
        ));
    }
    Ok(release)
}

fn build_resolution(args: &ResolveArgs, group: &Group, release: &Release) -> GroupResolution {
    let (resolution_type, status) = match args.kind {
        ResolutionKind::InRelease => (Some(ResolutionType::InRelease), ResolutionStatus::Resolved),
        ResolutionKind::InNextRelease => (
            Some(ResolutionType::InNextRelease),
            ResolutionStatus::Pending,
        ),
        ResolutionKind::Unset => (None, ResolutionStatus::Pending),
    };

    let current_release_version = if args.no_snapshot {
        None
    } else {
        args.current_version.clone().or_else(|| {
            (args.kind == ResolutionKind::InNextRelease).then(|| release.version.clone())
        })
    };

    GroupResolution {
        group_id: group.id,
        release_id: release.id,
        release_date_added: release.date_added,
        current_release_version,
        resolution_type,
        status,
        actor_id: args.actor_id,
        datetime: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn args(kind: ResolutionKind) -> ResolveArgs {
        ResolveArgs {
            group_id: 1,
            release: None,
            kind,
            current_version: None,
            no_snapshot: false,
            actor_id: Some(9),
            clear: false,
        }
    }

    fn fixtures() -> (Group, Release) {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let group = Group {
            id: 1,
            organization_id: 1,
            project_id: 2,
            title: "TypeError".to_string(),
            first_seen: at,
        };
        let release = Release {
            id: 4,
            organization_id: 1,
            project_id: 2,
            version: "app@1.4.0".to_string(),
            date_added: at,
        };
        (group, release)
    }

    #[test]
    fn test_in_release_is_resolved_without_snapshot() {
        let (group, release) = fixtures();
        let res = build_resolution(&args(ResolutionKind::InRelease), &group, &release);
        assert_eq!(res.resolution_type, Some(ResolutionType::InRelease));
        assert_eq!(res.status, ResolutionStatus::Resolved);
        assert!(res.current_release_version.is_none());
        assert_eq!(res.actor_id, Some(9));
    }

    #[test]
    fn test_in_next_release_snapshots_release_version() {
        let (group, release) = fixtures();
        let res = build_resolution(&args(ResolutionKind::InNextRelease), &group, &release);
        assert_eq!(res.status, ResolutionStatus::Pending);
        assert_eq!(res.current_release_version.as_deref(), Some("app@1.4.0"));

        let no_snapshot = ResolveArgs {
            no_snapshot: true,
            ..args(ResolutionKind::InNextRelease)
        };
        assert!(
            build_resolution(&no_snapshot, &group, &release)
                .current_release_version
                .is_none()
        );
    }

    #[test]
    fn test_unset_type() {
        let (group, release) = fixtures();
        let res = build_resolution(&args(ResolutionKind::Unset), &group, &release);
        assert!(res.resolution_type.is_none());
    }

    #[test]
    fn test_target_release_defaults_to_latest() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let group = storage
            .create_group(1, 2, "TypeError", Utc::now())
            .unwrap();
        assert!(matches!(
            target_release(&storage, &group, None),
            Err(TriageError::ReleaseNotFound { .. })
        ));

        let older = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        storage.create_release(1, 2, "1.0", older).unwrap();
        let newer = storage
            .create_release(1, 2, "1.1", older + chrono::Duration::days(1))
            .unwrap();
        assert_eq!(target_release(&storage, &group, None).unwrap(), newer);

        storage.create_release(1, 3, "other-project", older).unwrap();
        assert!(matches!(
            target_release(&storage, &group, Some("other-project")),
            Err(TriageError::Validation { .. })
        ));
    }
}
