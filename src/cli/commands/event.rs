//! Event command implementation.

use crate::cli::commands::{CommandContext, print_json};
use crate::cli::{EventCommands, EventRecordArgs};
use crate::config::CliOverrides;
use crate::error::{Result, TriageError};
use crate::storage::NewEvent;
use crate::util::time::parse_timestamp;
use crate::util::{hierarchical_hashes, validate_hash};

/// Execute the event command.
///
/// # Errors
///
/// Returns an error if the group does not exist, inputs are invalid or the
/// insert fails.
pub fn execute(command: &EventCommands, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(cli)?;

    match command {
        EventCommands::Record(args) => event_record(args, &mut ctx, json),
    }
}

fn event_record(args: &EventRecordArgs, ctx: &mut CommandContext, json: bool) -> Result<()> {
    let group = ctx.storage.require_group(args.group_id)?;
    let new_event = build_event(args)?;
    let event = ctx.storage.record_event(&group, &new_event)?;

    if json {
        return print_json(&event);
    }

    println!(
        "Recorded event {} for group {} ({} level(s))",
        event.id,
        group.id,
        event.hierarchical_hashes.len()
    );
    Ok(())
}

fn build_event(args: &EventRecordArgs) -> Result<NewEvent> {
    let hierarchical = if args.frames.is_empty() {
        args.hashes
            .iter()
            .map(|hash| validate_hash("hash", hash))
            .collect::<Result<Vec<_>>>()?
    } else {
        hierarchical_hashes(&args.frames)
    };

    let primary_hash = match &args.primary_hash {
        Some(hash) => validate_hash("primary-hash", hash)?,
        None => hierarchical.first().cloned().ok_or_else(|| {
            TriageError::validation(
                "primary-hash",
                "required when no --frame or --hash is given",
            )
        })?,
    };

    Ok(NewEvent {
        primary_hash,
        hierarchical_hashes: hierarchical,
        timestamp: parse_timestamp(&args.timestamp, "timestamp")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::grouping_hash;

    fn args() -> EventRecordArgs {
        EventRecordArgs {
            group_id: 1,
            frames: Vec::new(),
            hashes: Vec::new(),
            primary_hash: None,
            timestamp: "2025-01-01".to_string(),
        }
    }

    #[test]
    fn test_frames_derive_hash_chain() {
        let event = build_event(&EventRecordArgs {
            frames: vec!["main".to_string(), "handler".to_string()],
            ..args()
        })
        .unwrap();
        assert_eq!(event.hierarchical_hashes.len(), 2);
        assert_eq!(event.primary_hash, grouping_hash(&["main"]));
    }

    #[test]
    fn test_primary_hash_required_without_levels() {
        let err = build_event(&args()).unwrap_err();
        assert!(matches!(err, TriageError::Validation { .. }));

        let event = build_event(&EventRecordArgs {
            primary_hash: Some("f".repeat(32)),
            ..args()
        })
        .unwrap();
        assert!(event.hierarchical_hashes.is_empty());
    }

    #[test]
    fn test_raw_hashes_are_validated() {
        let err = build_event(&EventRecordArgs {
            hashes: vec!["nothex".to_string()],
            ..args()
        })
        .unwrap_err();
        assert!(matches!(err, TriageError::Validation { .. }));
    }
}
