//! JSON Schema output for command records.

use crate::cli::{SchemaArgs, SchemaTarget};
use crate::cli::commands::print_json;
use crate::error::{Result, StructuredError};
use crate::model::{Event, Group, GroupResolution, LevelsOverview, LevelsResponse, Release};
use schemars::schema::RootSchema;
use schemars::schema_for;
use std::collections::BTreeMap;

const ALL_TARGETS: [SchemaTarget; 7] = [
    SchemaTarget::Release,
    SchemaTarget::Group,
    SchemaTarget::Resolution,
    SchemaTarget::Event,
    SchemaTarget::Overview,
    SchemaTarget::Levels,
    SchemaTarget::Error,
];

/// Execute the schema command. Output is always JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn execute(args: &SchemaArgs) -> Result<()> {
    match args.target {
        Some(target) => print_json(&schema(target)),
        None => {
            let all: BTreeMap<&str, RootSchema> = ALL_TARGETS
                .iter()
                .map(|target| (target_name(*target), schema(*target)))
                .collect();
            print_json(&all)
        }
    }
}

fn schema(target: SchemaTarget) -> RootSchema {
    match target {
        SchemaTarget::Release => schema_for!(Release),
        SchemaTarget::Group => schema_for!(Group),
        SchemaTarget::Resolution => schema_for!(GroupResolution),
        SchemaTarget::Event => schema_for!(Event),
        SchemaTarget::Overview => schema_for!(LevelsOverview),
        SchemaTarget::Levels => schema_for!(LevelsResponse),
        SchemaTarget::Error => schema_for!(StructuredError),
    }
}

const fn target_name(target: SchemaTarget) -> &'static str {
    match target {
        SchemaTarget::Release => "release",
        SchemaTarget::Group => "group",
        SchemaTarget::Resolution => "resolution",
        SchemaTarget::Event => "event",
        SchemaTarget::Overview => "overview",
        SchemaTarget::Levels => "levels",
        SchemaTarget::Error => "error",
    }
}
