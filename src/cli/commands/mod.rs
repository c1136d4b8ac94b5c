//! Command implementations.

pub mod check;
pub mod completions;
pub mod config;
pub mod event;
pub mod feature;
pub mod group;
pub mod init;
pub mod levels;
pub mod release;
pub mod resolve;
pub mod schema;
pub mod version;

use serde::Serialize;

use crate::config::{
    self as triage_config, CliOverrides, ConfigLayer, default_organization_from_layer,
    default_project_from_layer,
};
use crate::error::Result;
use crate::storage::SqliteStorage;

/// Everything a workspace command needs after discovery.
#[derive(Debug)]
pub struct CommandContext {
    pub storage: SqliteStorage,
    pub config: ConfigLayer,
    pub organization_id: i64,
    pub project_id: i64,
    pub actor: String,
}

impl CommandContext {
    /// Discover the workspace, open its database and resolve the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace is missing, the database cannot be
    /// opened or the organization/project defaults are invalid.
    pub fn open(cli: &CliOverrides) -> Result<Self> {
        let triage_dir = triage_config::discover_triage_dir(None)?;
        let opened = triage_config::open_storage_with_cli(&triage_dir, cli)?;
        let organization_id = default_organization_from_layer(&opened.config)?;
        let project_id = default_project_from_layer(&opened.config)?;
        let actor = triage_config::resolve_actor(&opened.config);

        Ok(Self {
            storage: opened.storage,
            config: opened.config,
            organization_id,
            project_id,
            actor,
        })
    }
}

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}
