//! Version command implementation.

use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
    schema_version: i32,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };
    let schema_version = crate::storage::schema::CURRENT_SCHEMA_VERSION;

    if json {
        let payload = serde_json::to_string(&VersionOutput {
            version,
            build,
            schema_version,
        })?;
        println!("{payload}");
        return Ok(());
    }

    println!("tri version {version} ({build}, schema v{schema_version})");
    Ok(())
}
