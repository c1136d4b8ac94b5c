use crate::cli::InitArgs;
use crate::config::{DEFAULT_DB_FILENAME, TRIAGE_DIR_NAME};
use crate::error::{Result, ResultExt, TriageError};
use crate::storage::SqliteStorage;
use std::fs;
use std::path::Path;
use tracing::info;

const CONFIG_TEMPLATE: &str = r"# Triage Workspace Configuration
# default-organization: 1
# default-project: 1
# semver:
#   release-window: 10
# features:
#   enabled:
#     - organizations:grouping-tree-ui
";

const GITIGNORE_TEMPLATE: &str = r"# Database
*.db
*.db-shm
*.db-wal
";

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created.
pub fn execute(args: &InitArgs, root_dir: Option<&Path>) -> Result<()> {
    let base_dir = root_dir.unwrap_or_else(|| Path::new("."));
    let triage_dir = base_dir.join(TRIAGE_DIR_NAME);
    let db_path = triage_dir.join(DEFAULT_DB_FILENAME);

    if triage_dir.exists() {
        if db_path.exists() {
            if !args.force {
                return Err(TriageError::AlreadyInitialized { path: db_path });
            }
            fs::remove_file(&db_path)?;
            for suffix in ["-wal", "-shm"] {
                let sidecar = triage_dir.join(format!("{DEFAULT_DB_FILENAME}{suffix}"));
                if sidecar.exists() {
                    fs::remove_file(sidecar)?;
                }
            }
        }
    } else {
        fs::create_dir_all(&triage_dir)
            .with_context(|| format!("creating {}", triage_dir.display()))?;
    }

    // Opening the database creates the file and applies the schema.
    SqliteStorage::open(&db_path)?;

    let config_path = triage_dir.join("config.yaml");
    if !config_path.exists() {
        fs::write(&config_path, CONFIG_TEMPLATE)
            .with_context(|| format!("writing {}", config_path.display()))?;
    }

    let gitignore_path = triage_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE_TEMPLATE)
            .with_context(|| format!("writing {}", gitignore_path.display()))?;
    }

    info!(path = %triage_dir.display(), "Initialized workspace");
    println!("Initialized triage workspace in {TRIAGE_DIR_NAME}/");
    Ok(())
}
