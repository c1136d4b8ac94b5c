//! Database schema definitions and migration logic.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the triage database.
pub const SCHEMA_SQL: &str = r"
    -- Releases
    CREATE TABLE IF NOT EXISTS releases (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL,
        project_id INTEGER NOT NULL,
        version TEXT NOT NULL,
        date_added TEXT NOT NULL,
        CHECK (length(version) >= 1 AND length(version) <= 250),
        UNIQUE (organization_id, version)
    );
    CREATE INDEX IF NOT EXISTS idx_releases_project ON releases(organization_id, project_id);
    CREATE INDEX IF NOT EXISTS idx_releases_date_added ON releases(date_added);

    -- Groups (issues)
    CREATE TABLE IF NOT EXISTS issue_groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL,
        project_id INTEGER NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        first_seen TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_issue_groups_project ON issue_groups(project_id);

    -- Group resolutions: at most one per group
    CREATE TABLE IF NOT EXISTS group_resolutions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL UNIQUE,
        release_id INTEGER NOT NULL,
        current_release_version TEXT,
        type INTEGER,
        actor_id INTEGER,
        datetime TEXT NOT NULL,
        status INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (group_id) REFERENCES issue_groups(id) ON DELETE CASCADE,
        FOREIGN KEY (release_id) REFERENCES releases(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_group_resolutions_release ON group_resolutions(release_id);
    CREATE INDEX IF NOT EXISTS idx_group_resolutions_datetime ON group_resolutions(datetime);

    -- Materialized grouping hashes
    CREATE TABLE IF NOT EXISTS group_hashes (
        project_id INTEGER NOT NULL,
        hash TEXT NOT NULL,
        group_id INTEGER NOT NULL,
        PRIMARY KEY (project_id, hash),
        FOREIGN KEY (group_id) REFERENCES issue_groups(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_group_hashes_group ON group_hashes(group_id);

    -- Events with their hierarchical hashes (JSON array, most granular first)
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL,
        group_id INTEGER NOT NULL,
        primary_hash TEXT NOT NULL,
        hierarchical_hashes TEXT NOT NULL DEFAULT '[]',
        timestamp TEXT NOT NULL,
        FOREIGN KEY (group_id) REFERENCES issue_groups(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_events_group ON events(project_id, group_id);

    -- Feature flags (NULL organization = every organization)
    CREATE TABLE IF NOT EXISTS feature_flags (
        feature TEXT NOT NULL,
        organization_id INTEGER,
        enabled_at TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_feature_flags_scope
        ON feature_flags(feature, ifnull(organization_id, -1));

    -- Config (Runtime)
    CREATE TABLE IF NOT EXISTS config (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- Metadata
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    run_migrations(conn)?;

    // Set journal mode to WAL for concurrency
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Enable foreign keys
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}

/// Record the schema version for databases created before it was tracked.
fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?)",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "releases",
            "issue_groups",
            "group_resolutions",
            "group_hashes",
            "events",
            "feature_flags",
            "config",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }

        let foreign_keys: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();

        let version: String = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION.to_string());
    }
}
