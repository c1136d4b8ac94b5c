//! `SQLite` storage implementation.

use crate::error::{OptionExt, Result, TriageError};
use crate::grouping::{EventAggregator, FeatureFlags, GroupHashStore};
use crate::model::{
    Event, Group, GroupResolution, HierarchicalHashRow, Release, ResolutionStatus, ResolutionType,
};
use crate::resolution::{
    DEFAULT_SEMVER_RELEASE_WINDOW, ReleaseLookup, ResolutionStore, expire_resolution,
    follows_semver_from_recent,
};
use crate::storage::schema::apply_schema;
use crate::version::parse_release;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    semver_release_window: usize,
}

/// An event to be recorded for a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub primary_hash: String,
    pub hierarchical_hashes: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Raw resolution columns before the type code is decoded.
type ResolutionRow = (
    i64,
    i64,
    String,
    Option<String>,
    Option<i64>,
    i64,
    Option<i64>,
    String,
);

const RELEASE_COLUMNS: &str = "id, organization_id, project_id, version, date_added";
const GROUP_COLUMNS: &str = "id, organization_id, project_id, title, first_seen";

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            semver_release_window: DEFAULT_SEMVER_RELEASE_WINDOW,
        })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            semver_release_window: DEFAULT_SEMVER_RELEASE_WINDOW,
        })
    }

    /// Set how many recent releases the semver scheme check inspects.
    #[must_use]
    pub fn with_semver_release_window(mut self, window: usize) -> Self {
        self.semver_release_window = window.max(1);
        self
    }

    #[must_use]
    pub const fn semver_release_window(&self) -> usize {
        self.semver_release_window
    }

    // ========================================================================
    // Releases
    // ========================================================================

    /// Create a release.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed versions, `DuplicateRelease`
    /// if the organization already has this version, or a database error.
    pub fn create_release(
        &mut self,
        organization_id: i64,
        project_id: i64,
        version: &str,
        date_added: DateTime<Utc>,
    ) -> Result<Release> {
        parse_release(version).map_err(|e| TriageError::validation("version", e.to_string()))?;

        if self.find_release(organization_id, version)?.is_some() {
            return Err(TriageError::DuplicateRelease {
                version: version.to_string(),
            });
        }

        self.conn.execute(
            "INSERT INTO releases (organization_id, project_id, version, date_added)
             VALUES (?, ?, ?, ?)",
            rusqlite::params![
                organization_id,
                project_id,
                version,
                format_datetime(date_added)
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(release_id = id, version, "Created release");

        Ok(Release {
            id,
            organization_id,
            project_id,
            version: version.to_string(),
            date_added,
        })
    }

    /// Get a release by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_release(&self, id: i64) -> Result<Option<Release>> {
        let sql = format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE id = ?");
        let release = self
            .conn
            .query_row(&sql, [id], release_from_row)
            .optional()?;
        Ok(release)
    }

    /// Find a release of the organization by exact version.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn find_release(&self, organization_id: i64, version: &str) -> Result<Option<Release>> {
        let sql = format!(
            "SELECT {RELEASE_COLUMNS} FROM releases WHERE organization_id = ? AND version = ?"
        );
        let release = self
            .conn
            .query_row(
                &sql,
                rusqlite::params![organization_id, version],
                release_from_row,
            )
            .optional()?;
        Ok(release)
    }

    /// Resolve a release given either its numeric ID or its version.
    ///
    /// Versions take precedence over IDs when both would match.
    ///
    /// # Errors
    ///
    /// Returns `ReleaseNotFound` if neither lookup matches.
    pub fn resolve_release(&self, organization_id: i64, reference: &str) -> Result<Release> {
        if let Some(release) = self.find_release(organization_id, reference)? {
            return Ok(release);
        }
        if let Ok(id) = reference.parse::<i64>() {
            if let Some(release) = self.get_release(id)? {
                return Ok(release);
            }
        }
        Err(TriageError::ReleaseNotFound {
            reference: reference.to_string(),
        })
    }

    /// List the releases of a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_releases(&self, organization_id: i64, project_id: i64) -> Result<Vec<Release>> {
        let sql = format!(
            "SELECT {RELEASE_COLUMNS} FROM releases
             WHERE organization_id = ? AND project_id = ?
             ORDER BY date_added DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let releases = stmt
            .query_map(
                rusqlite::params![organization_id, project_id],
                release_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(releases)
    }

    /// Versions of the most recent releases of a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn recent_release_versions(
        &self,
        organization_id: i64,
        project_id: i64,
        limit: usize,
    ) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT version FROM releases
             WHERE organization_id = ? AND project_id = ?
             ORDER BY date_added DESC, id DESC
             LIMIT ?",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let versions = stmt
            .query_map(
                rusqlite::params![organization_id, project_id, limit],
                |row| row.get(0),
            )?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(versions)
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Create a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_group(
        &mut self,
        organization_id: i64,
        project_id: i64,
        title: &str,
        first_seen: DateTime<Utc>,
    ) -> Result<Group> {
        self.conn.execute(
            "INSERT INTO issue_groups (organization_id, project_id, title, first_seen)
             VALUES (?, ?, ?, ?)",
            rusqlite::params![
                organization_id,
                project_id,
                title,
                format_datetime(first_seen)
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(group_id = id, project_id, "Created group");

        Ok(Group {
            id,
            organization_id,
            project_id,
            title: title.to_string(),
            first_seen,
        })
    }

    /// Get a group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_group(&self, id: i64) -> Result<Option<Group>> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM issue_groups WHERE id = ?");
        let group = self.conn.query_row(&sql, [id], group_from_row).optional()?;
        Ok(group)
    }

    /// Get a group by ID, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if there is no such group.
    pub fn require_group(&self, id: i64) -> Result<Group> {
        self.get_group(id)?
            .ok_or_triage(|| TriageError::GroupNotFound { id })
    }

    // ========================================================================
    // Grouping hashes and events
    // ========================================================================

    /// Materialize a hash for a group.
    ///
    /// Returns `false` if the group already had the hash.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the hash belongs to another group of the
    /// same project.
    pub fn add_group_hash(&mut self, group: &Group, hash: &str) -> Result<bool> {
        let owner: Option<i64> = self
            .conn
            .query_row(
                "SELECT group_id FROM group_hashes WHERE project_id = ? AND hash = ?",
                rusqlite::params![group.project_id, hash],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            Some(owner) if owner == group.id => Ok(false),
            Some(owner) => Err(TriageError::validation(
                "hash",
                format!("{hash} is already materialized for group {owner}"),
            )),
            None => {
                self.conn.execute(
                    "INSERT INTO group_hashes (project_id, hash, group_id) VALUES (?, ?, ?)",
                    rusqlite::params![group.project_id, hash, group.id],
                )?;
                Ok(true)
            }
        }
    }

    /// Remove a materialized hash from a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn remove_group_hash(&mut self, group: &Group, hash: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM group_hashes WHERE project_id = ? AND group_id = ? AND hash = ?",
            rusqlite::params![group.project_id, group.id, hash],
        )?;
        Ok(deleted > 0)
    }

    /// Record an event for a group.
    ///
    /// The first event of a group without materialized hashes materializes
    /// its most granular hierarchical hash (or its primary hash when the
    /// event is not hierarchical).
    ///
    /// # Errors
    ///
    /// Returns a validation error (and records nothing) if the hash to
    /// materialize already belongs to another group, or a database error.
    pub fn record_event(&mut self, group: &Group, event: &NewEvent) -> Result<Event> {
        let hashes_json = serde_json::to_string(&event.hierarchical_hashes)?;
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO events (project_id, group_id, primary_hash, hierarchical_hashes, timestamp)
             VALUES (?, ?, ?, ?, ?)",
            rusqlite::params![
                group.project_id,
                group.id,
                event.primary_hash,
                hashes_json,
                format_datetime(event.timestamp)
            ],
        )?;
        let id = tx.last_insert_rowid();

        let has_hashes: bool = tx
            .prepare("SELECT 1 FROM group_hashes WHERE project_id = ? AND group_id = ? LIMIT 1")?
            .exists(rusqlite::params![group.project_id, group.id])?;
        if !has_hashes {
            let hash = event
                .hierarchical_hashes
                .first()
                .unwrap_or(&event.primary_hash);
            let owner: Option<i64> = tx
                .query_row(
                    "SELECT group_id FROM group_hashes WHERE project_id = ? AND hash = ?",
                    rusqlite::params![group.project_id, hash],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(owner) = owner {
                // Dropping the transaction rolls back the event insert.
                return Err(TriageError::validation(
                    "hash",
                    format!("{hash} is already materialized for group {owner}"),
                ));
            }
            tx.execute(
                "INSERT INTO group_hashes (project_id, hash, group_id) VALUES (?, ?, ?)",
                rusqlite::params![group.project_id, hash, group.id],
            )?;
            debug!(group_id = group.id, hash, "Materialized initial hash");
        }

        tx.commit()?;

        Ok(Event {
            id,
            project_id: group.project_id,
            group_id: group.id,
            primary_hash: event.primary_hash.clone(),
            hierarchical_hashes: event.hierarchical_hashes.clone(),
            timestamp: event.timestamp,
        })
    }

    /// Count the events of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_events(&self, group: &Group) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM events WHERE project_id = ? AND group_id = ?",
            rusqlite::params![group.project_id, group.id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ========================================================================
    // Resolutions
    // ========================================================================

    /// Store the resolution of a group, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the release does not exist or the write fails.
    pub fn set_resolution(&mut self, resolution: &GroupResolution) -> Result<()> {
        self.conn.execute(
            "INSERT INTO group_resolutions
                (group_id, release_id, current_release_version, type, actor_id, datetime, status)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(group_id) DO UPDATE SET
                release_id = excluded.release_id,
                current_release_version = excluded.current_release_version,
                type = excluded.type,
                actor_id = excluded.actor_id,
                datetime = excluded.datetime,
                status = excluded.status",
            rusqlite::params![
                resolution.group_id,
                resolution.release_id,
                resolution.current_release_version,
                resolution.resolution_type.map(ResolutionType::code),
                resolution.actor_id,
                format_datetime(resolution.datetime),
                resolution.status.code()
            ],
        )?;
        debug!(
            group_id = resolution.group_id,
            release_id = resolution.release_id,
            "Stored resolution"
        );
        Ok(())
    }

    /// Delete the resolution of a group.
    ///
    /// Returns `true` if a resolution was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_resolution(&mut self, group_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM group_resolutions WHERE group_id = ?",
            [group_id],
        )?;
        Ok(deleted > 0)
    }

    /// Move pending next-release resolutions of the release's project onto
    /// `new_release`. Returns the number of resolutions updated.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored resolution cannot be decoded or a write
    /// fails. The transaction is rolled back on error.
    pub fn clear_expired_resolutions(&mut self, new_release: &Release) -> Result<usize> {
        let tx = self.conn.transaction()?;

        let candidates = {
            let mut stmt = tx.prepare(
                "SELECT r.group_id, r.release_id, rel.date_added, r.current_release_version,
                        r.type, r.status, r.actor_id, r.datetime
                 FROM group_resolutions r
                 JOIN releases rel ON rel.id = r.release_id
                 JOIN issue_groups g ON g.id = r.group_id
                 WHERE g.organization_id = ? AND g.project_id = ?
                   AND (r.type IS NULL OR r.type = ?)
                   AND r.release_id != ?",
            )?;
            stmt.query_map(
                rusqlite::params![
                    new_release.organization_id,
                    new_release.project_id,
                    ResolutionType::InNextRelease.code(),
                    new_release.id
                ],
                resolution_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut updated = 0;
        for raw in candidates {
            let resolution = decode_resolution(raw)?;
            let Some(expired) = expire_resolution(&resolution, new_release) else {
                continue;
            };
            tx.execute(
                "UPDATE group_resolutions SET release_id = ?, type = ?, status = ? WHERE group_id = ?",
                rusqlite::params![
                    expired.release_id,
                    expired.resolution_type.map(ResolutionType::code),
                    expired.status.code(),
                    expired.group_id
                ],
            )?;
            updated += 1;
        }

        tx.commit()?;
        if updated > 0 {
            info!(
                release = %new_release.version,
                count = updated,
                "Resolved pending next-release resolutions"
            );
        }
        Ok(updated)
    }

    // ========================================================================
    // Feature flags
    // ========================================================================

    /// Enable a feature for one organization, or for all when `None`.
    ///
    /// Returns `false` if the flag was already enabled at that scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn enable_feature(&mut self, feature: &str, organization_id: Option<i64>) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO feature_flags (feature, organization_id, enabled_at)
             VALUES (?, ?, ?)",
            rusqlite::params![feature, organization_id, format_datetime(Utc::now())],
        )?;
        Ok(inserted > 0)
    }

    /// Disable a feature at exactly the given scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn disable_feature(&mut self, feature: &str, organization_id: Option<i64>) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM feature_flags WHERE feature = ? AND organization_id IS ?",
            rusqlite::params![feature, organization_id],
        )?;
        Ok(deleted > 0)
    }

    /// List enabled feature flags with their organization scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_features(&self) -> Result<Vec<(String, Option<i64>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT feature, organization_id FROM feature_flags
             ORDER BY feature, organization_id",
        )?;
        let flags = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(flags)
    }

    // ========================================================================
    // Config
    // ========================================================================

    /// Get a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM config WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Fetch all config values from the config table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_all_config(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM config")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Set a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    /// Delete a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_config(&mut self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM config WHERE key = ?", rusqlite::params![key])?;
        Ok(deleted > 0)
    }
}

impl ReleaseLookup for SqliteStorage {
    fn follows_semver_scheme(
        &self,
        organization_id: i64,
        project_id: i64,
        release_version: Option<&str>,
    ) -> Result<bool> {
        let recent =
            self.recent_release_versions(organization_id, project_id, self.semver_release_window)?;
        let follows = follows_semver_from_recent(&recent, release_version);
        debug!(
            organization_id,
            project_id,
            inspected = recent.len(),
            follows,
            "Checked semver versioning scheme"
        );
        Ok(follows)
    }

    fn find_release_by_version(
        &self,
        organization_id: i64,
        version: &str,
    ) -> Result<Option<Release>> {
        self.find_release(organization_id, version)
    }
}

impl ResolutionStore for SqliteStorage {
    fn get_resolution(&self, group_id: i64) -> Result<Option<GroupResolution>> {
        let raw = self
            .conn
            .query_row(
                "SELECT r.group_id, r.release_id, rel.date_added, r.current_release_version,
                        r.type, r.status, r.actor_id, r.datetime
                 FROM group_resolutions r
                 JOIN releases rel ON rel.id = r.release_id
                 WHERE r.group_id = ?",
                [group_id],
                resolution_row,
            )
            .optional()?;
        raw.map(decode_resolution).transpose()
    }
}

impl EventAggregator for SqliteStorage {
    fn hierarchical_hash_rows(&self, group: &Group) -> Result<Vec<HierarchicalHashRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT primary_hash, hierarchical_hashes FROM events
             WHERE project_id = ? AND group_id = ?
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![group.project_id, group.id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut longest: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (primary_hash, hashes_json) in rows {
            let hashes: Vec<String> = serde_json::from_str(&hashes_json)?;
            let entry = longest.entry(primary_hash).or_default();
            if hashes.len() > entry.len() {
                *entry = hashes;
            }
        }

        Ok(longest
            .into_iter()
            .map(|(primary_hash, longest_hierarchical_hashes)| HierarchicalHashRow {
                primary_hash,
                longest_hierarchical_hashes,
            })
            .collect())
    }
}

impl GroupHashStore for SqliteStorage {
    fn materialized_hashes(&self, group: &Group) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash FROM group_hashes WHERE project_id = ? AND group_id = ?")?;
        let hashes = stmt
            .query_map(rusqlite::params![group.project_id, group.id], |row| {
                row.get(0)
            })?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(hashes)
    }
}

impl FeatureFlags for SqliteStorage {
    fn has_feature(
        &self,
        feature: &str,
        organization_id: i64,
        _actor: Option<&str>,
    ) -> Result<bool> {
        let enabled = self
            .conn
            .prepare(
                "SELECT 1 FROM feature_flags
                 WHERE feature = ? AND (organization_id IS NULL OR organization_id = ?)
                 LIMIT 1",
            )?
            .exists(rusqlite::params![feature, organization_id])?;
        Ok(enabled)
    }
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("invalid timestamp: {s}").into(),
    ))
}

fn release_from_row(row: &Row<'_>) -> rusqlite::Result<Release> {
    let date_added: String = row.get(4)?;
    Ok(Release {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        project_id: row.get(2)?,
        version: row.get(3)?,
        date_added: parse_datetime(4, &date_added)?,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    let first_seen: String = row.get(4)?;
    Ok(Group {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        project_id: row.get(2)?,
        title: row.get(3)?,
        first_seen: parse_datetime(4, &first_seen)?,
    })
}

fn resolution_row(row: &Row<'_>) -> rusqlite::Result<ResolutionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_resolution(raw: ResolutionRow) -> Result<GroupResolution> {
    let (group_id, release_id, release_date, current_release_version, kind, status, actor_id, at) =
        raw;
    Ok(GroupResolution {
        group_id,
        release_id,
        release_date_added: parse_datetime(2, &release_date)?,
        current_release_version,
        resolution_type: kind.map(ResolutionType::from_code).transpose()?,
        status: ResolutionStatus::from_code(status),
        actor_id,
        datetime: parse_datetime(7, &at)?,
    })
}
