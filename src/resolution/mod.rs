//! Regression detection: does a release already contain a group's fix?
//!
//! A group resolved "in release R" or "in next release" is still considered
//! resolved for a candidate release when the candidate predates the fix.
//! Whether "predates" means semver precedence or release date depends on
//! the project's versioning scheme.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::{debug, trace};

use crate::error::Result;
use crate::model::{Group, GroupResolution, Release, ResolutionStatus, ResolutionType};
use crate::version::{compare_versions, is_semver_version, parse_comparable};

/// Number of recent releases inspected when deciding the versioning scheme.
pub const DEFAULT_SEMVER_RELEASE_WINDOW: usize = 10;

/// Release lookups needed by the resolution check.
pub trait ReleaseLookup {
    /// Does the project order its releases by semantic version?
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn follows_semver_scheme(
        &self,
        organization_id: i64,
        project_id: i64,
        release_version: Option<&str>,
    ) -> Result<bool>;

    /// Find a release of the organization by its exact version string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn find_release_by_version(
        &self,
        organization_id: i64,
        version: &str,
    ) -> Result<Option<Release>>;
}

/// Read access to stored resolutions.
pub trait ResolutionStore {
    /// The resolution of a group, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be read or decoded
    /// (including an invalid resolution type).
    fn get_resolution(&self, group_id: i64) -> Result<Option<GroupResolution>>;
}

/// Decide whether `release` should be treated as already containing the fix
/// recorded in `resolution`.
///
/// This is used to suggest whether a regression has occurred.
///
/// # Errors
///
/// Returns an error only if a release lookup fails. Version parse failures
/// fall back to the date-based comparison.
pub fn has_resolution(
    resolution: Option<&GroupResolution>,
    group: &Group,
    release: Option<&Release>,
    lookup: &dyn ReleaseLookup,
) -> Result<bool> {
    let Some(resolution) = resolution else {
        return Ok(false);
    };

    // Going from "no release" to "some release" means the event is older.
    let Some(release) = release else {
        return Ok(true);
    };

    if let Some(current_version) = resolution.current_release_version.as_deref() {
        let follows_semver = lookup.follows_semver_scheme(
            group.organization_id,
            group.project_id,
            Some(&release.version),
        )?;

        if follows_semver {
            match (
                parse_comparable(current_version),
                parse_comparable(&release.version),
            ) {
                (Ok(current), Ok(candidate)) => {
                    let ordering = compare_versions(&current, &candidate);
                    trace!(
                        group_id = group.id,
                        current = current_version,
                        candidate = %release.version,
                        ?ordering,
                        "Compared release versions"
                    );
                    return Ok(ordering != Ordering::Less);
                }
                (current, candidate) => {
                    debug!(
                        group_id = group.id,
                        current_error = ?current.err(),
                        candidate_error = ?candidate.err(),
                        "Version parse failed, falling back to release dates"
                    );
                }
            }
        } else if let Some(current_release) =
            lookup.find_release_by_version(group.organization_id, current_version)?
        {
            return Ok(next_release_covers(
                current_release.id,
                current_release.date_added,
                release,
            ));
        } else {
            debug!(
                group_id = group.id,
                version = current_version,
                "Snapshot release not found, falling back to resolution release"
            );
        }
    }

    Ok(chronological_resolution(resolution, release))
}

/// Run [`has_resolution`] for a stored group.
///
/// # Errors
///
/// Returns an error if the resolution cannot be loaded or a lookup fails.
pub fn group_has_resolution<S>(store: &S, group: &Group, release: Option<&Release>) -> Result<bool>
where
    S: ResolutionStore + ReleaseLookup,
{
    let resolution = store.get_resolution(group.id)?;
    has_resolution(resolution.as_ref(), group, release, store)
}

/// Date-based comparison keyed on the resolution type.
#[must_use]
pub fn chronological_resolution(resolution: &GroupResolution, release: &Release) -> bool {
    match resolution.resolution_type {
        None | Some(ResolutionType::InNextRelease) => {
            debug!(
                group_id = resolution.group_id,
                "has_resolution.in_next_release fallback"
            );
            next_release_covers(resolution.release_id, resolution.release_date_added, release)
        }
        Some(ResolutionType::InRelease) => {
            if resolution.release_id == release.id {
                return false;
            }
            if resolution.release_date_added < release.date_added {
                return false;
            }
            true
        }
    }
}

/// A release is covered by an in-next-release resolution when it is the
/// resolution's release or was added before it.
fn next_release_covers(
    resolution_release_id: i64,
    resolution_release_date: DateTime<Utc>,
    release: &Release,
) -> bool {
    resolution_release_id == release.id || resolution_release_date > release.date_added
}

/// Decide the versioning scheme from the most recent release versions
/// (newest first, already limited to the inspection window).
///
/// A project with no releases does not follow semver. When a candidate
/// version is given it must be semver as well.
#[must_use]
pub fn follows_semver_from_recent(recent_versions: &[String], release_version: Option<&str>) -> bool {
    if recent_versions.is_empty() {
        return false;
    }
    let all_semver = recent_versions.iter().all(|v| is_semver_version(v));
    all_semver && release_version.is_none_or(is_semver_version)
}

/// Move an outstanding next-release resolution onto a newly created release.
///
/// Returns the updated record when `resolution` is pending on an older
/// release and is of type in-next-release or unset. The caller selects
/// resolutions of the new release's project.
#[must_use]
pub fn expire_resolution(
    resolution: &GroupResolution,
    new_release: &Release,
) -> Option<GroupResolution> {
    let expirable_type = matches!(
        resolution.resolution_type,
        None | Some(ResolutionType::InNextRelease)
    );
    if !expirable_type
        || resolution.status != ResolutionStatus::Pending
        || resolution.release_id == new_release.id
        || resolution.release_date_added >= new_release.date_added
    {
        return None;
    }

    Some(GroupResolution {
        release_id: new_release.id,
        release_date_added: new_release.date_added,
        resolution_type: Some(ResolutionType::InRelease),
        status: ResolutionStatus::Resolved,
        ..resolution.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;

    fn base_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_689_600, 0).unwrap()
    }

    fn group() -> Group {
        Group {
            id: 1,
            organization_id: 10,
            project_id: 100,
            title: "TypeError".to_string(),
            first_seen: base_time(),
        }
    }

    fn release(id: i64, version: &str, day: i64) -> Release {
        Release {
            id,
            organization_id: 10,
            project_id: 100,
            version: version.to_string(),
            date_added: base_time() + Duration::days(day),
        }
    }

    fn resolution(kind: Option<ResolutionType>, target: &Release) -> GroupResolution {
        GroupResolution {
            group_id: 1,
            release_id: target.id,
            release_date_added: target.date_added,
            current_release_version: None,
            resolution_type: kind,
            status: ResolutionStatus::Pending,
            actor_id: None,
            datetime: base_time(),
        }
    }

    struct FakeLookup {
        semver: bool,
        releases: Vec<Release>,
        semver_calls: Cell<usize>,
    }

    impl FakeLookup {
        fn new(semver: bool, releases: Vec<Release>) -> Self {
            Self {
                semver,
                releases,
                semver_calls: Cell::new(0),
            }
        }
    }

    impl ReleaseLookup for FakeLookup {
        fn follows_semver_scheme(&self, _: i64, _: i64, _: Option<&str>) -> Result<bool> {
            self.semver_calls.set(self.semver_calls.get() + 1);
            Ok(self.semver)
        }

        fn find_release_by_version(&self, _: i64, version: &str) -> Result<Option<Release>> {
            Ok(self.releases.iter().find(|r| r.version == version).cloned())
        }
    }

    struct FailingLookup;

    impl ReleaseLookup for FailingLookup {
        fn follows_semver_scheme(&self, _: i64, _: i64, _: Option<&str>) -> Result<bool> {
            Err(TriageError::Config("lookup offline".to_string()))
        }

        fn find_release_by_version(&self, _: i64, _: &str) -> Result<Option<Release>> {
            Err(TriageError::Config("lookup offline".to_string()))
        }
    }

    #[test]
    fn test_no_resolution_is_false() {
        let lookup = FakeLookup::new(false, vec![]);
        let candidate = release(1, "1.0", 0);
        assert!(!has_resolution(None, &group(), Some(&candidate), &lookup).unwrap());
        assert!(!has_resolution(None, &group(), None, &lookup).unwrap());
    }

    #[test]
    fn test_missing_release_is_true() {
        let lookup = FakeLookup::new(false, vec![]);
        let target = release(1, "1.0", 0);
        let res = resolution(Some(ResolutionType::InRelease), &target);
        assert!(has_resolution(Some(&res), &group(), None, &lookup).unwrap());
    }

    #[test]
    fn test_in_release_same_release_is_false() {
        let lookup = FakeLookup::new(false, vec![]);
        let target = release(1, "1.0", 5);
        let res = resolution(Some(ResolutionType::InRelease), &target);
        assert!(!has_resolution(Some(&res), &group(), Some(&target), &lookup).unwrap());
    }

    #[test]
    fn test_in_release_newer_candidate_is_false() {
        let lookup = FakeLookup::new(false, vec![]);
        let target = release(1, "1.0", 5);
        let newer = release(2, "1.1", 6);
        let res = resolution(Some(ResolutionType::InRelease), &target);
        assert!(!has_resolution(Some(&res), &group(), Some(&newer), &lookup).unwrap());
    }

    #[test]
    fn test_in_release_older_candidate_is_true() {
        let lookup = FakeLookup::new(false, vec![]);
        let target = release(1, "1.0", 5);
        let older = release(2, "0.9", 4);
        let res = resolution(Some(ResolutionType::InRelease), &target);
        assert!(has_resolution(Some(&res), &group(), Some(&older), &lookup).unwrap());
    }

    #[test]
    fn test_in_next_release_fallback() {
        let lookup = FakeLookup::new(false, vec![]);
        let target = release(1, "1.0", 5);
        let res = resolution(Some(ResolutionType::InNextRelease), &target);

        assert!(has_resolution(Some(&res), &group(), Some(&target), &lookup).unwrap());
        assert!(has_resolution(Some(&res), &group(), Some(&release(2, "0.9", 4)), &lookup).unwrap());
        assert!(!has_resolution(Some(&res), &group(), Some(&release(3, "1.1", 6)), &lookup).unwrap());
    }

    #[test]
    fn test_unset_type_behaves_like_next_release() {
        let lookup = FakeLookup::new(false, vec![]);
        let target = release(1, "1.0", 5);
        let res = resolution(None, &target);
        assert!(has_resolution(Some(&res), &group(), Some(&target), &lookup).unwrap());
        assert!(!has_resolution(Some(&res), &group(), Some(&release(2, "1.1", 9)), &lookup).unwrap());
    }

    #[test]
    fn test_no_snapshot_skips_scheme_lookup() {
        let lookup = FakeLookup::new(true, vec![]);
        let target = release(1, "app@1.0.0", 5);
        let res = resolution(Some(ResolutionType::InRelease), &target);
        has_resolution(Some(&res), &group(), Some(&target), &lookup).unwrap();
        assert_eq!(lookup.semver_calls.get(), 0);
    }

    #[test]
    fn test_semver_snapshot_comparison() {
        let lookup = FakeLookup::new(true, vec![]);
        let target = release(1, "app@1.0.0", 5);
        let mut res = resolution(Some(ResolutionType::InNextRelease), &target);
        res.current_release_version = Some("app@1.2.0".to_string());

        // Same version as the snapshot counts as resolved.
        let same = release(2, "app@1.2.0", 9);
        assert!(has_resolution(Some(&res), &group(), Some(&same), &lookup).unwrap());

        // Older by semver but newer by date: semver wins.
        let older = release(3, "app@1.1.9", 10);
        assert!(has_resolution(Some(&res), &group(), Some(&older), &lookup).unwrap());

        let newer = release(4, "app@1.3.0", 1);
        assert!(!has_resolution(Some(&res), &group(), Some(&newer), &lookup).unwrap());
        assert_eq!(lookup.semver_calls.get(), 3);
    }

    #[test]
    fn test_semver_parse_failure_falls_back_to_dates() {
        let lookup = FakeLookup::new(true, vec![]);
        let target = release(1, "app@1.0.0", 5);
        let mut res = resolution(Some(ResolutionType::InNextRelease), &target);
        res.current_release_version = Some("app@not-a-version".to_string());

        let older = release(2, "app@9.9.9", 4);
        assert!(has_resolution(Some(&res), &group(), Some(&older), &lookup).unwrap());
        let newer = release(3, "app@0.0.1", 6);
        assert!(!has_resolution(Some(&res), &group(), Some(&newer), &lookup).unwrap());
    }

    #[test]
    fn test_date_snapshot_uses_snapshot_release() {
        let snapshot = release(7, "build-77", 20);
        let lookup = FakeLookup::new(false, vec![snapshot.clone()]);
        let target = release(1, "build-10", 5);
        let mut res = resolution(Some(ResolutionType::InNextRelease), &target);
        res.current_release_version = Some("build-77".to_string());

        // Older than the snapshot release: covered even though newer than target.
        let candidate = release(2, "build-50", 10);
        assert!(has_resolution(Some(&res), &group(), Some(&candidate), &lookup).unwrap());
        assert!(has_resolution(Some(&res), &group(), Some(&snapshot), &lookup).unwrap());
        let later = release(3, "build-90", 30);
        assert!(!has_resolution(Some(&res), &group(), Some(&later), &lookup).unwrap());
    }

    #[test]
    fn test_date_snapshot_missing_falls_back() {
        let lookup = FakeLookup::new(false, vec![]);
        let target = release(1, "build-10", 5);
        let mut res = resolution(Some(ResolutionType::InRelease), &target);
        res.current_release_version = Some("build-77".to_string());

        let candidate = release(2, "build-50", 10);
        assert!(!has_resolution(Some(&res), &group(), Some(&candidate), &lookup).unwrap());
    }

    #[test]
    fn test_lookup_errors_propagate() {
        let target = release(1, "app@1.0.0", 5);
        let mut res = resolution(Some(ResolutionType::InNextRelease), &target);
        res.current_release_version = Some("app@1.0.0".to_string());
        let err = has_resolution(Some(&res), &group(), Some(&target), &FailingLookup);
        assert!(err.is_err());
    }

    #[test]
    fn test_follows_semver_from_recent() {
        let recent = vec!["app@1.0.0".to_string(), "app@1.1.0".to_string()];
        assert!(follows_semver_from_recent(&recent, None));
        assert!(follows_semver_from_recent(&recent, Some("app@2.0.0")));
        assert!(!follows_semver_from_recent(&recent, Some("nightly")));
        assert!(!follows_semver_from_recent(&[], Some("app@2.0.0")));

        let mixed = vec!["app@1.0.0".to_string(), "abcdef".to_string()];
        assert!(!follows_semver_from_recent(&mixed, None));
    }

    #[test]
    fn test_expire_resolution() {
        let target = release(1, "1.0", 5);
        let next = release(2, "1.1", 6);
        let res = resolution(Some(ResolutionType::InNextRelease), &target);

        let expired = expire_resolution(&res, &next).expect("expires");
        assert_eq!(expired.release_id, 2);
        assert_eq!(expired.resolution_type, Some(ResolutionType::InRelease));
        assert_eq!(expired.status, ResolutionStatus::Resolved);
        assert_eq!(expired.release_date_added, next.date_added);
    }

    #[test]
    fn test_expire_resolution_skips() {
        let target = release(1, "1.0", 5);
        let next = release(2, "1.1", 6);
        let in_release = resolution(Some(ResolutionType::InRelease), &target);
        assert!(expire_resolution(&in_release, &next).is_none());

        let pending = resolution(Some(ResolutionType::InNextRelease), &target);
        assert!(expire_resolution(&pending, &target).is_none());
        assert!(expire_resolution(&pending, &release(3, "0.9", 1)).is_none());

        let resolved = GroupResolution {
            status: ResolutionStatus::Resolved,
            ..pending.clone()
        };
        assert!(expire_resolution(&resolved, &next).is_none());

        let unset = resolution(None, &target);
        assert!(expire_resolution(&unset, &next).is_some());
    }
}
