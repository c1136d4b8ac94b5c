//! Hierarchical grouping levels of a group.
//!
//! A group's events carry an ordered list of hierarchical hashes, most
//! granular first. The hashes stored for the group (materialized hashes)
//! tell which of those levels the server currently groups by.

use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::error::{Result, TriageError};
use crate::model::{Group, GroupingLevel, HierarchicalHashRow, LevelsOverview, LevelsResponse};

/// Feature that gates the grouping levels listing.
pub const GROUPING_TREE_FEATURE: &str = "organizations:grouping-tree-ui";

/// Aggregates a group's events by primary hash.
pub trait EventAggregator {
    /// One row per primary hash seen in the group's events, each carrying the
    /// longest hierarchical hash list among those events.
    ///
    /// # Errors
    ///
    /// Returns an error if the event query fails.
    fn hierarchical_hash_rows(&self, group: &Group) -> Result<Vec<HierarchicalHashRow>>;
}

/// Hashes currently materialized for a group.
pub trait GroupHashStore {
    /// # Errors
    ///
    /// Returns an error if the hash query fails.
    fn materialized_hashes(&self, group: &Group) -> Result<HashSet<String>>;
}

/// Capability check for organization-level features.
pub trait FeatureFlags {
    /// # Errors
    ///
    /// Returns an error if the flag source cannot be read.
    fn has_feature(
        &self,
        feature: &str,
        organization_id: i64,
        actor: Option<&str>,
    ) -> Result<bool>;
}

/// Fail with `MissingFeature` unless the grouping tree feature is enabled.
///
/// # Errors
///
/// Returns `MissingFeature` when the flag is off, or the flag source error.
pub fn check_feature(
    flags: &dyn FeatureFlags,
    organization_id: i64,
    actor: Option<&str>,
) -> Result<()> {
    if flags.has_feature(GROUPING_TREE_FEATURE, organization_id, actor)? {
        Ok(())
    } else {
        Err(TriageError::MissingFeature {
            feature: GROUPING_TREE_FEATURE.to_string(),
        })
    }
}

/// Work out the current level from the aggregation rows and the
/// materialized hashes.
///
/// # Errors
///
/// - `NoEvents` if there are no rows
/// - `MergedIssues` if there is more than one row
/// - `NotHierarchical` if the row has no hierarchical hashes
/// - `NoMaterializedHash` if none of the hashes is materialized
pub fn compute_overview(
    group_id: i64,
    rows: &[HierarchicalHashRow],
    materialized: &HashSet<String>,
) -> Result<LevelsOverview> {
    let row = match rows {
        [] => return Err(TriageError::NoEvents),
        [row] => row,
        _ => return Err(TriageError::MergedIssues),
    };

    let hashes = &row.longest_hierarchical_hashes;
    if hashes.is_empty() {
        return Err(TriageError::NotHierarchical);
    }

    let current_level = hashes
        .iter()
        .rposition(|hash| materialized.contains(hash))
        .ok_or(TriageError::NoMaterializedHash { group_id })?;

    Ok(LevelsOverview {
        current_level,
        current_hash: hashes[current_level].clone(),
        parent_hashes: hashes[..current_level].to_vec(),
        only_primary_hash: row.primary_hash.clone(),
        num_levels: hashes.len(),
    })
}

/// Fetch a group's rows and materialized hashes, then compute its overview.
///
/// # Errors
///
/// Propagates every error of [`compute_overview`] and of the stores.
#[instrument(skip_all, fields(group_id = group.id))]
pub fn levels_overview(
    group: &Group,
    events: &dyn EventAggregator,
    hashes: &dyn GroupHashStore,
) -> Result<LevelsOverview> {
    let rows = events.hierarchical_hash_rows(group)?;
    debug!(rows = rows.len(), "Aggregated hierarchical hashes");

    // Short-circuit before touching the hash store.
    if rows.len() != 1 {
        return compute_overview(group.id, &rows, &HashSet::new());
    }

    let materialized = hashes.materialized_hashes(group)?;
    compute_overview(group.id, &rows, &materialized)
}

/// Build the level listing for an overview.
#[must_use]
pub fn build_levels(overview: &LevelsOverview) -> LevelsResponse {
    let levels = (0..overview.num_levels)
        .map(|level| GroupingLevel {
            id: level.to_string(),
            is_current: (level == overview.current_level).then_some(true),
        })
        .collect();
    LevelsResponse { levels }
}

/// Turn an overview result into the level listing.
///
/// A group without events yields an empty listing; every other failure
/// propagates.
///
/// # Errors
///
/// Returns any error from `overview` other than `NoEvents`.
pub fn list_levels(overview: Result<LevelsOverview>) -> Result<LevelsResponse> {
    match overview {
        Ok(overview) => Ok(build_levels(&overview)),
        Err(TriageError::NoEvents) => Ok(LevelsResponse::default()),
        Err(err) => Err(err),
    }
}

/// List the grouping levels of a group after checking the feature flag.
///
/// # Errors
///
/// Returns `MissingFeature`, `MergedIssues`, `NotHierarchical` or a store error.
pub fn list_group_levels(
    group: &Group,
    flags: &dyn FeatureFlags,
    actor: Option<&str>,
    events: &dyn EventAggregator,
    hashes: &dyn GroupHashStore,
) -> Result<LevelsResponse> {
    check_feature(flags, group.organization_id, actor)?;
    list_levels(levels_overview(group, events, hashes))
}
