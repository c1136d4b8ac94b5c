//! Core data types for `issue_triage`.
//!
//! This module defines the plain records the decision procedures operate on:
//! - `Release` - A versioned release of a project
//! - `Group` - An issue (a group of events sharing a fingerprint)
//! - `GroupResolution` - How and against which release a group was resolved
//! - `Event` / `HierarchicalHashRow` - Event grouping data
//! - `LevelsOverview` / `LevelsResponse` - Grouping level results

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TriageError;

/// How a group was resolved.
///
/// An unset type is represented as `Option::None` on the resolution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    /// Resolved in a specific, already existing release.
    InRelease,
    /// Resolved in whatever release comes after the current one.
    InNextRelease,
}

impl ResolutionType {
    /// Integer code used in the `group_resolutions.type` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::InRelease => 0,
            Self::InNextRelease => 1,
        }
    }

    /// Decode a stored type column.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolutionType` for any code other than 0 or 1.
    pub fn from_code(code: i64) -> Result<Self, TriageError> {
        match code {
            0 => Ok(Self::InRelease),
            1 => Ok(Self::InNextRelease),
            value => Err(TriageError::InvalidResolutionType { value }),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InRelease => "in_release",
            Self::InNextRelease => "in_next_release",
        }
    }
}

impl fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionType {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "in_release" | "release" => Ok(Self::InRelease),
            "in_next_release" | "next_release" | "next" => Ok(Self::InNextRelease),
            other => Err(TriageError::validation(
                "type",
                format!("unknown resolution type '{other}' (use in_release or in_next_release)"),
            )),
        }
    }
}

/// Whether a resolution has taken effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    #[default]
    Pending,
    Resolved,
}

impl ResolutionStatus {
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Pending => 0,
            Self::Resolved => 1,
        }
    }

    /// Decode a stored status column. Unknown codes read as pending.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Resolved,
            _ => Self::Pending,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A release of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Release {
    pub id: i64,
    pub organization_id: i64,
    pub project_id: i64,
    pub version: String,
    pub date_added: DateTime<Utc>,
}

/// An issue: a group of events sharing a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Group {
    pub id: i64,
    pub organization_id: i64,
    pub project_id: i64,
    pub title: String,
    pub first_seen: DateTime<Utc>,
}

/// Describes when and against which release a group was marked as resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupResolution {
    pub group_id: i64,
    /// The release the group was resolved against.
    pub release_id: i64,
    /// `date_added` of that release.
    pub release_date_added: DateTime<Utc>,
    /// Latest release version of the group when "resolve in next release" was chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_release_version: Option<String>,
    #[serde(rename = "type")]
    pub resolution_type: Option<ResolutionType>,
    pub status: ResolutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<i64>,
    pub datetime: DateTime<Utc>,
}

/// A stored event with its grouping hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    pub id: i64,
    pub project_id: i64,
    pub group_id: i64,
    pub primary_hash: String,
    /// Most granular first.
    pub hierarchical_hashes: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// One row of the per-group event aggregation, grouped by primary hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HierarchicalHashRow {
    pub primary_hash: String,
    /// Longest hierarchical hash list observed among events with this primary hash.
    pub longest_hierarchical_hashes: Vec<String>,
}

/// Where a group currently sits in its hierarchical grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LevelsOverview {
    pub current_level: usize,
    pub current_hash: String,
    pub parent_hashes: Vec<String>,
    pub only_primary_hash: String,
    pub num_levels: usize,
}

/// A selectable grouping level.
///
/// `id` is opaque to callers even though it currently encodes an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupingLevel {
    pub id: String,
    #[serde(rename = "isCurrent", skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
}

/// Response body listing the grouping levels of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LevelsResponse {
    pub levels: Vec<GroupingLevel>,
}
