//! Error types and handling for `issue_triage`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for wrapped errors
//! - Grouping-level failures carry the status/detail pair a web layer returns
//! - Provides structured JSON output for scripted callers

mod context;
mod structured;

pub use context::{OptionExt, ResultExt};
pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `issue_triage` operations.
#[derive(Error, Debug)]
pub enum TriageError {
    // === Storage Errors ===
    /// Database file not found at the specified path.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Lookup Errors ===
    /// Group with the specified ID was not found.
    #[error("Group not found: {id}")]
    GroupNotFound { id: i64 },

    /// Release with the specified ID or version was not found.
    #[error("Release not found: {reference}")]
    ReleaseNotFound { reference: String },

    /// A release with this version already exists in the organization.
    #[error("Release already exists: {version}")]
    DuplicateRelease { version: String },

    // === Resolution Errors ===
    /// A stored resolution type is neither `in_release`, `in_next_release` nor unset.
    #[error("Invalid resolution type: {value}")]
    InvalidResolutionType { value: i64 },

    // === Grouping Level Errors ===
    /// The group has no events at all.
    #[error("This issue has no events.")]
    NoEvents,

    /// The group still spans more than one primary hash.
    #[error(
        "The issue can only contain one fingerprint. It needs to be fully unmerged before grouping levels can be shown."
    )]
    MergedIssues,

    /// The group's events carry no hierarchical hashes.
    #[error("This issue does not have hierarchical grouping.")]
    NotHierarchical,

    /// None of the group's hierarchical hashes is materialized.
    #[error("No hierarchical hash of group {group_id} is materialized")]
    NoMaterializedHash { group_id: i64 },

    /// Required feature flag is not enabled for the organization.
    #[error("This project does not have the grouping tree feature.")]
    MissingFeature { feature: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace not initialized.
    #[error("Triage workspace not initialized: run 'tri init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors ===
    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TriageError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseNotFound { .. }
                | Self::NotInitialized
                | Self::GroupNotFound { .. }
                | Self::ReleaseNotFound { .. }
                | Self::Validation { .. }
                | Self::MergedIssues
                | Self::MissingFeature { .. }
        )
    }

    /// Is this one of the user-facing grouping-level failures?
    #[must_use]
    pub const fn is_grouping_failure(&self) -> bool {
        matches!(
            self,
            Self::NoEvents | Self::MergedIssues | Self::NotHierarchical | Self::MissingFeature { .. }
        )
    }

    /// HTTP status a web layer should answer with for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        if self.is_grouping_failure() {
            return 403;
        }
        match self {
            Self::GroupNotFound { .. } | Self::ReleaseNotFound { .. } => 404,
            Self::DuplicateRelease { .. } => 409,
            Self::Validation { .. } => 400,
            _ => 500,
        }
    }

    /// Stable short code used in API responses (`detail.code`).
    #[must_use]
    pub const fn api_code(&self) -> Option<&'static str> {
        match self {
            Self::NoEvents => Some("no_events"),
            Self::MergedIssues => Some("merged_issues"),
            Self::NotHierarchical => Some("not_hierarchical"),
            Self::MissingFeature { .. } => Some("missing_feature"),
            _ => None,
        }
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: tri init"),
            Self::DatabaseNotFound { .. } => Some("Check path or run: tri init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::MergedIssues => Some("Unmerge the issue until it holds a single fingerprint"),
            Self::MissingFeature { .. } => {
                Some("Run: tri feature enable organizations:grouping-tree-ui")
            }
            Self::GroupNotFound { .. } => Some("Run 'tri group show <id>' to check the group"),
            Self::ReleaseNotFound { .. } => Some("Run 'tri release list' to see known releases"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using `TriageError`.
pub type Result<T> = std::result::Result<T, TriageError>;
