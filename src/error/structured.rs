//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::TriageError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    DatabaseNotFound,
    DatabaseError,
    NotInitialized,
    AlreadyInitialized,

    // === Lookup Errors (exit code 3) ===
    GroupNotFound,
    ReleaseNotFound,
    DuplicateRelease,

    // === Validation Errors (exit code 4) ===
    ValidationFailed,
    InvalidResolutionType,

    // === Grouping Errors (exit code 5) ===
    NoEvents,
    MergedIssues,
    NotHierarchical,
    NoMaterializedHash,
    MissingFeature,

    // === Config Errors (exit code 7) ===
    ConfigError,

    // === I/O Errors (exit code 8) ===
    IoError,
    JsonError,
    YamlError,

    // === Internal Errors (exit code 1) ===
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::ReleaseNotFound => "RELEASE_NOT_FOUND",
            Self::DuplicateRelease => "DUPLICATE_RELEASE",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidResolutionType => "INVALID_RESOLUTION_TYPE",
            Self::NoEvents => "NO_EVENTS",
            Self::MergedIssues => "MERGED_ISSUES",
            Self::NotHierarchical => "NOT_HIERARCHICAL",
            Self::NoMaterializedHash => "NO_MATERIALIZED_HASH",
            Self::MissingFeature => "MISSING_FEATURE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ValidationFailed | Self::MissingFeature)
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database errors
    /// - 3: Lookup errors
    /// - 4: Validation errors
    /// - 5: Grouping errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseNotFound
            | Self::DatabaseError
            | Self::NotInitialized
            | Self::AlreadyInitialized => 2,
            Self::GroupNotFound | Self::ReleaseNotFound | Self::DuplicateRelease => 3,
            Self::ValidationFailed | Self::InvalidResolutionType => 4,
            Self::NoEvents
            | Self::MergedIssues
            | Self::NotHierarchical
            | Self::NoMaterializedHash
            | Self::MissingFeature => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// HTTP status a web layer would answer with
    pub status: u16,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `TriageError`.
    #[must_use]
    pub fn from_error(err: &TriageError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = err.suggestion().map(str::to_string);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            status: err.http_status(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "status": self.status,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &TriageError) -> (ErrorCode, Option<Value>) {
        match err {
            TriageError::DatabaseNotFound { path } => (
                ErrorCode::DatabaseNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            TriageError::Database(_) => (ErrorCode::DatabaseError, None),
            TriageError::NotInitialized => (ErrorCode::NotInitialized, None),
            TriageError::AlreadyInitialized { path } => (
                ErrorCode::AlreadyInitialized,
                Some(json!({"path": path.display().to_string()})),
            ),
            TriageError::GroupNotFound { id } => {
                (ErrorCode::GroupNotFound, Some(json!({"group_id": id})))
            }
            TriageError::ReleaseNotFound { reference } => (
                ErrorCode::ReleaseNotFound,
                Some(json!({"release": reference})),
            ),
            TriageError::DuplicateRelease { version } => (
                ErrorCode::DuplicateRelease,
                Some(json!({"version": version})),
            ),
            TriageError::InvalidResolutionType { value } => (
                ErrorCode::InvalidResolutionType,
                Some(json!({"value": value})),
            ),
            TriageError::NoEvents => (ErrorCode::NoEvents, Some(json!({"code": "no_events"}))),
            TriageError::MergedIssues => (
                ErrorCode::MergedIssues,
                Some(json!({"code": "merged_issues"})),
            ),
            TriageError::NotHierarchical => (
                ErrorCode::NotHierarchical,
                Some(json!({"code": "not_hierarchical"})),
            ),
            TriageError::NoMaterializedHash { group_id } => (
                ErrorCode::NoMaterializedHash,
                Some(json!({"group_id": group_id})),
            ),
            TriageError::MissingFeature { feature } => (
                ErrorCode::MissingFeature,
                Some(json!({"code": "missing_feature", "feature": feature})),
            ),
            TriageError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            TriageError::Config(_) => (ErrorCode::ConfigError, None),
            TriageError::Io(_) => (ErrorCode::IoError, None),
            TriageError::Json(_) => (ErrorCode::JsonError, None),
            TriageError::Yaml(_) => (ErrorCode::YamlError, None),
            TriageError::WithContext { context, .. } => {
                (ErrorCode::InternalError, Some(json!({"context": context})))
            }
            TriageError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
