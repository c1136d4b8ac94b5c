//! `issue_triage`: release-aware regression checks and hierarchical grouping
//! levels for tracked issues, backed by `SQLite`.
//!
//! The two decision procedures live in [`resolution`] and [`grouping`]; both
//! are pure functions over plain records plus narrow collaborator traits that
//! [`storage::SqliteStorage`] implements.

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod grouping;
pub mod logging;
pub mod model;
pub mod resolution;
pub mod storage;
pub mod util;
pub mod version;

pub use error::{ErrorCode, Result, StructuredError, TriageError};
