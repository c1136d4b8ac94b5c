//! Persistence layer.
//!
//! `SqliteStorage` backs every collaborator trait the decision procedures
//! consume: release lookups, stored resolutions, event aggregation,
//! materialized hashes and feature flags.

pub mod schema;
mod sqlite;

pub use sqlite::{NewEvent, SqliteStorage};
