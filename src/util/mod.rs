//! Shared utilities for `issue_triage`.
//!
//! - Grouping hash derivation (SHA256)
//! - Timestamp parsing for command-line input

mod hash;
pub mod time;

pub use hash::{HASH_LENGTH, grouping_hash, hierarchical_hashes, is_valid_hash, validate_hash};
