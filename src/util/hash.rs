//! Grouping hash derivation.
//!
//! Uses SHA256 over fingerprint components with null separators, truncated
//! to 32 lowercase hex characters.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{Result, TriageError};

/// Length of a grouping hash in hex characters.
pub const HASH_LENGTH: usize = 32;

static HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{32}$").expect("hash regex compiles"));

/// Hash a list of fingerprint components.
#[must_use]
pub fn grouping_hash<S: AsRef<str>>(components: &[S]) -> String {
    let mut hasher = Sha256::new();

    for component in components {
        let value = component.as_ref();
        if value.contains('\0') {
            hasher.update(value.replace('\0', " ").as_bytes());
        } else {
            hasher.update(value.as_bytes());
        }
        hasher.update(b"\x00");
    }

    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(HASH_LENGTH);
    hex
}

/// Derive the hierarchical hash chain for fingerprint components.
///
/// Level `i` hashes components `0..=i`, so the chain has one entry per
/// component.
#[must_use]
pub fn hierarchical_hashes<S: AsRef<str>>(components: &[S]) -> Vec<String> {
    (1..=components.len())
        .map(|end| grouping_hash(&components[..end]))
        .collect()
}

/// Is this a well-formed grouping hash?
#[must_use]
pub fn is_valid_hash(hash: &str) -> bool {
    HASH_RE.is_match(hash)
}

/// Normalize and check a user-supplied hash.
///
/// # Errors
///
/// Returns a validation error if the hash is not 32 hex characters.
pub fn validate_hash(field: &str, hash: &str) -> Result<String> {
    let normalized = hash.trim().to_ascii_lowercase();
    if is_valid_hash(&normalized) {
        Ok(normalized)
    } else {
        Err(TriageError::validation(
            field,
            format!("'{hash}' is not a {HASH_LENGTH}-character hex hash"),
        ))
    }
}
