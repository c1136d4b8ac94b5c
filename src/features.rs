//! Feature flag resolution.
//!
//! A feature is on for an organization when it is listed in the
//! `features.enabled` config or stored in the database for that organization
//! (or for all organizations).

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::{ConfigLayer, enabled_features_from_layer};
use crate::error::Result;
use crate::grouping::FeatureFlags;

/// Config-level flags layered over a stored flag source.
pub struct FeatureSet<'a> {
    global: BTreeSet<String>,
    stored: &'a dyn FeatureFlags,
}

impl<'a> FeatureSet<'a> {
    #[must_use]
    pub const fn new(global: BTreeSet<String>, stored: &'a dyn FeatureFlags) -> Self {
        Self { global, stored }
    }

    #[must_use]
    pub fn from_config(config: &ConfigLayer, stored: &'a dyn FeatureFlags) -> Self {
        Self::new(enabled_features_from_layer(config), stored)
    }

    /// Features switched on through configuration.
    #[must_use]
    pub const fn global(&self) -> &BTreeSet<String> {
        &self.global
    }
}

impl FeatureFlags for FeatureSet<'_> {
    fn has_feature(
        &self,
        feature: &str,
        organization_id: i64,
        actor: Option<&str>,
    ) -> Result<bool> {
        if self.global.contains(feature) {
            debug!(feature, "Feature enabled by config");
            return Ok(true);
        }
        self.stored.has_feature(feature, organization_id, actor)
    }
}
