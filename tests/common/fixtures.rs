#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use issue_triage::model::{
    Group, GroupResolution, Release, ResolutionStatus, ResolutionType,
};
use issue_triage::storage::{NewEvent, SqliteStorage};

pub const ORG: i64 = 1;
pub const PROJECT: i64 = 10;

/// Fixed base time so release ordering is deterministic.
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_735_689_600, 0).unwrap() // 2025-01-01 00:00:00 UTC
}

pub fn day(n: i64) -> DateTime<Utc> {
    base_time() + Duration::days(n)
}

/// Create releases in order, one day apart, starting at day 0.
pub fn releases(storage: &mut SqliteStorage, versions: &[&str]) -> Vec<Release> {
    versions
        .iter()
        .enumerate()
        .map(|(i, version)| {
            let offset = i64::try_from(i).unwrap();
            storage
                .create_release(ORG, PROJECT, version, day(offset))
                .expect("create release")
        })
        .collect()
}

pub fn group(storage: &mut SqliteStorage, title: &str) -> Group {
    storage
        .create_group(ORG, PROJECT, title, base_time())
        .expect("create group")
}

pub struct ResolutionBuilder {
    resolution: GroupResolution,
}

impl ResolutionBuilder {
    pub fn new(group: &Group, release: &Release) -> Self {
        Self {
            resolution: GroupResolution {
                group_id: group.id,
                release_id: release.id,
                release_date_added: release.date_added,
                current_release_version: None,
                resolution_type: Some(ResolutionType::InRelease),
                status: ResolutionStatus::Resolved,
                actor_id: None,
                datetime: base_time(),
            },
        }
    }

    pub fn in_next_release(mut self) -> Self {
        self.resolution.resolution_type = Some(ResolutionType::InNextRelease);
        self.resolution.status = ResolutionStatus::Pending;
        self
    }

    pub fn unset(mut self) -> Self {
        self.resolution.resolution_type = None;
        self.resolution.status = ResolutionStatus::Pending;
        self
    }

    pub fn with_snapshot(mut self, version: &str) -> Self {
        self.resolution.current_release_version = Some(version.to_string());
        self
    }

    pub fn build(self) -> GroupResolution {
        self.resolution
    }

    pub fn store(self, storage: &mut SqliteStorage) -> GroupResolution {
        storage
            .set_resolution(&self.resolution)
            .expect("store resolution");
        self.resolution
    }
}

pub fn event(primary: &str, hashes: &[&str]) -> NewEvent {
    NewEvent {
        primary_hash: primary.to_string(),
        hierarchical_hashes: hashes.iter().map(|h| (*h).to_string()).collect(),
        timestamp: base_time(),
    }
}
