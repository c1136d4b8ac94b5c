//! Grouping levels computed from events and hashes stored in `SQLite`.

mod common;

use common::fixtures::{self, event};
use common::test_db;
use issue_triage::TriageError;
use issue_triage::features::FeatureSet;
use issue_triage::grouping::{
    GROUPING_TREE_FEATURE, levels_overview, list_group_levels, list_levels,
};
use issue_triage::util::hierarchical_hashes;
use std::collections::BTreeSet;

#[test]
fn overview_tracks_most_coarse_materialized_level() {
    let _log = common::test_log("overview_tracks_most_coarse_materialized_level");
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "ValueError");

    storage
        .record_event(&group, &event("p", &["a", "b", "c"]))
        .unwrap();
    // The first event materializes level 0; grouping moved up to level 2.
    storage.add_group_hash(&group, "c").unwrap();

    let overview = levels_overview(&group, &storage, &storage).unwrap();
    assert_eq!(overview.current_level, 2);
    assert_eq!(overview.current_hash, "c");
    assert_eq!(overview.parent_hashes, vec!["a", "b"]);
    assert_eq!(overview.only_primary_hash, "p");
    assert_eq!(overview.num_levels, 3);
}

#[test]
fn shorter_events_do_not_hide_deeper_levels() {
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "KeyError");

    storage.record_event(&group, &event("p", &["a"])).unwrap();
    storage
        .record_event(&group, &event("p", &["a", "b", "c", "d"]))
        .unwrap();
    storage.record_event(&group, &event("p", &["a", "b"])).unwrap();

    let overview = levels_overview(&group, &storage, &storage).unwrap();
    assert_eq!(overview.num_levels, 4);
    assert_eq!(overview.current_level, 0);
}

#[test]
fn group_without_events_lists_no_levels() {
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "Empty");

    let overview = levels_overview(&group, &storage, &storage);
    assert!(matches!(overview, Err(TriageError::NoEvents)));

    let response = list_levels(levels_overview(&group, &storage, &storage)).unwrap();
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"levels":[]}"#
    );
}

#[test]
fn merged_groups_are_rejected() {
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "Merged");
    storage.record_event(&group, &event("p1", &["a"])).unwrap();
    storage.record_event(&group, &event("p2", &["b"])).unwrap();

    let err = levels_overview(&group, &storage, &storage).unwrap_err();
    assert!(matches!(err, TriageError::MergedIssues));
    assert_eq!(err.http_status(), 403);
}

#[test]
fn non_hierarchical_events_are_rejected() {
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "Flat");
    storage.record_event(&group, &event("p", &[])).unwrap();

    let err = levels_overview(&group, &storage, &storage).unwrap_err();
    assert!(matches!(err, TriageError::NotHierarchical));
}

#[test]
fn unmaterialized_chain_is_reported() {
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "Orphan");
    storage.record_event(&group, &event("p", &["a", "b"])).unwrap();
    storage.remove_group_hash(&group, "a").unwrap();

    let err = levels_overview(&group, &storage, &storage).unwrap_err();
    assert!(matches!(err, TriageError::NoMaterializedHash { .. }));
}

#[test]
fn list_group_levels_respects_feature_scopes() {
    let _log = common::test_log("list_group_levels_respects_feature_scopes");
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "Gated");
    let frames = ["main", "handler", "parse"];
    let hashes = hierarchical_hashes(&frames);
    storage
        .record_event(
            &group,
            &issue_triage::storage::NewEvent {
                primary_hash: hashes[0].clone(),
                hierarchical_hashes: hashes.clone(),
                timestamp: fixtures::base_time(),
            },
        )
        .unwrap();
    storage.add_group_hash(&group, &hashes[1]).unwrap();

    {
        let flags = FeatureSet::new(BTreeSet::new(), &storage);
        let err = list_group_levels(&group, &flags, None, &storage, &storage).unwrap_err();
        assert!(matches!(err, TriageError::MissingFeature { .. }));
    }

    storage
        .enable_feature(GROUPING_TREE_FEATURE, Some(fixtures::ORG))
        .unwrap();
    let flags = FeatureSet::new(BTreeSet::new(), &storage);
    let response = list_group_levels(&group, &flags, None, &storage, &storage).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"levels": [{"id": "0"}, {"id": "1", "isCurrent": true}, {"id": "2"}]})
    );
}

#[test]
fn config_feature_enables_every_organization() {
    let mut storage = test_db();
    let group = fixtures::group(&mut storage, "Configured");
    storage.record_event(&group, &event("p", &["a"])).unwrap();

    let flags = FeatureSet::new(BTreeSet::from([GROUPING_TREE_FEATURE.to_string()]), &storage);
    let response = list_group_levels(&group, &flags, Some("alice"), &storage, &storage).unwrap();
    assert_eq!(response.levels.len(), 1);
    assert_eq!(response.levels[0].is_current, Some(true));
}

#[test]
fn shared_fingerprint_is_not_recorded_for_second_group() {
    let _log = common::test_log("shared_fingerprint_is_not_recorded_for_second_group");
    let mut storage = test_db();
    let first = fixtures::group(&mut storage, "Original");
    let second = fixtures::group(&mut storage, "Copy");

    storage.record_event(&first, &event("p", &["a", "b"])).unwrap();
    let err = storage
        .record_event(&second, &event("p", &["a", "b"]))
        .unwrap_err();
    assert!(matches!(err, TriageError::Validation { .. }));

    // The second group stays event-free instead of losing its hash.
    let overview = levels_overview(&second, &storage, &storage);
    assert!(matches!(overview, Err(TriageError::NoEvents)));
    assert_eq!(
        levels_overview(&first, &storage, &storage).unwrap().current_hash,
        "a"
    );
}
