use std::sync::Arc;
use std::thread;

use chrono::Duration;

use super::common::*;
use crate::programs::catalog::{CatalogError, ProgramCatalog, Visibility};
use crate::programs::domain::{
    ChangeKind, ProgramDraft, ProgramId, ProgramPatch, ProgramSource, ProgramStatus, RecordError,
};
use crate::programs::eligibility::{IncomeLimits, ProgramEligibility};
use crate::programs::seed::seed_programs;
use crate::programs::store::{CatalogStore, StoreError};

#[test]
fn manual_entries_start_active_at_version_one() {
    let (catalog, store, _) = catalog();

    let record = catalog
        .create(draft("montgomery-hoc", "Montgomery HOC", montgomery_eligibility()))
        .expect("created");

    assert_eq!(record.status, ProgramStatus::Active);
    assert_eq!(record.source, ProgramSource::ManualEntry);
    assert_eq!(record.version(), 1);
    assert_eq!(record.history().len(), 1);
    assert_eq!(record.history()[0].kind, ChangeKind::Created);
    assert_eq!(record.created_at, start_time());
    assert!(record.expires_at.is_none());
    assert_eq!(store.snapshot(), vec![record]);
}

#[test]
fn create_assigns_an_id_when_absent() {
    let (catalog, _, _) = catalog();
    let mut submission = draft("ignored", "Frederick County", ProgramEligibility::default());
    submission.id = None;

    let record = catalog.create(submission).expect("created");

    assert!(!record.id.as_str().is_empty());
    assert_eq!(catalog.get(&record.id).expect("stored").name, "Frederick County");
}

#[test]
fn create_rejects_missing_fields_and_duplicates() {
    let (catalog, store, _) = catalog();

    let missing_name = ProgramDraft {
        name: "   ".to_string(),
        ..draft("p", "x", ProgramEligibility::default())
    };
    assert!(matches!(
        catalog.create(missing_name),
        Err(CatalogError::Validation(RecordError::MissingField("name")))
    ));

    let missing_eligibility = ProgramDraft {
        eligibility: None,
        ..draft("p", "Program", ProgramEligibility::default())
    };
    assert!(matches!(
        catalog.create(missing_eligibility),
        Err(CatalogError::Validation(RecordError::MissingField(
            "eligibility"
        )))
    ));

    let partial_limits = ProgramEligibility {
        income_limits: Some(IncomeLimits::from_tiers([(1, 80_000), (2, 90_000)])),
        ..ProgramEligibility::default()
    };
    assert!(matches!(
        catalog.create(draft("p", "Program", partial_limits)),
        Err(CatalogError::Validation(
            RecordError::IncompleteIncomeLimits(3)
        ))
    ));

    catalog
        .create(draft("p", "Program", ProgramEligibility::default()))
        .expect("first insert");
    assert!(matches!(
        catalog.create(draft("p", "Again", ProgramEligibility::default())),
        Err(CatalogError::Conflict(id)) if id.as_str() == "p"
    ));
    assert_eq!(store.snapshot().len(), 1);
}

#[test]
fn update_merges_patch_and_bumps_version() {
    let (catalog, _, clock) = catalog();
    let original = catalog
        .create(draft("hoc", "HOC", montgomery_eligibility()))
        .expect("created");
    clock.advance(Duration::days(2));

    let updated = catalog
        .update(
            &original.id,
            ProgramPatch {
                savings: Some("Up to $25,000".to_string()),
                ..ProgramPatch::default()
            },
        )
        .expect("updated");

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.savings, "Up to $25,000");
    assert_eq!(updated.version(), 2);
    assert_eq!(updated.history().len(), 2);
    assert_eq!(updated.history()[1].kind, ChangeKind::Updated);
    assert_eq!(updated.history()[1].details, "Manual edit (savings)");
    assert_eq!(updated.updated_at, start_time() + Duration::days(2));
    assert_eq!(updated.last_validated_at, updated.updated_at);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.source, ProgramSource::ManualEntry);
}

#[test]
fn update_reports_missing_and_empty_patches() {
    let (catalog, _, _) = catalog();

    assert!(matches!(
        catalog.update(
            &ProgramId::from("nope"),
            ProgramPatch {
                name: Some("Renamed".to_string()),
                ..ProgramPatch::default()
            }
        ),
        Err(CatalogError::NotFound(_))
    ));

    catalog
        .create(draft("hoc", "HOC", montgomery_eligibility()))
        .expect("created");
    assert!(matches!(
        catalog.update(&ProgramId::from("hoc"), ProgramPatch::default()),
        Err(CatalogError::Validation(RecordError::EmptyPatch))
    ));
}

#[test]
fn status_changes_track_expiry() {
    let (catalog, _, clock) = catalog();
    let id = catalog
        .create(draft("hoc", "HOC", montgomery_eligibility()))
        .expect("created")
        .id;

    clock.advance(Duration::hours(1));
    let outdated = catalog
        .set_status(&id, ProgramStatus::Outdated, Some("funding exhausted"))
        .expect("outdated");
    assert_eq!(outdated.status, ProgramStatus::Outdated);
    assert_eq!(outdated.expires_at, Some(start_time() + Duration::hours(1)));
    assert_eq!(outdated.version(), 2);
    let entry = outdated.history().last().expect("entry");
    assert_eq!(entry.kind, ChangeKind::StatusChange);
    assert_eq!(
        entry.details,
        "Status changed from active to outdated: funding exhausted"
    );

    let restored = catalog
        .set_status(&id, ProgramStatus::Active, None)
        .expect("restored");
    assert_eq!(restored.version(), 3);
    assert!(restored.expires_at.is_none());
}

#[test]
fn every_mutation_adds_exactly_one_version_and_history_entry() {
    let (catalog, _, _) = catalog();
    let id = catalog
        .create(draft("hoc", "HOC", montgomery_eligibility()))
        .expect("created")
        .id;

    let mut versions = vec![catalog.get(&id).expect("stored").version()];
    catalog
        .update(
            &id,
            ProgramPatch {
                description: Some("Refreshed".to_string()),
                ..ProgramPatch::default()
            },
        )
        .expect("updated");
    versions.push(catalog.get(&id).expect("stored").version());
    catalog
        .set_status(&id, ProgramStatus::PendingReview, None)
        .expect("status");
    versions.push(catalog.get(&id).expect("stored").version());
    catalog.soft_delete(&id).expect("soft delete");
    versions.push(catalog.get(&id).expect("stored").version());

    assert_eq!(versions, vec![1, 2, 3, 4]);
    let record = catalog.get(&id).expect("stored");
    assert_eq!(record.history().len(), 4);
    assert_eq!(record.history()[0].kind, ChangeKind::Created);
}

#[test]
fn soft_delete_keeps_the_record() {
    let (catalog, store, clock) = catalog();
    let id = catalog
        .create(draft("hoc", "HOC", montgomery_eligibility()))
        .expect("created")
        .id;
    clock.advance(Duration::days(1));

    let record = catalog.soft_delete(&id).expect("soft deleted");

    assert_eq!(record.status, ProgramStatus::Outdated);
    assert_eq!(record.expires_at, Some(start_time() + Duration::days(1)));
    assert_eq!(store.snapshot().len(), 1);
    assert!(catalog.list(Visibility::Active).expect("list").is_empty());
}

#[test]
fn hard_delete_removes_the_record() {
    let (catalog, store, _) = catalog();
    let id = catalog
        .create(draft("hoc", "HOC", montgomery_eligibility()))
        .expect("created")
        .id;

    catalog.hard_delete(&id).expect("hard deleted");

    assert!(store.snapshot().is_empty());
    assert!(matches!(catalog.get(&id), Err(CatalogError::NotFound(_))));
    assert!(matches!(
        catalog.hard_delete(&id),
        Err(CatalogError::NotFound(_))
    ));
}

#[test]
fn listing_respects_visibility_and_orders_by_status() {
    let (catalog, _, _) = catalog();
    for id in ["a", "b", "c"] {
        catalog
            .create(draft(id, id, ProgramEligibility::default()))
            .expect("created");
    }
    catalog
        .set_status(&ProgramId::from("a"), ProgramStatus::Outdated, None)
        .expect("status");
    catalog
        .set_status(&ProgramId::from("b"), ProgramStatus::PendingReview, None)
        .expect("status");

    let ids = |visibility| -> Vec<String> {
        catalog
            .list(visibility)
            .expect("list")
            .into_iter()
            .map(|record| record.id.0)
            .collect()
    };

    assert_eq!(ids(Visibility::Active), vec!["c"]);
    assert_eq!(ids(Visibility::IncludeOutdated), vec!["c", "a"]);
    assert_eq!(ids(Visibility::All), vec!["c", "b", "a"]);
    assert_eq!(Visibility::from_flags(false, false), Visibility::Active);
    assert_eq!(Visibility::from_flags(true, false), Visibility::IncludeOutdated);
    assert_eq!(Visibility::from_flags(false, true), Visibility::All);
}

#[test]
fn stats_count_by_status_source_and_recency() {
    let (catalog, _, clock) = catalog();
    catalog
        .create(draft("old", "Old", ProgramEligibility::default()))
        .expect("created");
    clock.advance(Duration::days(45));
    catalog
        .create(draft("fresh", "Fresh", ProgramEligibility::default()))
        .expect("created");
    catalog
        .reconcile("maryland", vec![observed("maryland-mmp", "MMP")])
        .expect("reconciled");
    catalog
        .set_status(&ProgramId::from("fresh"), ProgramStatus::Outdated, None)
        .expect("status");

    let stats = catalog.stats().expect("stats");

    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.pending_review, 1);
    assert_eq!(stats.outdated, 1);
    assert_eq!(stats.manual_entry, 2);
    assert_eq!(stats.scraped, 1);
    assert_eq!(stats.updated_last_30_days, 2);
}

#[test]
fn seeding_only_fills_an_empty_catalog() {
    let (catalog, _, _) = catalog();

    let inserted = catalog
        .seed_if_empty(seed_programs().expect("seed parses"))
        .expect("seeded");
    assert_eq!(inserted, 6);
    assert!(catalog
        .list(Visibility::Active)
        .expect("list")
        .iter()
        .all(|record| record.source == ProgramSource::ManualEntry));

    let again = catalog
        .seed_if_empty(seed_programs().expect("seed parses"))
        .expect("seeded");
    assert_eq!(again, 0);
}

#[test]
fn persistence_failures_are_not_reported_as_success() {
    let store = Arc::new(ReadOnlyStore::default());
    let catalog = ProgramCatalog::new(store.clone());

    let result = catalog.create(draft("hoc", "HOC", montgomery_eligibility()));

    assert!(matches!(
        result,
        Err(CatalogError::Store(StoreError::Unavailable(_)))
    ));
    assert!(store.load().expect("loads").is_empty());

    let unavailable = ProgramCatalog::new(Arc::new(UnavailableStore));
    assert!(matches!(
        unavailable.list(Visibility::All),
        Err(CatalogError::Store(_))
    ));
}

#[test]
fn concurrent_edits_never_lose_a_version() {
    let (catalog, _, _) = catalog();
    let id = catalog
        .create(draft("hoc", "HOC", montgomery_eligibility()))
        .expect("created")
        .id;

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let catalog = catalog.clone();
            let id = id.clone();
            thread::spawn(move || {
                catalog
                    .update(
                        &id,
                        ProgramPatch {
                            savings: Some(format!("edit {n}")),
                            ..ProgramPatch::default()
                        },
                    )
                    .expect("updated");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread joined");
    }

    let record = catalog.get(&id).expect("stored");
    assert_eq!(record.version(), 9);
    assert_eq!(record.history().len(), 9);
}
