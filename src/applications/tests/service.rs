use std::sync::Arc;

use super::common::*;
use crate::applications::domain::ApplicationStatus;
use crate::applications::repository::{ApplicationStore, StoreError};
use crate::applications::service::{ApplicationService, ListFilter, ServiceError};
use crate::auth::Actor;
use crate::catalog::JobId;

#[test]
fn submit_initializes_pending_with_one_history_entry() {
    let (service, _store) = build_service();

    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submission accepted");

    assert_eq!(record.status, ApplicationStatus::Pending);
    assert_eq!(record.status_history.len(), 1);
    assert_eq!(record.status_history[0].status, ApplicationStatus::Pending);
    assert_eq!(record.status_history[0].changed_at, record.applied_at);
    assert_eq!(record.company_id.0, "acme");
    assert!(record.company_notes.is_empty());
}

#[test]
fn second_submission_for_same_pair_reports_duplicate_with_original() {
    let (service, store) = build_service();

    let first = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("first submission accepted");

    match service.submit(&candidate(), submit_request("job-1")) {
        Err(ServiceError::Duplicate { existing }) => {
            assert_eq!(existing.id, first.id);
            assert_eq!(existing.status_history.len(), 1);
        }
        other => panic!("expected duplicate, got {other:?}"),
    }

    let stored = store
        .list_for_company(&first.company_id)
        .expect("listing works");
    assert_eq!(stored.len(), 1, "exactly one record for the pair");
}

#[test]
fn losing_the_insert_race_surfaces_the_surviving_record() {
    let existing = sample_record("app-winner");
    let service = ApplicationService::new(
        Arc::new(RacingStore::new(existing.clone())),
        Arc::new(seeded_catalog()),
    );

    match service.submit(&candidate(), submit_request("job-1")) {
        Err(ServiceError::Duplicate { existing: found }) => assert_eq!(found.id, existing.id),
        other => panic!("expected duplicate from race, got {other:?}"),
    }
}

#[test]
fn submit_validates_posting_state() {
    let (service, _store) = build_service();

    match service.submit(&candidate(), submit_request("job-missing")) {
        Err(ServiceError::Validation(message)) => assert!(message.contains("unknown job")),
        other => panic!("expected validation error, got {other:?}"),
    }

    match service.submit(&candidate(), submit_request("job-closed")) {
        Err(ServiceError::Validation(message)) => {
            assert!(message.contains("no longer accepting"))
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn companies_cannot_submit_applications() {
    let (service, _store) = build_service();
    match service.submit(&acme(), submit_request("job-1")) {
        Err(ServiceError::Authorization) => {}
        other => panic!("expected authorization error, got {other:?}"),
    }
}

#[test]
fn history_grows_only_on_distinct_statuses() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    let record = service
        .transition_status(&record.id, ApplicationStatus::Reviewing, None, &acme())
        .expect("pending -> reviewing");
    assert_eq!(record.status_history.len(), 2);

    // Re-issuing the current status succeeds without touching history.
    let again = service
        .transition_status(&record.id, ApplicationStatus::Reviewing, None, &acme())
        .expect("idempotent re-issue");
    assert_eq!(again.status, ApplicationStatus::Reviewing);
    assert_eq!(again.status_history.len(), 2);

    let record = service
        .transition_status(&record.id, ApplicationStatus::Shortlisted, None, &acme())
        .expect("reviewing -> shortlisted");
    assert_eq!(record.status_history.len(), 3);
    assert_eq!(
        record.status_history.last().map(|change| change.status),
        Some(ApplicationStatus::Shortlisted)
    );
}

#[test]
fn pending_to_offered_is_rejected_and_leaves_record_untouched() {
    let (service, store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    match service.transition_status(&record.id, ApplicationStatus::Offered, None, &acme()) {
        Err(ServiceError::InvalidTransition { from, to }) => {
            assert_eq!(from, ApplicationStatus::Pending);
            assert_eq!(to, ApplicationStatus::Offered);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }

    let stored = store
        .fetch(&record.id)
        .expect("fetch works")
        .expect("record present");
    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert_eq!(stored.status_history.len(), 1);
}

#[test]
fn full_lifecycle_scenario_ends_in_a_locked_terminal_state() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    for status in [
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
    ] {
        service
            .transition_status(&record.id, status, None, &acme())
            .expect("forward move accepted");
    }

    let stored = service.get(&record.id, &acme()).expect("record readable");
    assert_eq!(stored.status, ApplicationStatus::Rejected);
    let history: Vec<_> = stored
        .status_history
        .iter()
        .map(|change| change.status)
        .collect();
    assert_eq!(
        history,
        vec![
            ApplicationStatus::Pending,
            ApplicationStatus::Reviewing,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Rejected,
        ]
    );

    match service.transition_status(&record.id, ApplicationStatus::Interview, None, &acme()) {
        Err(ServiceError::InvalidTransition { .. }) => {}
        other => panic!("expected invalid transition from terminal state, got {other:?}"),
    }
}

#[test]
fn transition_notes_ride_along_in_history() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    let updated = service
        .transition_status(
            &record.id,
            ApplicationStatus::Reviewing,
            Some("  screening call booked  ".to_string()),
            &acme(),
        )
        .expect("transition accepted");

    assert_eq!(
        updated.status_history.last().and_then(|c| c.note.as_deref()),
        Some("screening call booked")
    );
}

#[test]
fn only_the_owning_company_can_drive_the_forward_chain() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    match service.transition_status(
        &record.id,
        ApplicationStatus::Reviewing,
        None,
        &Actor::company("globex"),
    ) {
        Err(ServiceError::NotFound) => {}
        other => panic!("expected scoped lookup miss, got {other:?}"),
    }
}

#[test]
fn withdrawal_is_candidate_only_and_candidates_can_do_nothing_else() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    match service.transition_status(&record.id, ApplicationStatus::Withdrawn, None, &acme()) {
        Err(ServiceError::Authorization) => {}
        other => panic!("companies cannot withdraw, got {other:?}"),
    }

    match service.transition_status(&record.id, ApplicationStatus::Reviewing, None, &candidate())
    {
        Err(ServiceError::Authorization) => {}
        other => panic!("candidates cannot advance, got {other:?}"),
    }

    let withdrawn = service
        .transition_status(&record.id, ApplicationStatus::Withdrawn, None, &candidate())
        .expect("candidate withdraws own application");
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);

    match service.transition_status(&record.id, ApplicationStatus::Reviewing, None, &acme()) {
        Err(ServiceError::InvalidTransition { .. }) => {}
        other => panic!("withdrawn is terminal, got {other:?}"),
    }
}

#[test]
fn notes_are_append_only_and_validated() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    match service.append_note(&record.id, "   ", &acme()) {
        Err(ServiceError::Validation(_)) => {}
        other => panic!("expected validation error for blank note, got {other:?}"),
    }

    for body in ["strong resume", "call scheduled", "references checked"] {
        service
            .append_note(&record.id, body, &acme())
            .expect("note accepted");
    }

    let stored = service.get(&record.id, &acme()).expect("record readable");
    let bodies: Vec<_> = stored
        .company_notes
        .iter()
        .map(|note| note.body.as_str())
        .collect();
    assert_eq!(
        bodies,
        vec!["strong resume", "call scheduled", "references checked"]
    );

    match service.append_note(&record.id, "sneaky", &Actor::company("globex")) {
        Err(ServiceError::NotFound) => {}
        other => panic!("expected scoped lookup miss, got {other:?}"),
    }
    match service.append_note(&record.id, "hi", &candidate()) {
        Err(ServiceError::Authorization) => {}
        other => panic!("candidates cannot add reviewer notes, got {other:?}"),
    }
}

#[test]
fn get_is_scoped_to_both_owners() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    assert!(service.get(&record.id, &candidate()).is_ok());
    assert!(service.get(&record.id, &acme()).is_ok());
    match service.get(&record.id, &Actor::user("someone-else")) {
        Err(ServiceError::NotFound) => {}
        other => panic!("expected miss for stranger, got {other:?}"),
    }
}

#[test]
fn counts_are_recomputed_from_the_records_in_scope() {
    let (service, _store) = build_service();

    // pending:2, reviewing:1, offered:1 across two acme jobs.
    let a = service
        .submit(&Actor::user("cand-a"), submit_request("job-1"))
        .expect("submitted");
    let b = service
        .submit(&Actor::user("cand-b"), submit_request("job-1"))
        .expect("submitted");
    service
        .submit(&Actor::user("cand-c"), submit_request("job-2"))
        .expect("submitted");
    service
        .submit(&Actor::user("cand-d"), submit_request("job-2"))
        .expect("submitted");

    service
        .transition_status(&a.id, ApplicationStatus::Reviewing, None, &acme())
        .expect("a reviewing");
    service
        .transition_status(&b.id, ApplicationStatus::Reviewing, None, &acme())
        .expect("b reviewing");
    service
        .transition_status(&b.id, ApplicationStatus::Offered, None, &acme())
        .expect("b offered");

    let counts = service.status_counts(&acme(), None).expect("company scope");
    assert_eq!(counts.counts[&ApplicationStatus::Pending], 2);
    assert_eq!(counts.counts[&ApplicationStatus::Reviewing], 1);
    assert_eq!(counts.counts[&ApplicationStatus::Offered], 1);
    assert_eq!(counts.counts[&ApplicationStatus::Rejected], 0);
    assert_eq!(counts.counts.values().sum::<u64>(), counts.total);
    assert_eq!(counts.total, 4);

    let job_counts = service
        .status_counts(&acme(), Some(JobId("job-1".to_string())))
        .expect("job scope");
    assert_eq!(job_counts.total, 2);
    assert_eq!(job_counts.counts[&ApplicationStatus::Pending], 1);

    match service.status_counts(&Actor::company("globex"), Some(JobId("job-1".to_string()))) {
        Err(ServiceError::NotFound) => {}
        other => panic!("foreign job scope must miss, got {other:?}"),
    }
    match service.status_counts(&candidate(), None) {
        Err(ServiceError::Authorization) => {}
        other => panic!("counts are company-only, got {other:?}"),
    }
}

#[test]
fn listing_pages_newest_first_with_status_filter() {
    let (service, _store) = build_service();

    for index in 0..5 {
        service
            .submit(&Actor::user(format!("cand-{index}")), submit_request("job-1"))
            .expect("submitted");
    }
    let extra = service
        .submit(&Actor::user("cand-extra"), submit_request("job-2"))
        .expect("submitted");
    service
        .transition_status(&extra.id, ApplicationStatus::Reviewing, None, &acme())
        .expect("reviewing");

    let page = service
        .list_for_company(
            &acme(),
            ListFilter {
                status: None,
                page: Some(1),
                limit: Some(4),
            },
        )
        .expect("listing works");
    assert_eq!(page.total, 6);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 4);
    // Most recent submission first.
    assert_eq!(page.items[0].id, extra.id);

    let rest = service
        .list_for_company(
            &acme(),
            ListFilter {
                status: None,
                page: Some(2),
                limit: Some(4),
            },
        )
        .expect("second page");
    assert_eq!(rest.items.len(), 2);

    let reviewing = service
        .list_for_company(
            &acme(),
            ListFilter {
                status: Some(ApplicationStatus::Reviewing),
                page: None,
                limit: None,
            },
        )
        .expect("filtered listing");
    assert_eq!(reviewing.total, 1);
    assert_eq!(reviewing.items[0].id, extra.id);
}

#[test]
fn listing_clamps_limits_and_defaults_sensibly() {
    let (service, _store) = build_service();

    for index in 0..12 {
        service
            .submit(&Actor::user(format!("cand-{index}")), submit_request("job-1"))
            .expect("submitted");
    }

    // Defaults: page 1, limit 10.
    let page = service
        .list_for_company(&acme(), ListFilter::default())
        .expect("default listing");
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 10);
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.total, 12);
    assert_eq!(page.total_pages, 2);

    // Oversized limits clamp to the cap; zero bumps to one.
    let capped = service
        .list_for_company(
            &acme(),
            ListFilter {
                status: None,
                page: None,
                limit: Some(5_000),
            },
        )
        .expect("capped listing");
    assert_eq!(capped.limit, 100);
    assert_eq!(capped.items.len(), 12);

    let floor = service
        .list_for_company(
            &acme(),
            ListFilter {
                status: None,
                page: Some(0),
                limit: Some(0),
            },
        )
        .expect("floored listing");
    assert_eq!(floor.page, 1);
    assert_eq!(floor.limit, 1);
    assert_eq!(floor.items.len(), 1);
}

#[test]
fn out_of_range_pages_yield_an_empty_page_without_panicking() {
    let (service, _store) = build_service();
    service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");

    let page = service
        .list_for_company(
            &acme(),
            ListFilter {
                status: None,
                page: Some(u64::MAX),
                limit: Some(100),
            },
        )
        .expect("huge page number is harmless");
    assert!(page.items.is_empty());
    assert_eq!(page.total, 1);
    assert_eq!(page.page, u64::MAX);
}

#[test]
fn withdrawn_applications_still_block_resubmission() {
    let (service, _store) = build_service();
    let record = service
        .submit(&candidate(), submit_request("job-1"))
        .expect("submitted");
    service
        .transition_status(&record.id, ApplicationStatus::Withdrawn, None, &candidate())
        .expect("candidate withdraws");

    match service.submit(&candidate(), submit_request("job-1")) {
        Err(ServiceError::Duplicate { existing }) => {
            assert_eq!(existing.id, record.id);
            assert_eq!(existing.status, ApplicationStatus::Withdrawn);
        }
        other => panic!("withdrawn pair must stay claimed, got {other:?}"),
    }
}

#[test]
fn store_failures_propagate_as_store_errors() {
    let service = ApplicationService::new(Arc::new(UnavailableStore), Arc::new(seeded_catalog()));
    match service.submit(&candidate(), submit_request("job-1")) {
        Err(ServiceError::Store(StoreError::Unavailable(_))) => {}
        other => panic!("expected store error, got {other:?}"),
    }
}
