use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::applications::domain::{
    ApplicationId, ApplicationStatus, CandidateId, CompanyNote, StatusChange, SubmissionProfile,
};
use crate::applications::repository::{ApplicationRecord, ApplicationStore, StoreError};
use crate::applications::service::{ApplicationService, SubmitRequest};
use crate::auth::Actor;
use crate::catalog::{CompanyId, JobId, JobPosting};
use crate::storage::{MemoryApplicationStore, MemoryJobCatalog};

pub(super) fn candidate() -> Actor {
    Actor::user("cand-1")
}

pub(super) fn acme() -> Actor {
    Actor::company("acme")
}

pub(super) fn seeded_catalog() -> MemoryJobCatalog {
    MemoryJobCatalog::with_postings([
        JobPosting {
            id: JobId("job-1".to_string()),
            company_id: CompanyId("acme".to_string()),
            title: "Backend Engineer".to_string(),
            active: true,
        },
        JobPosting {
            id: JobId("job-2".to_string()),
            company_id: CompanyId("acme".to_string()),
            title: "Data Analyst".to_string(),
            active: true,
        },
        JobPosting {
            id: JobId("job-closed".to_string()),
            company_id: CompanyId("acme".to_string()),
            title: "Filled Role".to_string(),
            active: false,
        },
        JobPosting {
            id: JobId("job-other".to_string()),
            company_id: CompanyId("globex".to_string()),
            title: "Designer".to_string(),
            active: true,
        },
    ])
}

pub(super) fn build_service() -> (
    ApplicationService<MemoryApplicationStore, MemoryJobCatalog>,
    Arc<MemoryApplicationStore>,
) {
    let store = Arc::new(MemoryApplicationStore::default());
    let service = ApplicationService::new(store.clone(), Arc::new(seeded_catalog()));
    (service, store)
}

pub(super) fn submit_request(job: &str) -> SubmitRequest {
    SubmitRequest {
        job_id: JobId(job.to_string()),
        profile: SubmissionProfile {
            resume_key: Some("resumes/cand-1.pdf".to_string()),
            cover_letter: Some("Hello!".to_string()),
            skills: vec!["rust".to_string(), "sql".to_string()],
            expected_salary: Some(95_000),
            experience_level: Some("mid".to_string()),
            available_from: None,
        },
    }
}

pub(super) fn sample_record(id: &str) -> ApplicationRecord {
    let now = chrono::Utc::now();
    ApplicationRecord {
        id: ApplicationId(id.to_string()),
        candidate_id: CandidateId("cand-1".to_string()),
        job_id: JobId("job-1".to_string()),
        company_id: CompanyId("acme".to_string()),
        status: ApplicationStatus::Pending,
        applied_at: now,
        status_history: vec![StatusChange {
            status: ApplicationStatus::Pending,
            changed_at: now,
            note: None,
        }],
        company_notes: Vec::new(),
        profile: SubmissionProfile::default(),
    }
}

/// Store double that is permanently offline.
pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find_by_pair(
        &self,
        _candidate: &CandidateId,
        _job: &JobId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn apply_status(
        &self,
        _id: &ApplicationId,
        _expected: ApplicationStatus,
        _change: StatusChange,
    ) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn append_note(
        &self,
        _id: &ApplicationId,
        _note: CompanyNote,
    ) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_for_company(&self, _company: &CompanyId) -> Result<Vec<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_for_job(&self, _job: &JobId) -> Result<Vec<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Store double simulating a submission that loses the uniqueness race: the
/// pre-insert lookup sees nothing, the insert collides, and the re-read finds the
/// record the concurrent writer stored.
pub(super) struct RacingStore {
    pub(super) existing: ApplicationRecord,
    first_lookup: AtomicBool,
}

impl RacingStore {
    pub(super) fn new(existing: ApplicationRecord) -> Self {
        Self {
            existing,
            first_lookup: AtomicBool::new(true),
        }
    }
}

impl ApplicationStore for RacingStore {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::DuplicatePair)
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(Some(self.existing.clone()))
    }

    fn find_by_pair(
        &self,
        _candidate: &CandidateId,
        _job: &JobId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        if self.first_lookup.swap(false, Ordering::SeqCst) {
            Ok(None)
        } else {
            Ok(Some(self.existing.clone()))
        }
    }

    fn apply_status(
        &self,
        _id: &ApplicationId,
        _expected: ApplicationStatus,
        _change: StatusChange,
    ) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::StaleRead)
    }

    fn append_note(
        &self,
        _id: &ApplicationId,
        _note: CompanyNote,
    ) -> Result<ApplicationRecord, StoreError> {
        Ok(self.existing.clone())
    }

    fn list_for_company(&self, _company: &CompanyId) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(vec![self.existing.clone()])
    }

    fn list_for_job(&self, _job: &JobId) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(vec![self.existing.clone()])
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
