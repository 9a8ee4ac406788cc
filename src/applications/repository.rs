use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CompanyId, JobId};

use super::domain::{
    ApplicationId, ApplicationStatus, CandidateId, CompanyNote, StatusChange, SubmissionProfile,
};

/// Persistent record for one (candidate, job) submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    /// Owner of the referenced posting; copied at submission so scoped lookups do not
    /// need a catalog round-trip.
    pub company_id: CompanyId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub status_history: Vec<StatusChange>,
    pub company_notes: Vec<CompanyNote>,
    pub profile: SubmissionProfile,
}

impl ApplicationRecord {
    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id.clone(),
            candidate_id: self.candidate_id.clone(),
            job_id: self.job_id.clone(),
            status: self.status,
            applied_at: self.applied_at,
        }
    }
}

/// Lighter view used by paged listings.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Mutations that touch history or notes are store primitives: the store applies them
/// while holding its write lock, so concurrent writers can never lose entries.
pub trait ApplicationStore: Send + Sync {
    /// Insert a new record. The store owns (candidate, job) uniqueness and is the
    /// authority that resolves concurrent submissions.
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError>;

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError>;

    fn find_by_pair(
        &self,
        candidate: &CandidateId,
        job: &JobId,
    ) -> Result<Option<ApplicationRecord>, StoreError>;

    /// Set the status and append the matching history entry in one step, conditioned
    /// on the record still being in `expected`. Fails with `StaleRead` otherwise.
    fn apply_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        change: StatusChange,
    ) -> Result<ApplicationRecord, StoreError>;

    fn append_note(
        &self,
        id: &ApplicationId,
        note: CompanyNote,
    ) -> Result<ApplicationRecord, StoreError>;

    fn list_for_company(&self, company: &CompanyId) -> Result<Vec<ApplicationRecord>, StoreError>;

    fn list_for_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an application for this candidate and job already exists")]
    DuplicatePair,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    StaleRead,
    #[error("application store unavailable: {0}")]
    Unavailable(String),
}
