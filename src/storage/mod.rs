//! In-memory store implementations behind the storage traits.
//!
//! A single mutex per store serializes writes, which is what makes the uniqueness
//! check on insert and the status compare-and-set race-free. The binary injects these
//! handles at startup; the integration suites construct their own.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::applications::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationStore, CandidateId,
    CompanyNote, StatusChange, StoreError,
};
use crate::catalog::{CatalogError, CompanyId, JobCatalog, JobId, JobPosting};
use crate::saved_jobs::{
    SavedJob, SavedJobId, SavedJobStore, SavedJobStoreError, SavedJobUpdate, UserId,
};

#[derive(Default)]
struct ApplicationShelf {
    records: HashMap<ApplicationId, ApplicationRecord>,
    by_pair: HashMap<(CandidateId, JobId), ApplicationId>,
}

/// Mutex-serialized application store.
#[derive(Default)]
pub struct MemoryApplicationStore {
    inner: Mutex<ApplicationShelf>,
}

impl MemoryApplicationStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ApplicationShelf>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("application store mutex poisoned".to_string()))
    }
}

impl ApplicationStore for MemoryApplicationStore {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError> {
        let mut shelf = self.lock()?;
        let pair = (record.candidate_id.clone(), record.job_id.clone());
        if shelf.by_pair.contains_key(&pair) {
            return Err(StoreError::DuplicatePair);
        }
        shelf.by_pair.insert(pair, record.id.clone());
        shelf.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(self.lock()?.records.get(id).cloned())
    }

    fn find_by_pair(
        &self,
        candidate: &CandidateId,
        job: &JobId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        let shelf = self.lock()?;
        let id = shelf.by_pair.get(&(candidate.clone(), job.clone()));
        Ok(id.and_then(|id| shelf.records.get(id)).cloned())
    }

    fn apply_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        change: StatusChange,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut shelf = self.lock()?;
        let record = shelf.records.get_mut(id).ok_or(StoreError::NotFound)?;
        if record.status != expected {
            return Err(StoreError::StaleRead);
        }
        record.status = change.status;
        record.status_history.push(change);
        Ok(record.clone())
    }

    fn append_note(
        &self,
        id: &ApplicationId,
        note: CompanyNote,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut shelf = self.lock()?;
        let record = shelf.records.get_mut(id).ok_or(StoreError::NotFound)?;
        record.company_notes.push(note);
        Ok(record.clone())
    }

    fn list_for_company(&self, company: &CompanyId) -> Result<Vec<ApplicationRecord>, StoreError> {
        let shelf = self.lock()?;
        Ok(shelf
            .records
            .values()
            .filter(|record| &record.company_id == company)
            .cloned()
            .collect())
    }

    fn list_for_job(&self, job: &JobId) -> Result<Vec<ApplicationRecord>, StoreError> {
        let shelf = self.lock()?;
        Ok(shelf
            .records
            .values()
            .filter(|record| &record.job_id == job)
            .cloned()
            .collect())
    }
}

/// Catalog handle hydrated from CSV at startup (or seeded directly in tests).
#[derive(Default)]
pub struct MemoryJobCatalog {
    postings: Mutex<HashMap<JobId, JobPosting>>,
}

impl MemoryJobCatalog {
    pub fn with_postings(postings: impl IntoIterator<Item = JobPosting>) -> Self {
        let catalog = Self::default();
        catalog.extend(postings);
        catalog
    }

    pub fn extend(&self, postings: impl IntoIterator<Item = JobPosting>) {
        if let Ok(mut guard) = self.postings.lock() {
            for posting in postings {
                guard.insert(posting.id.clone(), posting);
            }
        }
    }
}

impl JobCatalog for MemoryJobCatalog {
    fn posting(&self, id: &JobId) -> Result<Option<JobPosting>, CatalogError> {
        let guard = self
            .postings
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// Mutex-serialized bookmark store.
#[derive(Default)]
pub struct MemorySavedJobStore {
    records: Mutex<HashMap<SavedJobId, SavedJob>>,
}

impl MemorySavedJobStore {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SavedJobId, SavedJob>>, SavedJobStoreError> {
        self.records
            .lock()
            .map_err(|_| SavedJobStoreError::Unavailable("saved-job mutex poisoned".to_string()))
    }
}

impl SavedJobStore for MemorySavedJobStore {
    fn insert(&self, record: SavedJob) -> Result<SavedJob, SavedJobStoreError> {
        let mut records = self.lock()?;
        let duplicate = records.values().any(|existing| {
            existing.active
                && existing.user_id == record.user_id
                && existing.job_id == record.job_id
        });
        if duplicate {
            return Err(SavedJobStoreError::DuplicatePair);
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn find_active_pair(
        &self,
        user: &UserId,
        job: &JobId,
    ) -> Result<Option<SavedJob>, SavedJobStoreError> {
        let records = self.lock()?;
        Ok(records
            .values()
            .find(|record| record.active && &record.user_id == user && &record.job_id == job)
            .cloned())
    }

    fn apply(
        &self,
        id: &SavedJobId,
        user: &UserId,
        update: SavedJobUpdate,
    ) -> Result<SavedJob, SavedJobStoreError> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(id)
            .filter(|record| &record.user_id == user)
            .ok_or(SavedJobStoreError::NotFound)?;
        match update {
            SavedJobUpdate::Note(note) => record.note = note,
            SavedJobUpdate::AddTag(tag) => {
                record.tags.insert(tag);
            }
            SavedJobUpdate::RemoveTag(tag) => {
                record.tags.remove(&tag);
            }
            SavedJobUpdate::Priority(priority) => record.priority = priority,
            SavedJobUpdate::Reminder(remind_on) => record.remind_on = remind_on,
        }
        Ok(record.clone())
    }

    fn remove(&self, id: &SavedJobId, user: &UserId) -> Result<SavedJob, SavedJobStoreError> {
        let mut records = self.lock()?;
        match records.get(id) {
            Some(record) if &record.user_id == user => {}
            _ => return Err(SavedJobStoreError::NotFound),
        }
        records.remove(id).ok_or(SavedJobStoreError::NotFound)
    }

    fn list_for_user(&self, user: &UserId) -> Result<Vec<SavedJob>, SavedJobStoreError> {
        let records = self.lock()?;
        Ok(records
            .values()
            .filter(|record| &record.user_id == user)
            .cloned()
            .collect())
    }
}
