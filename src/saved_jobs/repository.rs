use crate::catalog::JobId;

use super::domain::{SavedJob, SavedJobId, SavedJobUpdate, UserId};

/// Storage abstraction for bookmarks.
///
/// `apply` runs under the store's write lock so partial mutations from concurrent
/// callers compose instead of overwriting each other.
pub trait SavedJobStore: Send + Sync {
    /// Insert a bookmark; the store rejects a second active record for the same
    /// (user, job) pair.
    fn insert(&self, record: SavedJob) -> Result<SavedJob, SavedJobStoreError>;

    fn find_active_pair(
        &self,
        user: &UserId,
        job: &JobId,
    ) -> Result<Option<SavedJob>, SavedJobStoreError>;

    /// Apply one partial mutation to a bookmark owned by `user`.
    fn apply(
        &self,
        id: &SavedJobId,
        user: &UserId,
        update: SavedJobUpdate,
    ) -> Result<SavedJob, SavedJobStoreError>;

    /// Hard delete, scoped to the owning user. Returns the removed record.
    fn remove(&self, id: &SavedJobId, user: &UserId) -> Result<SavedJob, SavedJobStoreError>;

    fn list_for_user(&self, user: &UserId) -> Result<Vec<SavedJob>, SavedJobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SavedJobStoreError {
    #[error("this job is already saved")]
    DuplicatePair,
    #[error("saved job not found")]
    NotFound,
    #[error("saved-job store unavailable: {0}")]
    Unavailable(String),
}
