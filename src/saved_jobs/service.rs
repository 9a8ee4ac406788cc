use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::{Actor, ActorKind};
use crate::catalog::JobId;

use super::domain::{Priority, SavedJob, SavedJobId, SavedJobUpdate, UserId};
use super::repository::{SavedJobStore, SavedJobStoreError};

/// Payload for saving a posting.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub remind_on: Option<DateTime<Utc>>,
}

/// Recognized listing filters; unset fields do not constrain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedJobFilter {
    pub priority: Option<Priority>,
    /// Comma-separated; a bookmark matches when it carries any of the named tags.
    pub tags: Option<String>,
    pub has_reminder: Option<bool>,
}

pub struct SavedJobService<S> {
    store: Arc<S>,
    sequence: AtomicU64,
}

impl<S> SavedJobService<S>
where
    S: SavedJobStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sequence: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> SavedJobId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        SavedJobId(format!("saved-{id:06}"))
    }

    pub fn save(&self, actor: &Actor, request: SaveRequest) -> Result<SavedJob, SavedJobError> {
        let user = require_user(actor)?;
        if let Some(existing) = self.store.find_active_pair(&user, &request.job_id)? {
            return Err(SavedJobError::Duplicate {
                existing: Box::new(existing),
            });
        }

        let record = SavedJob {
            id: self.next_id(),
            user_id: user.clone(),
            job_id: request.job_id.clone(),
            note: request.note,
            tags: request.tags,
            priority: request.priority,
            remind_on: request.remind_on,
            active: true,
            saved_at: Utc::now(),
        };

        match self.store.insert(record) {
            Ok(stored) => Ok(stored),
            // Concurrent save for the same pair; surface the surviving record.
            Err(SavedJobStoreError::DuplicatePair) => {
                let existing = self
                    .store
                    .find_active_pair(&user, &request.job_id)?
                    .ok_or(SavedJobStoreError::DuplicatePair)?;
                Err(SavedJobError::Duplicate {
                    existing: Box::new(existing),
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Apply each provided partial mutation in sequence.
    pub fn update(
        &self,
        id: &SavedJobId,
        actor: &Actor,
        updates: Vec<SavedJobUpdate>,
    ) -> Result<SavedJob, SavedJobError> {
        let user = require_user(actor)?;
        if updates.is_empty() {
            return Err(SavedJobError::Validation(
                "no update fields provided".to_string(),
            ));
        }

        let mut current = None;
        for update in updates {
            current = Some(self.store.apply(id, &user, update)?);
        }
        // Non-empty input guarantees at least one store round-trip.
        current.ok_or(SavedJobError::NotFound)
    }

    pub fn unsave(&self, id: &SavedJobId, actor: &Actor) -> Result<SavedJob, SavedJobError> {
        let user = require_user(actor)?;
        Ok(self.store.remove(id, &user)?)
    }

    /// Active bookmarks for the acting user, newest first.
    pub fn list(
        &self,
        actor: &Actor,
        filter: SavedJobFilter,
    ) -> Result<Vec<SavedJob>, SavedJobError> {
        let user = require_user(actor)?;
        let mut records = self.store.list_for_user(&user)?;
        records.retain(|record| record.active);

        if let Some(priority) = filter.priority {
            records.retain(|record| record.priority == priority);
        }
        if let Some(raw_tags) = &filter.tags {
            let wanted: BTreeSet<&str> = raw_tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .collect();
            if !wanted.is_empty() {
                records.retain(|record| {
                    record.tags.iter().any(|tag| wanted.contains(tag.as_str()))
                });
            }
        }
        if let Some(has_reminder) = filter.has_reminder {
            records.retain(|record| record.remind_on.is_some() == has_reminder);
        }

        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| b.id.cmp(&a.id)));
        Ok(records)
    }
}

fn require_user(actor: &Actor) -> Result<UserId, SavedJobError> {
    match actor.kind {
        ActorKind::User => Ok(UserId(actor.subject.clone())),
        ActorKind::Company => Err(SavedJobError::Authorization),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SavedJobError {
    #[error("{0}")]
    Validation(String),
    #[error("this job is already saved")]
    Duplicate { existing: Box<SavedJob> },
    #[error("saved job not found")]
    NotFound,
    #[error("operation not permitted for this actor")]
    Authorization,
    #[error(transparent)]
    Store(SavedJobStoreError),
}

impl From<SavedJobStoreError> for SavedJobError {
    fn from(err: SavedJobStoreError) -> Self {
        match err {
            SavedJobStoreError::NotFound => SavedJobError::NotFound,
            other => SavedJobError::Store(other),
        }
    }
}
