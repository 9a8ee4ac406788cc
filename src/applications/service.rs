use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{Actor, ActorKind};
use crate::catalog::{CatalogError, CompanyId, JobCatalog, JobId};

use super::domain::{
    ApplicationId, ApplicationStatus, CandidateId, CompanyNote, StatusChange, SubmissionProfile,
    TransitionCheck,
};
use super::repository::{ApplicationRecord, ApplicationStore, ApplicationSummary, StoreError};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Payload accepted when a candidate submits to a posting.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub profile: SubmissionProfile,
}

/// Listing controls for a company's view of its applications.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    pub status: Option<ApplicationStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Page of listing results plus the totals the caller needs for navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Scope for a status tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountScope {
    Company(CompanyId),
    Job(JobId),
}

/// Derived status tally; always recomputed from the records in scope.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCounts {
    pub counts: BTreeMap<ApplicationStatus, u64>,
    pub total: u64,
}

/// Service owning transition legality and its side effects.
pub struct ApplicationService<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    sequence: AtomicU64,
}

impl<S, C> ApplicationService<S, C>
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    pub fn new(store: Arc<S>, catalog: Arc<C>) -> Self {
        Self {
            store,
            catalog,
            sequence: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> ApplicationId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        ApplicationId(format!("app-{id:06}"))
    }

    /// Submit a new application. At most one record per (candidate, job) ever exists;
    /// a repeat attempt surfaces the original record inside `Duplicate`.
    pub fn submit(
        &self,
        actor: &Actor,
        request: SubmitRequest,
    ) -> Result<ApplicationRecord, ServiceError> {
        if actor.kind != ActorKind::User {
            return Err(ServiceError::Authorization);
        }
        let candidate = CandidateId(actor.subject.clone());

        let posting = self
            .catalog
            .posting(&request.job_id)?
            .ok_or_else(|| ServiceError::Validation("unknown job posting".to_string()))?;
        if !posting.active {
            return Err(ServiceError::Validation(
                "job posting is no longer accepting applications".to_string(),
            ));
        }

        // Records are never deleted, so the pair stays claimed even after a withdrawal;
        // a withdrawn application deliberately blocks re-submission for the same job.
        if let Some(existing) = self.store.find_by_pair(&candidate, &request.job_id)? {
            return Err(ServiceError::Duplicate {
                existing: Box::new(existing),
            });
        }

        let now = Utc::now();
        let record = ApplicationRecord {
            id: self.next_id(),
            candidate_id: candidate.clone(),
            job_id: request.job_id.clone(),
            company_id: posting.company_id,
            status: ApplicationStatus::Pending,
            applied_at: now,
            status_history: vec![StatusChange {
                status: ApplicationStatus::Pending,
                changed_at: now,
                note: None,
            }],
            company_notes: Vec::new(),
            profile: request.profile,
        };

        match self.store.insert(record) {
            Ok(stored) => {
                info!(application = %stored.id.0, job = %stored.job_id.0, "application submitted");
                Ok(stored)
            }
            // Lost the race against a concurrent submit for the same pair; the store's
            // uniqueness check is the authority, so report the surviving record.
            Err(StoreError::DuplicatePair) => {
                let existing = self
                    .store
                    .find_by_pair(&candidate, &request.job_id)?
                    .ok_or(StoreError::DuplicatePair)?;
                Err(ServiceError::Duplicate {
                    existing: Box::new(existing),
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Fetch one application, visible only to the owning candidate or company.
    pub fn get(
        &self,
        id: &ApplicationId,
        actor: &Actor,
    ) -> Result<ApplicationRecord, ServiceError> {
        let record = self.store.fetch(id)?.ok_or(ServiceError::NotFound)?;
        if !owns_record(actor, &record) {
            return Err(ServiceError::NotFound);
        }
        Ok(record)
    }

    /// Move an application along the lifecycle.
    ///
    /// Companies drive the forward chain for postings they own; candidates may only
    /// set `withdrawn` on their own applications. Re-issuing the current status is an
    /// idempotent success that leaves history untouched.
    pub fn transition_status(
        &self,
        id: &ApplicationId,
        requested: ApplicationStatus,
        note: Option<String>,
        actor: &Actor,
    ) -> Result<ApplicationRecord, ServiceError> {
        let record = self.store.fetch(id)?.ok_or(ServiceError::NotFound)?;
        if !owns_record(actor, &record) {
            return Err(ServiceError::NotFound);
        }
        match actor.kind {
            ActorKind::User if requested != ApplicationStatus::Withdrawn => {
                return Err(ServiceError::Authorization)
            }
            ActorKind::Company if requested == ApplicationStatus::Withdrawn => {
                return Err(ServiceError::Authorization)
            }
            _ => {}
        }

        match record.status.check_transition(requested) {
            TransitionCheck::Idempotent => Ok(record),
            TransitionCheck::Invalid => Err(ServiceError::InvalidTransition {
                from: record.status,
                to: requested,
            }),
            TransitionCheck::Allowed => {
                let updated = self.store.apply_status(
                    id,
                    record.status,
                    StatusChange {
                        status: requested,
                        changed_at: Utc::now(),
                        note: normalize_note(note),
                    },
                )?;
                info!(
                    application = %updated.id.0,
                    from = record.status.label(),
                    to = requested.label(),
                    "application status changed"
                );
                Ok(updated)
            }
        }
    }

    /// Attach a reviewer note; prior notes are never rewritten.
    pub fn append_note(
        &self,
        id: &ApplicationId,
        note: &str,
        actor: &Actor,
    ) -> Result<ApplicationRecord, ServiceError> {
        if actor.kind != ActorKind::Company {
            return Err(ServiceError::Authorization);
        }
        let body = note.trim();
        if body.is_empty() {
            return Err(ServiceError::Validation(
                "note must not be empty".to_string(),
            ));
        }

        let record = self.store.fetch(id)?.ok_or(ServiceError::NotFound)?;
        if record.company_id.0 != actor.subject {
            return Err(ServiceError::NotFound);
        }

        let updated = self.store.append_note(
            id,
            CompanyNote {
                body: body.to_string(),
                created_at: Utc::now(),
            },
        )?;
        Ok(updated)
    }

    /// Newest-first page of the acting company's applications.
    pub fn list_for_company(
        &self,
        actor: &Actor,
        filter: ListFilter,
    ) -> Result<Paged<ApplicationSummary>, ServiceError> {
        let company = require_company(actor)?;
        let mut records = self.store.list_for_company(&company)?;
        if let Some(status) = filter.status {
            records.retain(|record| record.status == status);
        }
        records.sort_by(|a, b| {
            b.applied_at
                .cmp(&a.applied_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let total = records.len() as u64;
        let total_pages = total.div_ceil(limit);

        // Saturate so an absurd caller-supplied page yields an empty page, not overflow.
        let start = page.saturating_sub(1).saturating_mul(limit);
        let items = records
            .into_iter()
            .skip(start as usize)
            .take(limit as usize)
            .map(|record| record.summary())
            .collect();

        Ok(Paged {
            items,
            total,
            page,
            limit,
            total_pages,
        })
    }

    /// Tally the applications currently in each status within scope. Always derived
    /// from the records themselves; there is no stored counter to drift.
    pub fn status_counts(
        &self,
        actor: &Actor,
        job: Option<JobId>,
    ) -> Result<StatusCounts, ServiceError> {
        let company = require_company(actor)?;
        let scope = match job {
            Some(job_id) => {
                let posting = self
                    .catalog
                    .posting(&job_id)?
                    .ok_or(ServiceError::NotFound)?;
                if posting.company_id != company {
                    return Err(ServiceError::NotFound);
                }
                CountScope::Job(job_id)
            }
            None => CountScope::Company(company),
        };

        let records = match &scope {
            CountScope::Company(company) => self.store.list_for_company(company)?,
            CountScope::Job(job_id) => self.store.list_for_job(job_id)?,
        };

        let mut counts: BTreeMap<ApplicationStatus, u64> = ApplicationStatus::ALL
            .into_iter()
            .map(|status| (status, 0))
            .collect();
        for record in &records {
            *counts.entry(record.status).or_default() += 1;
        }

        Ok(StatusCounts {
            counts,
            total: records.len() as u64,
        })
    }
}

fn owns_record(actor: &Actor, record: &ApplicationRecord) -> bool {
    match actor.kind {
        ActorKind::User => record.candidate_id.0 == actor.subject,
        ActorKind::Company => record.company_id.0 == actor.subject,
    }
}

fn require_company(actor: &Actor) -> Result<CompanyId, ServiceError> {
    match actor.kind {
        ActorKind::Company => Ok(CompanyId(actor.subject.clone())),
        ActorKind::User => Err(ServiceError::Authorization),
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Error raised by the application service, mapped to HTTP at the router boundary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("an application for this job already exists")]
    Duplicate { existing: Box<ApplicationRecord> },
    #[error("application not found")]
    NotFound,
    #[error("actor is not permitted to perform this operation")]
    Authorization,
    #[error("cannot move application from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
