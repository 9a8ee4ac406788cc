//! Application lifecycle engine: submission intake, status transitions with an
//! append-only audit trail, reviewer notes, and derived status tallies.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationStatus, CandidateId, CompanyNote, StatusChange, SubmissionProfile,
    TransitionCheck,
};
pub use repository::{ApplicationRecord, ApplicationStore, ApplicationSummary, StoreError};
pub use router::application_router;
pub use service::{
    ApplicationService, CountScope, ListFilter, Paged, ServiceError, StatusCounts, SubmitRequest,
};
