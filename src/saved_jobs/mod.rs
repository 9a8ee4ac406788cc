//! Saved-job bookmarks: per-user annotations on postings, independent of the
//! application lifecycle.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{Priority, SavedJob, SavedJobId, SavedJobUpdate, UserId};
pub use repository::{SavedJobStore, SavedJobStoreError};
pub use router::saved_job_router;
pub use service::{SaveRequest, SavedJobError, SavedJobFilter, SavedJobService};
