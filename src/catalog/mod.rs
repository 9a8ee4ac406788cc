//! Job catalog collaborator: posting lookups plus a CSV loader for seeding.
//!
//! Posting CRUD belongs to the catalog service proper; the lifecycle engine only needs
//! to resolve a job id to its owning company and active flag at submission time.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Identifier of a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier of the company that owns a posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Snapshot of a posting as the lifecycle engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub company_id: CompanyId,
    pub title: String,
    pub active: bool,
}

/// Read-side lookup into the posting store.
pub trait JobCatalog: Send + Sync {
    fn posting(&self, id: &JobId) -> Result<Option<JobPosting>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("job catalog unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogImportError {
    #[error("failed to read postings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid postings CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    Row { row: usize, message: String },
}

#[derive(Debug, Deserialize)]
struct PostingRow {
    job_id: String,
    company_id: String,
    title: String,
    active: String,
}

/// Load postings from a CSV file with a `job_id,company_id,title,active` header.
pub fn load_postings(path: impl AsRef<Path>) -> Result<Vec<JobPosting>, CatalogImportError> {
    let file = std::fs::File::open(path)?;
    read_postings(file)
}

pub fn read_postings<R: Read>(reader: R) -> Result<Vec<JobPosting>, CatalogImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut postings = Vec::new();
    for (index, record) in csv_reader.deserialize::<PostingRow>().enumerate() {
        let row = record?;
        if row.job_id.is_empty() || row.company_id.is_empty() {
            return Err(CatalogImportError::Row {
                row: index + 1,
                message: "job_id and company_id are required".to_string(),
            });
        }
        let active = match row.active.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(CatalogImportError::Row {
                    row: index + 1,
                    message: format!("unrecognized active flag '{other}'"),
                })
            }
        };
        postings.push(JobPosting {
            id: JobId(row.job_id),
            company_id: CompanyId(row.company_id),
            title: row.title,
            active,
        });
    }

    Ok(postings)
}
