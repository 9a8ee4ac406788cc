use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::JobId;

/// Identifier assigned to a bookmark when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SavedJobId(pub String);

/// Identifier of the bookmarking user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A user's bookmark of a posting, independent of whether they applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: SavedJobId,
    pub user_id: UserId,
    pub job_id: JobId,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub priority: Priority,
    #[serde(default)]
    pub remind_on: Option<DateTime<Utc>>,
    /// Inactive bookmarks are hidden from default listings but kept around.
    pub active: bool,
    pub saved_at: DateTime<Utc>,
}

/// One independent partial mutation, applied store-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedJobUpdate {
    Note(Option<String>),
    /// Set-semantics insert; adding an existing tag is a no-op.
    AddTag(String),
    RemoveTag(String),
    Priority(Priority),
    Reminder(Option<DateTime<Utc>>),
}
