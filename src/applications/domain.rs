use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to an application at submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier of the candidate who submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Lifecycle states of an application.
///
/// The forward chain is pending → reviewing → shortlisted → interview → offered or
/// rejected; `withdrawn` is a candidate-only side exit from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Shortlisted,
    Interview,
    Offered,
    Rejected,
    Withdrawn,
}

/// Outcome of checking a requested move against the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// Same status re-issued; succeeds without touching history.
    Idempotent,
    Allowed,
    Invalid,
}

impl ApplicationStatus {
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Reviewing,
        Self::Shortlisted,
        Self::Interview,
        Self::Offered,
        Self::Rejected,
        Self::Withdrawn,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Shortlisted => "shortlisted",
            Self::Interview => "interview",
            Self::Offered => "offered",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Offered | Self::Rejected | Self::Withdrawn)
    }

    /// Position along the forward chain. Terminal outcomes share the last slot.
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Reviewing => 1,
            Self::Shortlisted => 2,
            Self::Interview => 3,
            Self::Offered | Self::Rejected | Self::Withdrawn => 4,
        }
    }

    /// Transition policy: forward skips allowed, backward moves never, terminal states
    /// locked. An offer additionally requires the application to have been looked at,
    /// so pending → offered is invalid even though it moves forward.
    pub fn check_transition(self, requested: Self) -> TransitionCheck {
        if requested == self {
            return TransitionCheck::Idempotent;
        }
        if self.is_terminal() {
            return TransitionCheck::Invalid;
        }
        match requested {
            Self::Withdrawn => TransitionCheck::Allowed,
            Self::Offered if self == Self::Pending => TransitionCheck::Invalid,
            _ if requested.rank() > self.rank() => TransitionCheck::Allowed,
            _ => TransitionCheck::Invalid,
        }
    }
}

/// One entry in the append-only status audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub changed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Reviewer note attached by the owning company; never edited after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyNote {
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Free-form fields captured at submission time. They are a snapshot of what the
/// candidate sent, not a live view of their profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionProfile {
    #[serde(default)]
    pub resume_key: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub expected_salary: Option<u32>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub available_from: Option<NaiveDate>,
}
