use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

/// Identifier wrapper for marketplace users (workers and job owners alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status pipeline for a worker's job application.
///
/// The pipeline is a closed state machine: an application starts as
/// `Pending` and moves forward through review stages until it reaches one
/// of the terminal states (`Accepted`, `Rejected`, `Cancelled`), after
/// which it is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Viewed,
    InProcess,
    Interview,
    Finalist,
    Accepted,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Viewed,
        ApplicationStatus::InProcess,
        ApplicationStatus::Interview,
        ApplicationStatus::Finalist,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Cancelled,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Viewed => "viewed",
            ApplicationStatus::InProcess => "in_process",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Finalist => "finalist",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == raw.trim())
    }

    /// Statuses this one may move to. Anything not listed here is an
    /// invalid transition.
    pub fn successors(self) -> &'static [ApplicationStatus] {
        match self {
            ApplicationStatus::Pending => &[
                ApplicationStatus::Viewed,
                ApplicationStatus::Rejected,
                ApplicationStatus::Cancelled,
            ],
            ApplicationStatus::Viewed => &[
                ApplicationStatus::InProcess,
                ApplicationStatus::Rejected,
                ApplicationStatus::Cancelled,
            ],
            ApplicationStatus::InProcess => &[
                ApplicationStatus::Interview,
                ApplicationStatus::Rejected,
                ApplicationStatus::Cancelled,
            ],
            ApplicationStatus::Interview => {
                &[ApplicationStatus::Finalist, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Finalist => {
                &[ApplicationStatus::Accepted, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Accepted
            | ApplicationStatus::Rejected
            | ApplicationStatus::Cancelled => &[],
        }
    }

    pub fn permits(self, next: ApplicationStatus) -> bool {
        self.successors().contains(&next)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted
                | ApplicationStatus::Rejected
                | ApplicationStatus::Cancelled
        )
    }

    /// The applicant may withdraw only before the interview stage.
    pub const fn allows_cancellation(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::Viewed | ApplicationStatus::InProcess
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Attempted status change not present in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {from} to {to}")]
pub struct TransitionError {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// A worker's request to be considered for a job posting.
///
/// Exactly one application exists per `(job_id, user_id)` pair. The record
/// is stored redundantly under the worker's application list and the job's
/// applicant list; both copies carry this full struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: ApplicationStatus,
    pub message: String,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub viewed_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new(job_id: JobId, user_id: UserId, message: String, at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            user_id,
            status: ApplicationStatus::Pending,
            message,
            applied_at: at,
            updated_at: at,
            viewed_at: None,
        }
    }

    /// Apply a status change, enforcing the transition table.
    ///
    /// Stamps `updated_at`, and `viewed_at` when the application enters
    /// `Viewed`. The table admits `Viewed` only from `Pending`, so the
    /// viewed timestamp is written at most once per application.
    pub fn transition(
        &mut self,
        next: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.status.permits(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.updated_at = at;
        if next == ApplicationStatus::Viewed {
            self.viewed_at = Some(at);
        }
        Ok(())
    }
}
