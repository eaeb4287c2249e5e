use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationStatus, JobId, UserId};

/// Storage abstraction over the key-value meta store.
///
/// Every application is held as two denormalized copies: one keyed under
/// the worker (the worker's application list) and one keyed under the job
/// (the job's applicant list). The trait exposes both views explicitly so
/// the service can perform the sequential dual-write; implementations do
/// not provide any transaction boundary across the two.
pub trait ApplicationStore: Send + Sync {
    fn put_user_application(&self, application: &Application) -> Result<(), StoreError>;
    fn put_job_applicant(&self, application: &Application) -> Result<(), StoreError>;
    fn user_application(
        &self,
        user_id: UserId,
        job_id: JobId,
    ) -> Result<Option<Application>, StoreError>;
    fn job_applicant(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> Result<Option<Application>, StoreError>;
    fn user_applications(&self, user_id: UserId) -> Result<Vec<Application>, StoreError>;
    fn job_applicants(&self, job_id: JobId) -> Result<Vec<Application>, StoreError>;
}

/// Lookup seam into the job-posting subsystem.
///
/// The workflow only needs to know whether a posting exists and who owns
/// it; posting CRUD itself lives with the collaborator.
pub trait JobCatalog: Send + Sync {
    fn owner_of(&self, job_id: JobId) -> Result<Option<UserId>, StoreError>;
}

/// Error enumeration for meta-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("meta store unavailable: {0}")]
    Unavailable(String),
    #[error("stored meta value could not be decoded: {0}")]
    Corrupted(String),
}

/// Outbound notification hook. Delivery (push, e-mail) is an external
/// collaborator; the workflow only emits the events.
pub trait StatusNotifier: Send + Sync {
    fn notify(&self, notification: StatusNotification) -> Result<(), NotifyError>;
}

/// Event payload describing a change in an application's pipeline position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotification {
    pub template: String,
    pub recipient: UserId,
    pub job_id: JobId,
    pub applicant: UserId,
    pub status: ApplicationStatus,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Wire representation of an application exposed by the REST surface.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: &'static str,
    pub message: String,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
}

impl ApplicationView {
    pub fn from_application(application: &Application) -> Self {
        Self {
            job_id: application.job_id,
            user_id: application.user_id,
            status: application.status.label(),
            message: application.message.clone(),
            applied_at: application.applied_at,
            updated_at: application.updated_at,
            viewed_at: application.viewed_at,
        }
    }
}
