use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::domain::{Application, ApplicationStatus, JobId, TransitionError, UserId};
use super::store::{
    ApplicationStore, JobCatalog, NotifyError, StatusNotification, StatusNotifier, StoreError,
};

/// Service composing the meta store, job catalog, and notification hook.
///
/// All mutations go through the sequential dual-write: the worker-side
/// copy first, then the job-side copy. There is no transaction boundary
/// between the two, so a failure on the second write leaves the copies
/// divergent; the failure is logged and surfaced, never rolled back.
pub struct ApplicationService<S, J, N> {
    store: Arc<S>,
    jobs: Arc<J>,
    notifier: Arc<N>,
}

impl<S, J, N> ApplicationService<S, J, N>
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    pub fn new(store: Arc<S>, jobs: Arc<J>, notifier: Arc<N>) -> Self {
        Self {
            store,
            jobs,
            notifier,
        }
    }

    /// Submit a new application for a job, starting the pipeline at `pending`.
    pub fn apply(
        &self,
        applicant: UserId,
        job_id: JobId,
        message: String,
    ) -> Result<Application, ApplicationServiceError> {
        let owner = self
            .jobs
            .owner_of(job_id)?
            .ok_or(ApplicationServiceError::JobNotFound)?;
        if owner == applicant {
            return Err(ApplicationServiceError::OwnListing);
        }

        // One application per (job, user) pair, cancelled records included.
        if self.store.user_application(applicant, job_id)?.is_some() {
            return Err(ApplicationServiceError::AlreadyApplied);
        }

        let application = Application::new(job_id, applicant, message, Utc::now());
        self.persist(&application)?;

        self.notifier.notify(StatusNotification {
            template: "application_received".to_string(),
            recipient: owner,
            job_id,
            applicant,
            status: application.status,
        })?;

        Ok(application)
    }

    /// The worker's application list, oldest first.
    pub fn applications_for(
        &self,
        applicant: UserId,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let mut applications = self.store.user_applications(applicant)?;
        applications.sort_by_key(|application| (application.applied_at, application.job_id));
        Ok(applications)
    }

    /// Withdraw the caller's own application.
    ///
    /// Cancellation rides the transition table, so it succeeds only while
    /// the application is still pending, viewed, or in process.
    pub fn cancel(
        &self,
        applicant: UserId,
        job_id: JobId,
    ) -> Result<Application, ApplicationServiceError> {
        let mut application = self
            .store
            .user_application(applicant, job_id)?
            .ok_or(ApplicationServiceError::ApplicationNotFound)?;

        application.transition(ApplicationStatus::Cancelled, Utc::now())?;
        self.persist(&application)?;

        if let Some(owner) = self.jobs.owner_of(job_id)? {
            self.notifier.notify(StatusNotification {
                template: "application_cancelled".to_string(),
                recipient: owner,
                job_id,
                applicant,
                status: application.status,
            })?;
        }

        Ok(application)
    }

    /// Move an applicant through the pipeline on behalf of the job owner.
    ///
    /// `cancelled` is reserved for the applicant and cannot be set here.
    pub fn update_status(
        &self,
        actor: UserId,
        job_id: JobId,
        applicant: UserId,
        next: ApplicationStatus,
    ) -> Result<Application, ApplicationServiceError> {
        self.authorize_owner(actor, job_id)?;
        if next == ApplicationStatus::Cancelled {
            return Err(ApplicationServiceError::NotAuthorized);
        }

        let mut application = self
            .store
            .job_applicant(job_id, applicant)?
            .ok_or(ApplicationServiceError::ApplicationNotFound)?;

        application.transition(next, Utc::now())?;
        self.persist(&application)?;

        self.notifier.notify(StatusNotification {
            template: "application_status_changed".to_string(),
            recipient: applicant,
            job_id,
            applicant,
            status: application.status,
        })?;

        Ok(application)
    }

    /// The job's applicant list for its owner, oldest first.
    ///
    /// Reading the list is itself a pipeline event: every `pending` entry
    /// moves to `viewed`, so the first read stamps `viewed_at` and later
    /// reads find nothing left to advance.
    pub fn applicants(
        &self,
        actor: UserId,
        job_id: JobId,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        self.authorize_owner(actor, job_id)?;

        let mut applications = self.store.job_applicants(job_id)?;
        let now = Utc::now();
        for application in applications.iter_mut() {
            if application.status == ApplicationStatus::Pending {
                application.transition(ApplicationStatus::Viewed, now)?;
                self.persist(application)?;
            }
        }

        applications.sort_by_key(|application| (application.applied_at, application.user_id));
        Ok(applications)
    }

    /// The caller's own application for a given job.
    pub fn status_of(
        &self,
        applicant: UserId,
        job_id: JobId,
    ) -> Result<Application, ApplicationServiceError> {
        self.store
            .user_application(applicant, job_id)?
            .ok_or(ApplicationServiceError::ApplicationNotFound)
    }

    fn authorize_owner(&self, actor: UserId, job_id: JobId) -> Result<(), ApplicationServiceError> {
        let owner = self
            .jobs
            .owner_of(job_id)?
            .ok_or(ApplicationServiceError::JobNotFound)?;
        if owner != actor {
            return Err(ApplicationServiceError::NotAuthorized);
        }
        Ok(())
    }

    /// Sequential dual-write of both denormalized copies.
    fn persist(&self, application: &Application) -> Result<(), ApplicationServiceError> {
        self.store.put_user_application(application)?;
        if let Err(err) = self.store.put_job_applicant(application) {
            warn!(
                job_id = application.job_id.0,
                user_id = application.user_id.0,
                error = %err,
                "job-side applicant copy diverged from user-side copy"
            );
            return Err(ApplicationServiceError::Store(err));
        }
        Ok(())
    }
}

/// Error raised by the application workflow service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("an application for this job already exists")]
    AlreadyApplied,
    #[error("job owners cannot apply to their own listing")]
    OwnListing,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("only the job owner may perform this action")]
    NotAuthorized,
    #[error("job not found")]
    JobNotFound,
    #[error("application not found")]
    ApplicationNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl ApplicationServiceError {
    /// Stable machine-readable code carried in REST error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ApplicationServiceError::AlreadyApplied => "already_applied",
            ApplicationServiceError::OwnListing => "own_job",
            ApplicationServiceError::Transition(_) => "invalid_transition",
            ApplicationServiceError::NotAuthorized => "not_authorized",
            ApplicationServiceError::JobNotFound => "job_not_found",
            ApplicationServiceError::ApplicationNotFound => "application_not_found",
            ApplicationServiceError::Store(_) => "storage_unavailable",
            ApplicationServiceError::Notify(_) => "notification_failed",
        }
    }
}
