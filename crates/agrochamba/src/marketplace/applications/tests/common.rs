use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::marketplace::applications::domain::{Application, JobId, UserId};
use crate::marketplace::applications::store::{
    ApplicationStore, JobCatalog, NotifyError, StatusNotification, StatusNotifier, StoreError,
};
use crate::marketplace::applications::{application_router, ApplicationService};

pub(super) const OWNER: UserId = UserId(10);
pub(super) const WORKER: UserId = UserId(77);
pub(super) const OTHER_WORKER: UserId = UserId(78);
pub(super) const JOB: JobId = JobId(1);

/// In-memory meta store holding the two denormalized views separately so
/// tests can observe divergence between them.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    user_lists: Arc<Mutex<HashMap<UserId, BTreeMap<JobId, Application>>>>,
    job_lists: Arc<Mutex<HashMap<JobId, BTreeMap<UserId, Application>>>>,
}

impl MemoryStore {
    pub(super) fn user_copy(&self, user_id: UserId, job_id: JobId) -> Option<Application> {
        let guard = self.user_lists.lock().expect("store mutex poisoned");
        guard.get(&user_id).and_then(|list| list.get(&job_id)).cloned()
    }

    pub(super) fn job_copy(&self, job_id: JobId, user_id: UserId) -> Option<Application> {
        let guard = self.job_lists.lock().expect("store mutex poisoned");
        guard.get(&job_id).and_then(|list| list.get(&user_id)).cloned()
    }
}

impl ApplicationStore for MemoryStore {
    fn put_user_application(&self, application: &Application) -> Result<(), StoreError> {
        let mut guard = self.user_lists.lock().expect("store mutex poisoned");
        guard
            .entry(application.user_id)
            .or_default()
            .insert(application.job_id, application.clone());
        Ok(())
    }

    fn put_job_applicant(&self, application: &Application) -> Result<(), StoreError> {
        let mut guard = self.job_lists.lock().expect("store mutex poisoned");
        guard
            .entry(application.job_id)
            .or_default()
            .insert(application.user_id, application.clone());
        Ok(())
    }

    fn user_application(
        &self,
        user_id: UserId,
        job_id: JobId,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self.user_copy(user_id, job_id))
    }

    fn job_applicant(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self.job_copy(job_id, user_id))
    }

    fn user_applications(&self, user_id: UserId) -> Result<Vec<Application>, StoreError> {
        let guard = self.user_lists.lock().expect("store mutex poisoned");
        Ok(guard
            .get(&user_id)
            .map(|list| list.values().cloned().collect())
            .unwrap_or_default())
    }

    fn job_applicants(&self, job_id: JobId) -> Result<Vec<Application>, StoreError> {
        let guard = self.job_lists.lock().expect("store mutex poisoned");
        Ok(guard
            .get(&job_id)
            .map(|list| list.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    owners: Arc<Mutex<HashMap<JobId, UserId>>>,
}

impl MemoryCatalog {
    pub(super) fn register(&self, job_id: JobId, owner: UserId) {
        self.owners
            .lock()
            .expect("catalog mutex poisoned")
            .insert(job_id, owner);
    }
}

impl JobCatalog for MemoryCatalog {
    fn owner_of(&self, job_id: JobId) -> Result<Option<UserId>, StoreError> {
        let guard = self.owners.lock().expect("catalog mutex poisoned");
        Ok(guard.get(&job_id).copied())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<StatusNotification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<StatusNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl StatusNotifier for MemoryNotifier {
    fn notify(&self, notification: StatusNotification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Store whose job-side write always fails, leaving only the user-side
/// copy written. Used to exercise the dual-write divergence path.
#[derive(Default, Clone)]
pub(super) struct FailingJobCopyStore {
    inner: MemoryStore,
}

impl FailingJobCopyStore {
    pub(super) fn user_copy(&self, user_id: UserId, job_id: JobId) -> Option<Application> {
        self.inner.user_copy(user_id, job_id)
    }

    pub(super) fn job_copy(&self, job_id: JobId, user_id: UserId) -> Option<Application> {
        self.inner.job_copy(job_id, user_id)
    }
}

impl ApplicationStore for FailingJobCopyStore {
    fn put_user_application(&self, application: &Application) -> Result<(), StoreError> {
        self.inner.put_user_application(application)
    }

    fn put_job_applicant(&self, _application: &Application) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("post meta write refused".to_string()))
    }

    fn user_application(
        &self,
        user_id: UserId,
        job_id: JobId,
    ) -> Result<Option<Application>, StoreError> {
        self.inner.user_application(user_id, job_id)
    }

    fn job_applicant(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> Result<Option<Application>, StoreError> {
        self.inner.job_applicant(job_id, user_id)
    }

    fn user_applications(&self, user_id: UserId) -> Result<Vec<Application>, StoreError> {
        self.inner.user_applications(user_id)
    }

    fn job_applicants(&self, job_id: JobId) -> Result<Vec<Application>, StoreError> {
        self.inner.job_applicants(job_id)
    }
}

/// Store that is entirely offline.
pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn put_user_application(&self, _application: &Application) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("meta store offline".to_string()))
    }

    fn put_job_applicant(&self, _application: &Application) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("meta store offline".to_string()))
    }

    fn user_application(
        &self,
        _user_id: UserId,
        _job_id: JobId,
    ) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("meta store offline".to_string()))
    }

    fn job_applicant(
        &self,
        _job_id: JobId,
        _user_id: UserId,
    ) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("meta store offline".to_string()))
    }

    fn user_applications(&self, _user_id: UserId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("meta store offline".to_string()))
    }

    fn job_applicants(&self, _job_id: JobId) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("meta store offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    ApplicationService<MemoryStore, MemoryCatalog, MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryCatalog>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let notifier = Arc::new(MemoryNotifier::default());
    catalog.register(JOB, OWNER);
    let service = ApplicationService::new(store.clone(), catalog.clone(), notifier.clone());
    (service, store, catalog, notifier)
}

pub(super) fn router_with_service(
    service: ApplicationService<MemoryStore, MemoryCatalog, MemoryNotifier>,
) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 16)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
