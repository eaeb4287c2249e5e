use agrochamba::marketplace::applications::{
    Application, ApplicationStore, JobCatalog, JobId, NotifyError, StatusNotification,
    StatusNotifier, StoreError, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) jobs: Arc<InMemoryJobCatalog>,
}

/// Meta-store adapter keeping the two denormalized views in separate maps,
/// mirroring the user-meta/post-meta split of the production store.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationStore {
    user_lists: Arc<Mutex<HashMap<UserId, BTreeMap<JobId, Application>>>>,
    job_lists: Arc<Mutex<HashMap<JobId, BTreeMap<UserId, Application>>>>,
}

impl ApplicationStore for InMemoryApplicationStore {
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
        let guard = self.user_lists.lock().expect("store mutex poisoned");
        Ok(guard.get(&user_id).and_then(|list| list.get(&job_id)).cloned())
    }

    fn job_applicant(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> Result<Option<Application>, StoreError> {
        let guard = self.job_lists.lock().expect("store mutex poisoned");
        Ok(guard.get(&job_id).and_then(|list| list.get(&user_id)).cloned())
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

/// Minimal listing registry so the workflow endpoints are exercisable; the
/// production catalog is the job-posting subsystem.
pub(crate) struct InMemoryJobCatalog {
    next_id: AtomicU64,
    owners: Mutex<HashMap<JobId, UserId>>,
}

impl Default for InMemoryJobCatalog {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            owners: Mutex::new(HashMap::new()),
        }
    }
}

impl InMemoryJobCatalog {
    pub(crate) fn create_job(&self, owner: UserId) -> JobId {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.owners
            .lock()
            .expect("catalog mutex poisoned")
            .insert(id, owner);
        id
    }
}

impl JobCatalog for InMemoryJobCatalog {
    fn owner_of(&self, job_id: JobId) -> Result<Option<UserId>, StoreError> {
        let guard = self.owners.lock().expect("catalog mutex poisoned");
        Ok(guard.get(&job_id).copied())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryStatusNotifier {
    events: Arc<Mutex<Vec<StatusNotification>>>,
}

impl InMemoryStatusNotifier {
    pub(crate) fn events(&self) -> Vec<StatusNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl StatusNotifier for InMemoryStatusNotifier {
    fn notify(&self, notification: StatusNotification) -> Result<(), NotifyError> {
        let mut guard = self.events.lock().expect("notifier mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}
