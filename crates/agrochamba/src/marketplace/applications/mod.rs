//! Application-status workflow: the pipeline a worker's job application
//! moves through (pending → viewed → in_process → interview → finalist →
//! accepted/rejected/cancelled) and the dual-write store holding it.

pub mod domain;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{Application, ApplicationStatus, JobId, TransitionError, UserId};
pub use router::application_router;
pub use service::{ApplicationService, ApplicationServiceError};
pub use store::{
    ApplicationStore, ApplicationView, JobCatalog, NotifyError, StatusNotification,
    StatusNotifier, StoreError,
};
