use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationStatus, JobId, UserId};
use super::service::{ApplicationService, ApplicationServiceError};
use super::store::{ApplicationStore, ApplicationView, JobCatalog, StatusNotifier};

/// Router builder exposing the application workflow over REST.
pub fn application_router<S, J, N>(service: Arc<ApplicationService<S, J, N>>) -> Router
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(apply_handler::<S, J, N>).get(list_handler::<S, J, N>),
        )
        .route(
            "/api/v1/applications/:job_id",
            axum::routing::delete(cancel_handler::<S, J, N>),
        )
        .route(
            "/api/v1/applications/:job_id/status",
            put(update_status_handler::<S, J, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants",
            get(applicants_handler::<S, J, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/application-status",
            get(application_status_handler::<S, J, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub job_id: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub user_id: u64,
    pub status: String,
}

/// Caller identity carried in the `x-user-id` header. Authentication proper
/// is a collaborator concern; the workflow only needs a stable identifier.
fn actor(headers: &HeaderMap) -> Result<UserId, Response> {
    let raw = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    match raw {
        Some(id) => Ok(UserId(id)),
        None => Err(error_body(
            StatusCode::UNAUTHORIZED,
            "missing or invalid x-user-id header",
            "not_authenticated",
        )),
    }
}

fn error_body(status: StatusCode, message: &str, code: &str) -> Response {
    let payload = json!({
        "error": message,
        "code": code,
    });
    (status, axum::Json(payload)).into_response()
}

fn service_error_response(error: ApplicationServiceError) -> Response {
    let status = match &error {
        ApplicationServiceError::AlreadyApplied | ApplicationServiceError::Transition(_) => {
            StatusCode::CONFLICT
        }
        ApplicationServiceError::OwnListing | ApplicationServiceError::NotAuthorized => {
            StatusCode::FORBIDDEN
        }
        ApplicationServiceError::JobNotFound | ApplicationServiceError::ApplicationNotFound => {
            StatusCode::NOT_FOUND
        }
        ApplicationServiceError::Store(_) | ApplicationServiceError::Notify(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_body(status, &error.to_string(), error.code())
}

pub(crate) async fn apply_handler<S, J, N>(
    State(service): State<Arc<ApplicationService<S, J, N>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    let applicant = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.apply(applicant, JobId(request.job_id), request.message) {
        Ok(application) => {
            let view = ApplicationView::from_application(&application);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn list_handler<S, J, N>(
    State(service): State<Arc<ApplicationService<S, J, N>>>,
    headers: HeaderMap,
) -> Response
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    let applicant = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.applications_for(applicant) {
        Ok(applications) => {
            let views: Vec<ApplicationView> = applications
                .iter()
                .map(ApplicationView::from_application)
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn cancel_handler<S, J, N>(
    State(service): State<Arc<ApplicationService<S, J, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    let applicant = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.cancel(applicant, JobId(job_id)) {
        Ok(application) => {
            let view = ApplicationView::from_application(&application);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn update_status_handler<S, J, N>(
    State(service): State<Arc<ApplicationService<S, J, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    let owner = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let Some(next) = ApplicationStatus::parse(&request.status) else {
        return error_body(
            StatusCode::BAD_REQUEST,
            &format!("'{}' is not a known application status", request.status),
            "unknown_status",
        );
    };

    match service.update_status(owner, JobId(job_id), UserId(request.user_id), next) {
        Ok(application) => {
            let view = ApplicationView::from_application(&application);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn applicants_handler<S, J, N>(
    State(service): State<Arc<ApplicationService<S, J, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    let owner = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.applicants(owner, JobId(job_id)) {
        Ok(applications) => {
            let views: Vec<ApplicationView> = applications
                .iter()
                .map(ApplicationView::from_application)
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn application_status_handler<S, J, N>(
    State(service): State<Arc<ApplicationService<S, J, N>>>,
    headers: HeaderMap,
    Path(job_id): Path<u64>,
) -> Response
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    let applicant = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.status_of(applicant, JobId(job_id)) {
        Ok(application) => {
            let view = ApplicationView::from_application(&application);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}
