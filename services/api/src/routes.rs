use crate::infra::AppState;
use agrochamba::marketplace::applications::{
    application_router, ApplicationService, ApplicationStore, JobCatalog, StatusNotifier, UserId,
};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes<S, J, N>(
    service: Arc<ApplicationService<S, J, N>>,
) -> axum::Router
where
    S: ApplicationStore + 'static,
    J: JobCatalog + 'static,
    N: StatusNotifier + 'static,
{
    application_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/jobs", axum::routing::post(create_job_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateJobRequest {
    #[serde(default)]
    pub(crate) title: String,
}

/// Registers a listing so the workflow endpoints have something to apply
/// to. Posting CRUD proper belongs to the job-posting subsystem.
pub(crate) async fn create_job_endpoint(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateJobRequest>,
) -> impl IntoResponse {
    let owner = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    let Some(owner) = owner else {
        let payload = json!({
            "error": "missing or invalid x-user-id header",
            "code": "not_authenticated",
        });
        return (StatusCode::UNAUTHORIZED, Json(payload));
    };

    let job_id = state.jobs.create_job(UserId(owner));
    let payload = json!({
        "job_id": job_id.0,
        "owner_id": owner,
        "title": request.title,
    });
    (StatusCode::CREATED, Json(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryApplicationStore, InMemoryJobCatalog, InMemoryStatusNotifier};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn test_app() -> (axum::Router, Arc<InMemoryJobCatalog>) {
        let catalog = Arc::new(InMemoryJobCatalog::default());
        let store = Arc::new(InMemoryApplicationStore::default());
        let notifier = Arc::new(InMemoryStatusNotifier::default());
        let service = Arc::new(ApplicationService::new(
            store,
            catalog.clone(),
            notifier,
        ));
        let handle = PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(handle),
            jobs: catalog.clone(),
        };
        let app = with_application_routes(service).layer(Extension(state));
        (app, catalog)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn created_jobs_accept_applications() {
        let (app, _) = test_app();

        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/jobs")
            .header("content-type", "application/json")
            .header("x-user-id", "10")
            .body(Body::from(
                serde_json::to_vec(&json!({ "title": "Cosecha de arándanos" }))
                    .expect("serialize"),
            ))
            .expect("request");
        let response = app.clone().oneshot(create).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let job_id = payload.get("job_id").and_then(Value::as_u64).expect("job id");

        let apply = Request::builder()
            .method("POST")
            .uri("/api/v1/applications")
            .header("content-type", "application/json")
            .header("x-user-id", "77")
            .body(Body::from(
                serde_json::to_vec(&json!({ "job_id": job_id, "message": "hola" }))
                    .expect("serialize"),
            ))
            .expect("request");
        let response = app.oneshot(apply).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn job_creation_requires_identity() {
        let (app, _) = test_app();
        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/jobs")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({ "title": "Sin dueño" })).expect("serialize"),
            ))
            .expect("request");
        let response = app.oneshot(create).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
