use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Actor;
use crate::catalog::{JobCatalog, JobId};

use super::domain::{ApplicationId, ApplicationStatus};
use super::repository::{ApplicationStore, StoreError};
use super::service::{ApplicationService, ListFilter, ServiceError, SubmitRequest};

/// Router exposing the application lifecycle endpoints.
pub fn application_router<S, C>(service: Arc<ApplicationService<S, C>>) -> Router
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler::<S, C>).get(list_handler::<S, C>),
        )
        .route("/api/v1/applications/counts", get(counts_handler::<S, C>))
        .route("/api/v1/applications/:id", get(get_handler::<S, C>))
        .route(
            "/api/v1/applications/:id/status",
            patch(transition_handler::<S, C>),
        )
        .route("/api/v1/applications/:id/notes", post(note_handler::<S, C>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteRequest {
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountsParams {
    #[serde(default)]
    pub job_id: Option<String>,
}

pub(crate) async fn submit_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    actor: Actor,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    match service.submit(&actor, request) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    actor: Actor,
    Query(filter): Query<ListFilter>,
) -> Response
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    match service.list_for_company(&actor, filter) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn counts_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    actor: Actor,
    Query(params): Query<CountsParams>,
) -> Response
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    let job = params.job_id.map(JobId);
    match service.status_counts(&actor, job) {
        Ok(counts) => (StatusCode::OK, axum::Json(counts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    match service.get(&ApplicationId(id), &actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn transition_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    actor: Actor,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    match service.transition_status(&ApplicationId(id), request.status, request.note, &actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn note_handler<S, C>(
    State(service): State<Arc<ApplicationService<S, C>>>,
    actor: Actor,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<NoteRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    C: JobCatalog + 'static,
{
    match service.append_note(&ApplicationId(id), &request.note, &actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Validation(message) => {
            let payload = json!({ "error": message });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        ServiceError::Duplicate { existing } => {
            let payload = json!({
                "error": "an application for this job already exists",
                "application": *existing,
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        ServiceError::NotFound => {
            let payload = json!({ "error": "application not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ServiceError::Authorization => {
            let payload = json!({ "error": "operation not permitted for this actor" });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        err @ ServiceError::InvalidTransition { .. } => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        ServiceError::Store(StoreError::StaleRead) => {
            let payload = json!({ "error": "application changed concurrently, retry" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
