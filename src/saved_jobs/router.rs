use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Actor;

use super::domain::{Priority, SavedJobId, SavedJobUpdate};
use super::repository::SavedJobStore;
use super::service::{SaveRequest, SavedJobError, SavedJobFilter, SavedJobService};

/// Router exposing the bookmark endpoints.
pub fn saved_job_router<S>(service: Arc<SavedJobService<S>>) -> Router
where
    S: SavedJobStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/saved-jobs",
            get(list_handler::<S>).post(save_handler::<S>),
        )
        .route(
            "/api/v1/saved-jobs/:id",
            patch(update_handler::<S>).delete(unsave_handler::<S>),
        )
        .with_state(service)
}

/// Partial-update body; every present field becomes one independent mutation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpdateRequest {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub add_tag: Option<String>,
    #[serde(default)]
    pub remove_tag: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub remind_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_reminder: bool,
}

impl UpdateRequest {
    pub(crate) fn into_updates(self) -> Vec<SavedJobUpdate> {
        let mut updates = Vec::new();
        if let Some(note) = self.note {
            let trimmed = note.trim().to_string();
            updates.push(SavedJobUpdate::Note(
                (!trimmed.is_empty()).then_some(trimmed),
            ));
        }
        if let Some(tag) = self.add_tag {
            updates.push(SavedJobUpdate::AddTag(tag));
        }
        if let Some(tag) = self.remove_tag {
            updates.push(SavedJobUpdate::RemoveTag(tag));
        }
        if let Some(priority) = self.priority {
            updates.push(SavedJobUpdate::Priority(priority));
        }
        if let Some(remind_on) = self.remind_on {
            updates.push(SavedJobUpdate::Reminder(Some(remind_on)));
        } else if self.clear_reminder {
            updates.push(SavedJobUpdate::Reminder(None));
        }
        updates
    }
}

pub(crate) async fn save_handler<S>(
    State(service): State<Arc<SavedJobService<S>>>,
    actor: Actor,
    axum::Json(request): axum::Json<SaveRequest>,
) -> Response
where
    S: SavedJobStore + 'static,
{
    match service.save(&actor, request) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<SavedJobService<S>>>,
    actor: Actor,
    Query(filter): Query<SavedJobFilter>,
) -> Response
where
    S: SavedJobStore + 'static,
{
    match service.list(&actor, filter) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<SavedJobService<S>>>,
    actor: Actor,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<UpdateRequest>,
) -> Response
where
    S: SavedJobStore + 'static,
{
    match service.update(&SavedJobId(id), &actor, request.into_updates()) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn unsave_handler<S>(
    State(service): State<Arc<SavedJobService<S>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Response
where
    S: SavedJobStore + 'static,
{
    match service.unsave(&SavedJobId(id), &actor) {
        Ok(removed) => (StatusCode::OK, axum::Json(removed)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: SavedJobError) -> Response {
    match err {
        SavedJobError::Validation(message) => {
            let payload = json!({ "error": message });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        SavedJobError::Duplicate { existing } => {
            let payload = json!({
                "error": "this job is already saved",
                "saved_job": *existing,
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        SavedJobError::NotFound => {
            let payload = json!({ "error": "saved job not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        SavedJobError::Authorization => {
            let payload = json!({ "error": "operation not permitted for this actor" });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
