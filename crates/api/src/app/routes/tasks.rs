use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use juris_auth::ANY_ROLE;
use juris_core::TaskId;
use juris_infra::TaskStore;
use juris_records::{NewTask, Task, TaskUpdate};

use crate::app::dto::TaskListQuery;
use crate::app::routes::common::parse_id;
use crate::app::{AppState, errors::ApiError};
use crate::authz::guard;
use crate::context::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
}

/// The case and assignee, when given, must belong to the caller's firm.
pub async fn create_task(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    guard(&session, ANY_ROLE)?;
    let task = Task::create(session.scope(), body.validate()?, Utc::now());
    let task = state.store.create_task(session.scope(), task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Ordered by due date (undated last).
pub async fn list_tasks(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let (filter, page) = query.split();
    Ok(Json(
        state.store.list_tasks(session.scope(), &filter, page).await?,
    ))
}

pub async fn get_task(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: TaskId = parse_id(&id)?;
    Ok(Json(state.store.get_task(session.scope(), id).await?))
}

pub async fn update_task(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<TaskUpdate>,
) -> Result<Json<Task>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: TaskId = parse_id(&id)?;
    let task = state
        .store
        .update_task(session.scope(), id, body.validate()?)
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: TaskId = parse_id(&id)?;
    state.store.delete_task(session.scope(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
