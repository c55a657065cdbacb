use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use tracing::info;

use juris_auth::{ANY_ROLE, LAWYER_OR_ADMIN};
use juris_core::CaseId;
use juris_infra::CaseStore;
use juris_records::{Case, CaseDetail, CaseUpdate, NewCase};

use crate::app::dto::CaseListQuery;
use crate::app::routes::common::parse_id;
use crate::app::{AppState, errors::ApiError};
use crate::authz::guard;
use crate::context::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_cases).post(create_case))
        .route("/:id", get(get_case).put(update_case).delete(delete_case))
}

/// The client and responsible lawyer must belong to the caller's firm.
pub async fn create_case(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<NewCase>,
) -> Result<(StatusCode, Json<Case>), ApiError> {
    guard(&session, ANY_ROLE)?;
    let case = Case::create(session.scope(), body.validate()?, Utc::now());
    let case = state.store.create_case(session.scope(), case).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

pub async fn list_cases(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<CaseListQuery>,
) -> Result<Json<Vec<Case>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let (filter, page) = query.split();
    Ok(Json(
        state.store.list_cases(session.scope(), &filter, page).await?,
    ))
}

/// The case with its client, lawyer and every attached record.
pub async fn get_case(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<CaseDetail>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: CaseId = parse_id(&id)?;
    Ok(Json(state.store.case_detail(session.scope(), id).await?))
}

pub async fn update_case(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<CaseUpdate>,
) -> Result<Json<Case>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: CaseId = parse_id(&id)?;
    let case = state
        .store
        .update_case(session.scope(), id, body.validate()?, Utc::now())
        .await?;
    Ok(Json(case))
}

pub async fn delete_case(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    guard(&session, LAWYER_OR_ADMIN)?;
    let id: CaseId = parse_id(&id)?;
    state.store.delete_case(session.scope(), id).await?;
    info!(case_id = %id, deleted_by = %session.user_id(), "case deleted");
    Ok(StatusCode::NO_CONTENT)
}
