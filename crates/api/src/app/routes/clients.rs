use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use tracing::info;

use juris_auth::{ANY_ROLE, LAWYER_OR_ADMIN};
use juris_core::{ClientId, Page};
use juris_infra::{CaseStore, ClientStore};
use juris_records::{CaseFilter, Client, ClientUpdate, ClientWithCases, NewClient};

use crate::app::dto::{ClientGetQuery, ClientListQuery, PageQuery};
use crate::app::routes::common::parse_id;
use crate::app::{AppState, errors::ApiError};
use crate::authz::guard;
use crate::context::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/with-active-cases", get(clients_with_active_cases))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

pub async fn create_client(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<NewClient>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    guard(&session, ANY_ROLE)?;
    let client = Client::create(session.scope(), body.validate()?, Utc::now());
    let client = state.store.create_client(session.scope(), client).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// `?search=` matches name, document or email, case-insensitively.
pub async fn list_clients(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ClientListQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let (filter, page) = query.split();
    Ok(Json(
        state
            .store
            .list_clients(session.scope(), &filter, page)
            .await?,
    ))
}

pub async fn clients_with_active_cases(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ClientWithCases>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    Ok(Json(
        state
            .store
            .list_clients_with_active_cases(session.scope(), query.page())
            .await?,
    ))
}

pub async fn get_client(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Query(query): Query<ClientGetQuery>,
) -> Result<Json<ClientWithCases>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: ClientId = parse_id(&id)?;
    let client = state.store.get_client(session.scope(), id).await?;

    let cases = if query.include_cases {
        let filter = CaseFilter {
            client_id: Some(id),
            ..Default::default()
        };
        state
            .store
            .list_cases(session.scope(), &filter, Page::new(0, Page::MAX_LIMIT))
            .await?
    } else {
        Vec::new()
    };
    Ok(Json(ClientWithCases { client, cases }))
}

pub async fn update_client(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<ClientUpdate>,
) -> Result<Json<Client>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: ClientId = parse_id(&id)?;
    let client = state
        .store
        .update_client(session.scope(), id, body.validate()?, Utc::now())
        .await?;
    Ok(Json(client))
}

/// Refused with 409 while the client has an active case.
pub async fn delete_client(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    guard(&session, LAWYER_OR_ADMIN)?;
    let id: ClientId = parse_id(&id)?;
    state.store.delete_client(session.scope(), id).await?;
    info!(client_id = %id, deleted_by = %session.user_id(), "client deleted");
    Ok(StatusCode::NO_CONTENT)
}
