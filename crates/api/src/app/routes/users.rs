use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use juris_auth::{ADMIN_ONLY, ANY_ROLE, hash_password, verify_password};
use juris_core::UserId;
use juris_infra::UserStore;
use juris_records::{NewUser, PasswordChange, User, UserUpdate};

use crate::app::dto::PageQuery;
use crate::app::routes::common::parse_id;
use crate::app::{AppState, errors::ApiError};
use crate::authz::guard;
use crate::context::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(current_user))
        .route("/me/password", put(change_password))
        .route("/:id", get(get_user).put(update_user))
}

pub async fn list_users(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    guard(&session, ADMIN_ONLY)?;
    Ok(Json(state.store.list_users(session.scope(), query.page()).await?))
}

pub async fn create_user(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    guard(&session, ADMIN_ONLY)?;
    let input = body.validate(state.auth_config.min_password_length)?;
    let password_hash = hash_password(&input.password)?;
    let user = User::create(session.scope(), input, Utc::now());

    let user = state
        .store
        .create_user(session.scope(), user, password_hash)
        .await?;
    info!(user_id = %user.id, role = %user.role, created_by = %session.user_id(), "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn current_user(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<User>, ApiError> {
    guard(&session, ANY_ROLE)?;
    Ok(Json(
        state
            .store
            .get_user(session.scope(), session.user_id())
            .await?,
    ))
}

pub async fn get_user(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let id: UserId = parse_id(&id)?;
    Ok(Json(state.store.get_user(session.scope(), id).await?))
}

/// Admin edit: name, email, role and active flag.
pub async fn update_user(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    guard(&session, ADMIN_ONLY)?;
    let id: UserId = parse_id(&id)?;
    let user = state
        .store
        .update_user(session.scope(), id, body.validate()?, Utc::now())
        .await?;
    info!(user_id = %user.id, updated_by = %session.user_id(), "user updated");
    Ok(Json(user))
}

pub async fn change_password(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<PasswordChange>,
) -> Result<Json<Value>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let change = body.validate(state.auth_config.min_password_length)?;

    let current = state
        .store
        .password_hash(session.scope(), session.user_id())
        .await?;
    if !verify_password(&change.current_password, &current) {
        return Err(ApiError::validation("Senha atual incorreta"));
    }

    let password_hash = hash_password(&change.new_password)?;
    state
        .store
        .set_password_hash(session.scope(), session.user_id(), password_hash, Utc::now())
        .await?;
    info!(user_id = %session.user_id(), "password changed");
    Ok(Json(json!({ "message": "Senha alterada com sucesso" })))
}
