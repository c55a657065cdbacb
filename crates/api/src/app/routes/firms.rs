use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use tracing::info;

use juris_auth::{ADMIN_ONLY, ANY_ROLE, Role, TenantScope, hash_password};
use juris_core::FirmId;
use juris_infra::FirmStore;
use juris_records::{Firm, FirmUpdate, NewUser, User};

use crate::app::dto::{CreateFirmRequest, FirmCreated};
use crate::app::routes::common::parse_id;
use crate::app::{AppState, errors::ApiError};
use crate::authz::guard;
use crate::context::Session;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_firms))
        .route("/:id", get(get_firm).put(update_firm))
}

/// Create a firm together with its first admin (public bootstrap).
pub async fn create_firm(
    Extension(state): Extension<AppState>,
    Json(body): Json<CreateFirmRequest>,
) -> Result<(StatusCode, Json<FirmCreated>), ApiError> {
    let firm_input = body.firm.validate()?;
    let admin_input = NewUser {
        name: body.admin.name,
        email: body.admin.email,
        password: body.admin.password,
        role: Role::Admin,
        is_active: true,
    }
    .validate(state.auth_config.min_password_length)?;

    let now = Utc::now();
    let firm = Firm::create(firm_input, now);
    let scope = TenantScope::for_new_firm(firm.id);
    let password_hash = hash_password(&admin_input.password)?;
    let admin = User::create(&scope, admin_input, now);

    let (firm, admin) = state
        .store
        .create_firm_with_admin(firm, admin, password_hash)
        .await?;
    info!(firm_id = %firm.id, admin_id = %admin.id, "firm created");
    Ok((StatusCode::CREATED, Json(FirmCreated { firm, admin })))
}

/// The caller's own firm, as a one-element list.
pub async fn list_firms(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Firm>>, ApiError> {
    guard(&session, ADMIN_ONLY)?;
    let firm = state.store.get_firm(session.scope()).await?;
    Ok(Json(vec![firm]))
}

pub async fn get_firm(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Firm>, ApiError> {
    guard(&session, ANY_ROLE)?;
    own_firm(&session, &id)?;
    Ok(Json(state.store.get_firm(session.scope()).await?))
}

pub async fn update_firm(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<FirmUpdate>,
) -> Result<Json<Firm>, ApiError> {
    guard(&session, ADMIN_ONLY)?;
    own_firm(&session, &id)?;
    let firm = state
        .store
        .update_firm(session.scope(), body.validate()?, Utc::now())
        .await?;
    Ok(Json(firm))
}

/// Any firm other than the caller's is reported as absent.
fn own_firm(session: &Session, raw: &str) -> Result<(), ApiError> {
    let id: FirmId = parse_id(raw)?;
    if id == session.scope().firm_id() {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}
